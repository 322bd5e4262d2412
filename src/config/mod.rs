pub mod config;

pub use config::{KeygenConfig, DEFAULT_BIT_LENGTH, DEFAULT_MAX_ATTEMPTS, MAX_KEY_BITS, MIN_KEY_BITS, RECOMMENDED_KEY_BITS};
