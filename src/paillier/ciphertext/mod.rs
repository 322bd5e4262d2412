pub mod ciphertext;

pub use ciphertext::{Ciphertext, MAX_CIPHERTEXT_BYTES};
