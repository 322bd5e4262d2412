pub mod p_encrypt;

pub use p_encrypt::{p_encrypt, p_encrypt_with_rng, p_encrypt_with_nonce, sample_nonce};
