pub mod p_keygen;

pub use p_keygen::{PublicKey, PrivateKey, KeyPair, p_keygen, p_keygen_with_config};
