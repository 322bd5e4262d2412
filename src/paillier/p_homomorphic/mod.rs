pub mod p_homomorphic;

pub use p_homomorphic::{p_add, p_add_plaintext, p_mul_plaintext, p_rerandomize};
