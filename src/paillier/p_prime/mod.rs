pub mod p_prime;

pub use p_prime::{generate_prime, generate_prime_with_rng, MIN_PRIME_BITS};
