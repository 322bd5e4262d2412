// Réexporte toutes les fonctions mathématiques

mod math;

pub use math::{
    l_function, l_function_exact, gcd, lcm, mod_inverse,
    miller_rabin_rounds, is_probable_prime, is_divisible_by_small_prime,
    ensure_entropy, SMALL_PRIMES,
};
