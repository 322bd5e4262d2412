use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand_core::{CryptoRng, RngCore};
use tracing::error;
use crate::crypto_error::CryptoError;

// ---------------------------------------------------------------------------
// Table de petits premiers impairs (< SIEVE_LIMIT), calculée à la compilation
// par un crible d'Ératosthène. Sert au crible préliminaire des candidats et
// décide exactement la primalité de tout candidat < SIEVE_LIMIT².
// ---------------------------------------------------------------------------
const SIEVE_LIMIT: usize = 3000;

const fn odd_prime_flags() -> [bool; SIEVE_LIMIT] {
    let mut flags = [true; SIEVE_LIMIT];
    flags[0] = false;
    flags[1] = false;
    flags[2] = false; // 2 est traité à part : tous les candidats sont impairs
    let mut i = 2;
    while i * i < SIEVE_LIMIT {
        let mut j = i * i;
        while j < SIEVE_LIMIT {
            flags[j] = false;
            j += i;
        }
        i += 1;
    }
    flags
}

const fn count_flags(flags: &[bool; SIEVE_LIMIT]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < SIEVE_LIMIT {
        if flags[i] {
            count += 1;
        }
        i += 1;
    }
    count
}

const FLAGS: [bool; SIEVE_LIMIT] = odd_prime_flags();
const SMALL_PRIME_COUNT: usize = count_flags(&FLAGS);

const fn collect_small_primes() -> [u32; SMALL_PRIME_COUNT] {
    let mut primes = [0u32; SMALL_PRIME_COUNT];
    let mut k = 0;
    let mut i = 0;
    while i < SIEVE_LIMIT {
        if FLAGS[i] {
            primes[k] = i as u32;
            k += 1;
        }
        i += 1;
    }
    primes
}

pub const SMALL_PRIMES: [u32; SMALL_PRIME_COUNT] = collect_small_primes();

// Fonction L(u) = (u-1)/n
pub fn l_function(u: &BigUint, n: &BigUint) -> BigUint {
    (u - BigUint::one()) / n
}

/// Variante stricte de L : None si u ∉ 1 + nℤ (u = 0, ou division inexacte).
/// Utilisée au déchiffrement pour détecter un chiffré étranger à la clé.
pub fn l_function_exact(u: &BigUint, n: &BigUint) -> Option<BigUint> {
    if u.is_zero() {
        return None;
    }
    let (q, r) = (u - BigUint::one()).div_rem(n);
    r.is_zero().then_some(q)
}

// Calcule le pgcd de deux nombres
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    (a * b) / gcd(a, b)
}

// ---------------------------------------------------------------------------
// Calcule l'inverse modulaire de a mod n.
// Retourne Err(CryptoError::NoModularInverse) si gcd(a,n) != 1.
// ---------------------------------------------------------------------------
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint, CryptoError> {
    if n.is_zero() {
        return Err(CryptoError::NoModularInverse);
    }

    let a_big = BigInt::from(a.clone());
    let n_big = BigInt::from(n.clone());
    let egcd  = a_big.extended_gcd(&n_big);

    if !egcd.gcd.is_one() {
        return Err(CryptoError::NoModularInverse);
    }

    // mod_floor ramène x dans [0, n) même si x < 0
    egcd.x
        .mod_floor(&n_big)
        .to_biguint()
        .ok_or(CryptoError::NegativeConversion)
}

// ---------------------------------------------------------------------------
// Nombre de rounds Miller-Rabin
//
// Borne pire cas : 4^-t. En dessous de 256 bits on prend t = 64 (2^-128 même
// pour un entier choisi par un adversaire). Au-delà, les candidats sont tirés
// uniformément et la borne moyenne (Damgård–Landrock–Pomerance) décroît vite
// avec la taille : les valeurs ci-dessous restent sous 2^-128.
// ---------------------------------------------------------------------------
pub fn miller_rabin_rounds(nbits: u64) -> u32 {
    match nbits {
        0..=255     => 64,
        256..=511   => 32,
        512..=1023  => 16,
        1024..=2047 => 8,
        _           => 6,
    }
}

// Vérifie si n est divisible par un des petits premiers de la table
// (n lui-même petit premier → pas rejeté).
pub fn is_divisible_by_small_prime(n: &BigUint) -> bool {
    for &p in SMALL_PRIMES.iter() {
        if n.to_u32() == Some(p) {
            return false;
        }
        if (n % p).is_zero() {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Test de primalité
//
//   1. cas triviaux (<= 3, pairs)
//   2. crible par petits premiers
//   3. n < SIEVE_LIMIT² : le crible suffit, résultat exact
//   4. sinon Miller-Rabin avec `rounds` bases aléatoires dans [2, n-2]
// ---------------------------------------------------------------------------
pub fn is_probable_prime<R>(n: &BigUint, rounds: u32, rng: &mut R) -> bool
where
    R: RngCore + CryptoRng + ?Sized,
{
    if n <= &BigUint::one() { return false; }
    if n == &BigUint::from(2u32) || n == &BigUint::from(3u32) { return true; }
    if n.is_even() { return false; }

    if is_divisible_by_small_prime(n) {
        return false;
    }
    let limit = SIEVE_LIMIT as u64;
    if n < &BigUint::from(limit * limit) {
        return true;
    }

    let two       = BigUint::from(2u32);
    let n_minus_1 = n - BigUint::one();
    let mut d     = n_minus_1.clone();
    let mut s     = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Sonde la source d'aléa avant une opération qui la consomme.
//
// RandBigInt passe par fill_bytes, qui panique si le système ne fournit plus
// d'entropie. try_fill_bytes permet de remonter l'échec comme une erreur
// fatale avant d'entrer dans les boucles de tirage.
// ---------------------------------------------------------------------------
pub fn ensure_entropy<R>(rng: &mut R) -> Result<(), CryptoError>
where
    R: RngCore + ?Sized,
{
    let mut probe = [0u8; 32];
    rng.try_fill_bytes(&mut probe).map_err(|e| {
        error!(error = %e, "source d'aléa indisponible");
        CryptoError::from(e)
    })
}
