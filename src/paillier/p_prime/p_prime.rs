use num_bigint::{BigUint, RandBigInt};
use rand_core::{CryptoRng, OsRng, RngCore};
use tracing::{debug, trace};
use crate::crypto_error::CryptoError;
use crate::paillier::math::{ensure_entropy, is_probable_prime, miller_rabin_rounds};

// Plus petite taille admise : 2 bits → seul candidat impair 3
pub const MIN_PRIME_BITS: u64 = 2;

// ---------------------------------------------------------------------------
// Génère un premier d'exactement `nbits` bits (bit de poids fort à 1) avec
// l'entropie du système.
// ---------------------------------------------------------------------------
pub fn generate_prime(nbits: u64) -> Result<BigUint, CryptoError> {
    generate_prime_with_rng(nbits, &mut OsRng)
}

// ---------------------------------------------------------------------------
// Même contrat, générateur fourni par l'appelant (CSPRNG obligatoire).
//
// Boucle : tirage uniforme d'un impair de `nbits` bits, puis test de
// primalité (crible + Miller-Rabin). Pas d'autre échec possible que la
// source d'aléa elle-même.
// ---------------------------------------------------------------------------
pub fn generate_prime_with_rng<R>(nbits: u64, rng: &mut R) -> Result<BigUint, CryptoError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if nbits < MIN_PRIME_BITS {
        return Err(CryptoError::KeySizeTooSmall {
            requested: nbits,
            minimum:   MIN_PRIME_BITS,
        });
    }

    ensure_entropy(rng)?;
    let rounds = miller_rabin_rounds(nbits);

    let mut candidates = 0u64;
    loop {
        candidates += 1;

        let mut candidate = rng.gen_biguint(nbits);
        candidate.set_bit(nbits - 1, true); // taille exacte
        candidate.set_bit(0, true);         // impair

        if is_probable_prime(&candidate, rounds, rng) {
            debug!(bits = nbits, candidates, "premier trouvé");
            return Ok(candidate);
        }
        trace!(bits = nbits, candidates, "candidat rejeté");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rejects_too_small() {
        assert_eq!(
            generate_prime(1),
            Err(CryptoError::KeySizeTooSmall { requested: 1, minimum: 2 })
        );
        assert!(generate_prime(0).is_err());
    }

    #[test]
    fn test_two_bits_is_three() {
        assert_eq!(generate_prime(2).unwrap(), BigUint::from(3u32));
    }

    #[test]
    fn test_exact_bit_length_and_odd() {
        let mut rng = StdRng::seed_from_u64(42);
        for bits in [3u64, 8, 17, 64, 128, 256] {
            let p = generate_prime_with_rng(bits, &mut rng).unwrap();
            assert_eq!(p.bits(), bits);
            assert!(p.bit(0));
            assert!(is_probable_prime(&p, 64, &mut rng));
        }
    }

    #[test]
    fn test_small_primes_are_exact() {
        // 8 bits : premiers de 128 à 255
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let p = generate_prime_with_rng(8, &mut rng).unwrap();
            let v = p.iter_u32_digits().next().unwrap_or(0);
            assert!((128..256).contains(&v));
            assert!((2..v).take_while(|d| d * d <= v).all(|d| v % d != 0), "{v}");
        }
    }

    #[test]
    fn test_os_rng_512() {
        let p = generate_prime(512).unwrap();
        assert_eq!(p.bits(), 512);
    }
}
