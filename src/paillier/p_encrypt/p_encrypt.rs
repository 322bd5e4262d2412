use num_bigint::{BigInt, BigUint, RandBigInt};
use num_traits::One;
use rand_core::{CryptoRng, OsRng, RngCore};
use crate::crypto_error::CryptoError;
use crate::paillier::ciphertext::Ciphertext;
use crate::paillier::math::{ensure_entropy, gcd};
use crate::paillier::p_keygen::PublicKey;

// ---------------------------------------------------------------------------
// Chiffrement Paillier : c = (n+1)^m · r^n  mod n²
//
// Le clair est un entier signé : m < 0 ou m >= n → Err(InvalidPlaintext),
// jamais de réduction silencieuse.
// ---------------------------------------------------------------------------
pub fn p_encrypt(m: &BigInt, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    p_encrypt_with_rng(m, pk, &mut OsRng)
}

// Même chose avec un CSPRNG fourni par l'appelant. r est tiré dans Z*_n.
pub fn p_encrypt_with_rng<R>(m: &BigInt, pk: &PublicKey, rng: &mut R) -> Result<Ciphertext, CryptoError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let m = plaintext_in_range(m, pk)?;
    let r = sample_nonce(pk, rng)?;
    Ok(encrypt_unchecked(&m, &r, pk))
}

// Aléa fourni par l'appelant : r doit être dans [1, n) et premier avec n.
pub fn p_encrypt_with_nonce(m: &BigInt, r: &BigUint, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    let m = plaintext_in_range(m, pk)?;
    if r >= pk.n() || !gcd(r, pk.n()).is_one() {
        return Err(CryptoError::InvalidNonce);
    }
    Ok(encrypt_unchecked(&m, r, pk))
}

// ---------------------------------------------------------------------------
// Tire r uniformément dans [1, n) jusqu'à gcd(r, n) = 1.
//
// Chaque appel consomme son propre aléa : deux chiffrements ne partagent
// jamais r.
// ---------------------------------------------------------------------------
pub fn sample_nonce<R>(pk: &PublicKey, rng: &mut R) -> Result<BigUint, CryptoError>
where
    R: RngCore + CryptoRng + ?Sized,
{
    ensure_entropy(rng)?;
    loop {
        let candidate = rng.gen_biguint_range(&BigUint::one(), pk.n());
        if gcd(&candidate, pk.n()).is_one() {
            return Ok(candidate);
        }
    }
}

fn plaintext_in_range(m: &BigInt, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    match m.to_biguint() {
        Some(m) if &m < pk.n() => Ok(m),
        _ => Err(CryptoError::InvalidPlaintext),
    }
}

// ---------------------------------------------------------------------------
// Cœur du chiffrement, entrées déjà validées.
//
// (n+1)^m mod n² = 1 + m·n  (binôme de Newton, les termes en n² s'annulent) :
// une multiplication remplace le premier modpow. r^n reste un modpow
// (square-and-multiply).
// ---------------------------------------------------------------------------
pub(crate) fn encrypt_unchecked(m: &BigUint, r: &BigUint, pk: &PublicKey) -> Ciphertext {
    let n_squared = pk.n_squared();
    let g_m = (BigUint::one() + m * pk.n()) % n_squared;
    let r_n = r.modpow(pk.n(), n_squared);
    Ciphertext::from((&g_m * &r_n) % n_squared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paillier::p_decrypt::p_decrypt;
    use crate::paillier::p_keygen::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pk() -> PublicKey {
        PublicKey::new(BigUint::from(64_507u32)).unwrap()
    }

    #[test]
    fn test_binomial_shortcut_matches_modpow() {
        let pk = pk();
        let m = BigUint::from(42u32);
        let r = BigUint::from(17u32);
        let expected = (pk.g().modpow(&m, pk.n_squared()) * r.modpow(pk.n(), pk.n_squared()))
            % pk.n_squared();
        assert_eq!(encrypt_unchecked(&m, &r, &pk).value(), &expected);
    }

    #[test]
    fn test_rejects_out_of_range_plaintext() {
        let pk = pk();
        let n = BigInt::from(pk.n().clone());
        assert_eq!(p_encrypt(&n, &pk), Err(CryptoError::InvalidPlaintext));
        assert_eq!(p_encrypt(&BigInt::from(-1), &pk), Err(CryptoError::InvalidPlaintext));
        assert!(p_encrypt(&(n - 1), &pk).is_ok());
        assert!(p_encrypt(&BigInt::from(0), &pk).is_ok());
    }

    #[test]
    fn test_rejects_bad_nonce() {
        let pk = pk();
        let m = BigInt::from(42);
        for r in [0u32, 251, 257, 64_507, 70_000] {
            assert_eq!(
                p_encrypt_with_nonce(&m, &BigUint::from(r), &pk),
                Err(CryptoError::InvalidNonce),
                "r = {r}"
            );
        }
        assert!(p_encrypt_with_nonce(&m, &BigUint::one(), &pk).is_ok());
    }

    #[test]
    fn test_nonce_is_unit() {
        let pk = pk();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let r = sample_nonce(&pk, &mut rng).unwrap();
            assert!(r >= BigUint::one() && &r < pk.n());
            assert!(gcd(&r, pk.n()).is_one());
        }
    }

    #[test]
    fn test_repeated_encryptions_decrypt_to_same_value() {
        let kp = KeyPair::from_primes(&BigUint::from(251u32), &BigUint::from(257u32)).unwrap();
        let m = BigInt::from(7);
        for _ in 0..3 {
            let c = p_encrypt(&m, kp.public_key()).unwrap();
            assert_eq!(p_decrypt(&c, kp.private_key()).unwrap(), BigUint::from(7u32));
        }
    }
}
