use num_bigint::BigUint;
use num_traits::One;
use crate::crypto_error::CryptoError;
use crate::paillier::ciphertext::Ciphertext;
use crate::paillier::math::{gcd, l_function_exact};
use crate::paillier::p_keygen::PrivateKey;

// ---------------------------------------------------------------------------
// Déchiffrement Paillier : m = L(c^lambda mod n²) · mu  mod n
//
// Rejette (InvalidCiphertext), sans jamais corriger :
//   - c >= n²
//   - gcd(c, n) != 1 : c n'est pas dans Z*_{n²}, aucun chiffrement ne le produit
//   - c^lambda mod n² non congru à 1 mod n : L n'est pas une division exacte
//     (chiffré corrompu ou clé étrangère)
// ---------------------------------------------------------------------------
pub fn p_decrypt(c: &Ciphertext, sk: &PrivateKey) -> Result<BigUint, CryptoError> {
    let pk = sk.public_key();
    c.check_range(pk)?;

    let c = c.value();
    if !gcd(c, pk.n()).is_one() {
        return Err(CryptoError::InvalidCiphertext);
    }

    // Calcule c^lambda mod n^2
    let c_lambda = c.modpow(sk.lambda(), pk.n_squared());

    // Calcule L(c^lambda mod n^2)
    let l_c_lambda = l_function_exact(&c_lambda, pk.n()).ok_or(CryptoError::InvalidCiphertext)?;

    // Calcule m = L(c^lambda mod n^2) * mu (mod n)
    Ok((&l_c_lambda * sk.mu()) % pk.n())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use crate::paillier::p_encrypt::{p_encrypt, p_encrypt_with_nonce};
    use crate::paillier::p_keygen::KeyPair;

    fn keypair() -> KeyPair {
        KeyPair::from_primes(&BigUint::from(251u32), &BigUint::from(257u32)).unwrap()
    }

    #[test]
    fn test_round_trip_known_vector() {
        let kp = keypair();
        let c = p_encrypt_with_nonce(&BigInt::from(42), &BigUint::from(12_345u32), kp.public_key())
            .unwrap();
        assert_eq!(p_decrypt(&c, kp.private_key()).unwrap(), BigUint::from(42u32));
    }

    #[test]
    fn test_round_trip_edges() {
        let kp = keypair();
        let n_minus_1 = BigInt::from(kp.public_key().n().clone()) - 1;
        for m in [BigInt::from(0), BigInt::from(1), n_minus_1] {
            let c = p_encrypt(&m, kp.public_key()).unwrap();
            assert_eq!(BigInt::from(p_decrypt(&c, kp.private_key()).unwrap()), m);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        let kp = keypair();
        let c = Ciphertext::from(kp.public_key().n_squared().clone());
        assert_eq!(p_decrypt(&c, kp.private_key()), Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn test_rejects_structurally_invalid() {
        let kp = keypair();
        for v in [0u32, 251, 257, 64_507, 251 * 1000] {
            let c = Ciphertext::from(BigUint::from(v));
            assert_eq!(
                p_decrypt(&c, kp.private_key()),
                Err(CryptoError::InvalidCiphertext),
                "c = {v}"
            );
        }
    }
}
