use num_bigint::{BigInt, BigUint};
use num_traits::One;
use rand_core::OsRng;
use crate::crypto_error::CryptoError;
use crate::paillier::ciphertext::Ciphertext;
use crate::paillier::p_encrypt::sample_nonce;
use crate::paillier::p_keygen::PublicKey;

// ============================================================================
// Opérations homomorphes — uniquement avec la clé publique
//
//   p_add           : E(m1)·E(m2)        → E(m1 + m2 mod n)
//   p_add_plaintext : E(m)·(n+1)^k       → E(m + k mod n)
//   p_mul_plaintext : E(m)^k             → E(m·k mod n)
//   p_rerandomize   : E(m)·r^n           → E(m), indiscernable de l'original
//
// Les chiffrés hors de [0, n²) sont rejetés (InvalidCiphertext), les
// scalaires hors de [0, n) aussi (InvalidPlaintext).
// ============================================================================

pub fn p_add(c1: &Ciphertext, c2: &Ciphertext, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    c1.check_range(pk)?;
    c2.check_range(pk)?;
    Ok(Ciphertext::from((c1.value() * c2.value()) % pk.n_squared()))
}

pub fn p_add_plaintext(c: &Ciphertext, k: &BigInt, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    c.check_range(pk)?;
    let k = scalar_in_range(k, pk)?;
    // (n+1)^k mod n² = 1 + k·n
    let g_k = (BigUint::one() + &k * pk.n()) % pk.n_squared();
    Ok(Ciphertext::from((c.value() * g_k) % pk.n_squared()))
}

pub fn p_mul_plaintext(c: &Ciphertext, k: &BigInt, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    c.check_range(pk)?;
    let k = scalar_in_range(k, pk)?;
    Ok(Ciphertext::from(c.value().modpow(&k, pk.n_squared())))
}

pub fn p_rerandomize(c: &Ciphertext, pk: &PublicKey) -> Result<Ciphertext, CryptoError> {
    c.check_range(pk)?;
    let r   = sample_nonce(pk, &mut OsRng)?;
    let r_n = r.modpow(pk.n(), pk.n_squared());
    Ok(Ciphertext::from((c.value() * r_n) % pk.n_squared()))
}

fn scalar_in_range(k: &BigInt, pk: &PublicKey) -> Result<BigUint, CryptoError> {
    match k.to_biguint() {
        Some(k) if &k < pk.n() => Ok(k),
        _ => Err(CryptoError::InvalidPlaintext),
    }
}
