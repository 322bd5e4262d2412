use std::fmt;
use bincode::Options;
use num_bigint::BigUint;
use serde::{Serialize, Deserialize};
use crate::config::MAX_KEY_BITS;
use crate::crypto_error::CryptoError;
use crate::key_management::key_storage::{biguint_to_hex, hex_to_biguint};
use crate::paillier::p_keygen::PublicKey;

/// Taille maximale d'un chiffré encodé en binaire : n² sur 2·MAX_KEY_BITS
/// bits, plus l'en-tête de longueur.
pub const MAX_CIPHERTEXT_BYTES: u64 = 2 * MAX_KEY_BITS / 8 + 16;

// ============================================================================
// Chiffré Paillier : entier de [0, n²), immuable une fois produit.
//
// N'a de sens que pour la paire de clés qui l'a produit. La construction
// depuis un BigUint n'est pas vérifiée : p_decrypt et les opérations
// homomorphes rejettent tout chiffré hors domaine.
//
// En JSON / serde : chaîne hexadécimale majuscule.
// ============================================================================
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Ciphertext(BigUint);

impl Ciphertext {
    /// Construction vérifiée : c doit être dans [0, n²)
    pub fn checked(value: BigUint, pk: &PublicKey) -> Result<Self, CryptoError> {
        let c = Ciphertext(value);
        c.check_range(pk)?;
        Ok(c)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    pub fn check_range(&self, pk: &PublicKey) -> Result<(), CryptoError> {
        if &self.0 >= pk.n_squared() {
            return Err(CryptoError::InvalidCiphertext);
        }
        Ok(())
    }

    pub fn to_hex(&self) -> String {
        biguint_to_hex(&self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        Ok(Ciphertext(hex_to_biguint(hex)?))
    }

    // -----------------------------------------------------------------------
    // Forme binaire compacte (bincode, octets big-endian préfixés par leur
    // longueur). La limite de taille est appliquée avant toute allocation.
    // -----------------------------------------------------------------------
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        Ok(Self::codec().serialize(&self.0.to_bytes_be())?)
    }

    pub fn from_bytes(bytes: &[u8], pk: &PublicKey) -> Result<Self, CryptoError> {
        let raw: Vec<u8> = Self::codec().deserialize(bytes)?;
        Self::checked(BigUint::from_bytes_be(&raw), pk)
    }

    fn codec() -> impl Options {
        bincode::DefaultOptions::new().with_limit(MAX_CIPHERTEXT_BYTES)
    }
}

impl From<BigUint> for Ciphertext {
    fn from(value: BigUint) -> Self {
        Ciphertext(value)
    }
}

impl From<Ciphertext> for String {
    fn from(c: Ciphertext) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Ciphertext {
    type Error = CryptoError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Ciphertext::from_hex(&hex)
    }
}

// Les chiffrés peuvent faire plusieurs milliers de bits : on n'affiche que la taille
impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bits)", self.0.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk() -> PublicKey {
        PublicKey::new(BigUint::from(64_507u32)).unwrap()
    }

    #[test]
    fn test_checked_range() {
        let pk = pk();
        assert!(Ciphertext::checked(pk.n_squared() - 1u32, &pk).is_ok());
        assert_eq!(
            Ciphertext::checked(pk.n_squared().clone(), &pk),
            Err(CryptoError::InvalidCiphertext)
        );
    }

    #[test]
    fn test_hex_and_json() {
        let c = Ciphertext::from(BigUint::from(0xBEEFu32));
        assert_eq!(c.to_hex(), "BEEF");

        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"BEEF\"");
        let back: Ciphertext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);

        assert!(serde_json::from_str::<Ciphertext>("\"XYZ\"").is_err());
    }

    #[test]
    fn test_bytes_reject_out_of_range_and_oversized() {
        let pk = pk();
        let c = Ciphertext::from(pk.n_squared() - 2u32);
        let bytes = c.to_bytes().unwrap();
        assert_eq!(Ciphertext::from_bytes(&bytes, &pk).unwrap(), c);

        let too_big = Ciphertext::from(pk.n_squared() + 1u32).to_bytes().unwrap();
        assert_eq!(Ciphertext::from_bytes(&too_big, &pk), Err(CryptoError::InvalidCiphertext));

        let huge = Ciphertext::from(BigUint::from(1u32) << 9000u32).to_bytes();
        assert!(matches!(huge, Err(CryptoError::Encoding(_))));
        assert!(matches!(Ciphertext::from_bytes(&[0xFF; 4], &pk), Err(CryptoError::Encoding(_))));
    }

    #[test]
    fn test_largest_key_ciphertexts_encode() {
        // n de MAX_KEY_BITS bits : le plus grand chiffré doit passer en hex et en binaire
        let pk = PublicKey::new((BigUint::from(1u32) << MAX_KEY_BITS) - 1u32).unwrap();
        let c = Ciphertext::checked(pk.n_squared() - 1u32, &pk).unwrap();

        let bytes = c.to_bytes().unwrap();
        assert_eq!(Ciphertext::from_bytes(&bytes, &pk).unwrap(), c);
        assert_eq!(Ciphertext::from_hex(&c.to_hex()).unwrap(), c);
    }

    #[test]
    fn test_debug_shows_size_only() {
        let c = Ciphertext::from(BigUint::from(1_234_567u32));
        assert_eq!(format!("{c:?}"), "Ciphertext(21 bits)");
    }
}
