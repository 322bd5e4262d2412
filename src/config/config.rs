// ============================================================================
// Configuration de la génération de clés
//
// Le seul paramètre exposé au sous-système appelant est la taille du module n.
// max_attempts borne la recherche de premiers (latence bornée même si la
// source d'aléa se comporte mal) ; parallel_prime_search tire p et q sur deux
// threads sans changer le résultat observable.
// ============================================================================

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::crypto_error::CryptoError;

/// Taille minimale de n acceptée (deux premiers distincts de 4 bits : 11·13)
pub const MIN_KEY_BITS: u64 = 8;

/// Taille maximale de n : les limites de parsing des clés et des chiffrés
/// en dérivent, une clé plus grande ne pourrait pas être relue
pub const MAX_KEY_BITS: u64 = 4_096;

/// En dessous, la génération aboutit mais un avertissement est journalisé
pub const RECOMMENDED_KEY_BITS: u64 = 2048;

pub const DEFAULT_BIT_LENGTH: u64 = RECOMMENDED_KEY_BITS;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// Taille maximale d'un fichier de configuration JSON en octets
const MAX_CONFIG_FILE_BYTES: u64 = 4_096;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KeygenConfig {
    /// Taille exacte de n en bits
    pub bit_length: u64,
    /// Nombre maximal de tirages (p, q) avant abandon
    pub max_attempts: u32,
    /// Recherche de p et q en parallèle (rayon::join)
    pub parallel_prime_search: bool,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        KeygenConfig {
            bit_length:            DEFAULT_BIT_LENGTH,
            max_attempts:          DEFAULT_MAX_ATTEMPTS,
            parallel_prime_search: true,
        }
    }
}

impl KeygenConfig {
    pub fn new(bit_length: u64) -> Self {
        KeygenConfig { bit_length, ..Self::default() }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_parallel_prime_search(mut self, enabled: bool) -> Self {
        self.parallel_prime_search = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.bit_length < MIN_KEY_BITS {
            return Err(CryptoError::KeySizeTooSmall {
                requested: self.bit_length,
                minimum:   MIN_KEY_BITS,
            });
        }
        if self.bit_length > MAX_KEY_BITS {
            return Err(CryptoError::KeySizeTooLarge {
                requested: self.bit_length,
                maximum:   MAX_KEY_BITS,
            });
        }
        if self.max_attempts == 0 {
            return Err(CryptoError::Config("max_attempts doit être >= 1".into()));
        }
        Ok(())
    }

    /// Tailles de p et q : bit_length/2 et le reste
    pub fn prime_bits(&self) -> (u64, u64) {
        let p_bits = self.bit_length / 2;
        (p_bits, self.bit_length - p_bits)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CryptoError> {
        let config: KeygenConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json(filepath: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let filepath = filepath.as_ref();
        let meta = fs::metadata(filepath)
            .map_err(|e| CryptoError::Config(format!("{}: {e}", filepath.display())))?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(CryptoError::Config(format!(
                "fichier trop grand : {} octets (maximum {MAX_CONFIG_FILE_BYTES})",
                meta.len()
            )));
        }
        let raw = fs::read_to_string(filepath)
            .map_err(|e| CryptoError::Config(format!("{}: {e}", filepath.display())))?;
        Self::from_json_str(&raw)
    }
}
