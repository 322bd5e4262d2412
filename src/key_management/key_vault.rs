// ============================================================================
// KeyVault — propriétaire unique de la paire de clés Paillier
//
// Une instance = une paire de clés, générée ou chargée une fois, jamais
// remplacée. Pas d'état global : le vault est construit par l'application et
// passé (clone) à ceux qui en ont besoin.
//
// Arc<KeyPair> sans verrou : la paire est immuable après construction, les
// lectures concurrentes (chiffrements, déchiffrements) n'ont rien à
// synchroniser. Chaque chiffrement tire son propre aléa.
//
// La clé privée ne sort jamais du vault : with_private_key la prête le temps
// d'une closure, retrieve déchiffre sans l'exposer.
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::Arc;
use num_bigint::BigInt;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};
use crate::config::KeygenConfig;
use crate::crypto_error::CryptoError;
use crate::key_management::key_storage::{key_file_exists, load_keypair_json, save_keypair_json};
use crate::paillier::ciphertext::Ciphertext;
use crate::paillier::p_decrypt::p_decrypt;
use crate::paillier::p_encrypt::p_encrypt;
use crate::paillier::p_homomorphic::p_add;
use crate::paillier::p_keygen::{p_keygen_with_config, KeyPair, PrivateKey, PublicKey};

// ============================================================================
// Valeur chiffrée optionnelle portée par l'enregistrement d'un principal
//
// "Pas encore de valeur" est un None explicite, pas un champ ajouté à la volée.
// ============================================================================
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncryptedSlot {
    ciphertext: Option<Ciphertext>,
}

impl EncryptedSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.ciphertext.is_some()
    }

    pub fn ciphertext(&self) -> Option<&Ciphertext> {
        self.ciphertext.as_ref()
    }

    pub fn set(&mut self, c: Ciphertext) {
        self.ciphertext = Some(c);
    }

    pub fn take(&mut self) -> Option<Ciphertext> {
        self.ciphertext.take()
    }
}

#[derive(Clone, Debug)]
pub struct KeyVault {
    keypair: Arc<KeyPair>,
}

impl KeyVault {
    pub fn new(keypair: KeyPair) -> Self {
        KeyVault { keypair: Arc::new(keypair) }
    }

    pub fn generate(config: &KeygenConfig) -> Result<Self, CryptoError> {
        let keypair = p_keygen_with_config(config)?;
        info!(bits = keypair.public_key().bits(), "nouvelle paire de clés Paillier");
        Ok(Self::new(keypair))
    }

    // -----------------------------------------------------------------------
    // Charge la paire depuis `filepath` si le fichier existe, sinon la génère
    // et la sauvegarde. Un fichier présent mais invalide est une erreur :
    // il n'est jamais écrasé silencieusement.
    // -----------------------------------------------------------------------
    pub fn load_or_generate(filepath: impl AsRef<Path>, config: &KeygenConfig) -> io::Result<Self> {
        let filepath = filepath.as_ref();
        if key_file_exists(filepath) {
            let keypair = load_keypair_json(filepath)?;
            if keypair.public_key().bits() != config.bit_length {
                warn!(
                    stored = keypair.public_key().bits(),
                    configured = config.bit_length,
                    "taille de la clé chargée différente de la configuration"
                );
            }
            return Ok(Self::new(keypair));
        }

        debug!(path = %filepath.display(), "aucune clé trouvée, génération");
        let vault = Self::generate(config)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        save_keypair_json(&vault.keypair, filepath)?;
        Ok(vault)
    }

    pub fn save(&self, filepath: impl AsRef<Path>) -> io::Result<()> {
        save_keypair_json(&self.keypair, filepath)
    }

    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    // -----------------------------------------------------------------------
    // Prête la clé privée sans la cloner ; elle reste dans le vault.
    //
    //   let m = vault.with_private_key(|sk| p_decrypt(&ct, sk))?;
    // -----------------------------------------------------------------------
    pub fn with_private_key<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&PrivateKey) -> T,
    {
        f(self.keypair.private_key())
    }

    /// Chiffre la valeur d'un principal avant stockage
    pub fn store(&self, value: &BigInt) -> Result<Ciphertext, CryptoError> {
        p_encrypt(value, self.public_key())
    }

    /// Relit une valeur stockée
    pub fn retrieve(&self, c: &Ciphertext) -> Result<BigInt, CryptoError> {
        self.with_private_key(|sk| p_decrypt(c, sk)).map(BigInt::from)
    }

    pub fn store_into(&self, slot: &mut EncryptedSlot, value: &BigInt) -> Result<(), CryptoError> {
        slot.set(self.store(value)?);
        Ok(())
    }

    /// Ok(None) si le principal n'a encore rien stocké
    pub fn retrieve_from(&self, slot: &EncryptedSlot) -> Result<Option<BigInt>, CryptoError> {
        slot.ciphertext().map(|c| self.retrieve(c)).transpose()
    }

    /// Somme chiffrée de deux valeurs stockées, sans les déchiffrer
    pub fn add(&self, c1: &Ciphertext, c2: &Ciphertext) -> Result<Ciphertext, CryptoError> {
        p_add(c1, c2, self.public_key())
    }
}
