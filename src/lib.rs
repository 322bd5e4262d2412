//! Chiffrement Paillier (additivement homomorphe) pour stocker l'entier d'un
//! principal sous forme chiffrée et le relire, sans jamais persister le clair.
//!
//! ```no_run
//! use num_bigint::BigInt;
//! use paillier_store::{KeyVault, KeygenConfig};
//!
//! let vault = KeyVault::generate(&KeygenConfig::new(2048))?;
//! let c1 = vault.store(&BigInt::from(42))?;
//! let c2 = vault.store(&BigInt::from(100))?;
//! assert_eq!(vault.retrieve(&vault.add(&c1, &c2)?)?, BigInt::from(142));
//! # Ok::<(), paillier_store::CryptoError>(())
//! ```

// Déclaration des modules
pub mod crypto_error;
pub mod config;
pub mod paillier;
pub mod key_management;

pub use crate::paillier::math;
pub use crate::paillier::p_prime;

// Fonctions principales, une par responsabilité
pub use crate::paillier::p_prime::generate_prime;
pub use crate::paillier::p_keygen::{p_keygen, p_keygen_with_config};
pub use crate::paillier::p_encrypt::{p_encrypt, p_encrypt_with_nonce, p_encrypt_with_rng};
pub use crate::paillier::p_decrypt::p_decrypt;
pub use crate::paillier::p_homomorphic::{p_add, p_add_plaintext, p_mul_plaintext, p_rerandomize};

// Types
pub use crate::paillier::p_keygen::{PublicKey, PrivateKey, KeyPair};
pub use crate::paillier::ciphertext::Ciphertext;
pub use crate::config::KeygenConfig;

// Erreur centralisée
pub use crypto_error::CryptoError;

// Propriétaire de la paire de clés — point d'entrée du sous-système d'authentification
pub use key_management::{KeyVault, EncryptedSlot};
