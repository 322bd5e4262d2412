use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;
use std::io;
use num_bigint::BigUint;
use num_traits::Num;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};
use crate::paillier::p_keygen::{PublicKey, PrivateKey, KeyPair};
use crate::config::MAX_KEY_BITS;
use crate::crypto_error::CryptoError;

// ============================================================================
// Protection DoS parsing — limites de taille des entrées
//
// Vérifiées AVANT toute opération coûteuse : un fichier de plusieurs Go
// ferait lire le serveur en mémoire sans borne, un champ hex de plusieurs Mo
// saturerait le CPU (BigUint::from_str_radix est quadratique).
// Dérivées de MAX_KEY_BITS : le plus grand champ est un chiffré, n² fait au
// plus 2·MAX_KEY_BITS bits, soit 2·MAX_KEY_BITS/4 caractères hex.
// ============================================================================

/// Taille maximale d'un fichier de clés JSON en octets (32 Ko)
const MAX_KEY_FILE_BYTES: u64 = 32_768;

/// Longueur maximale d'un champ hexadécimal en caractères
const MAX_HEX_FIELD_LEN: usize = (2 * MAX_KEY_BITS / 4) as usize;

// ============================================================================
// Structures JSON pour la sérialisation des clés
//
// g = n + 1 n'est jamais écrit : il se déduit de n au chargement.
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyJson {
    pub n: String,
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PrivateKeyJson {
    pub n:      String,
    pub lambda: String,
    pub mu:     String,
}

// Les chaînes hex de lambda et mu sont effacées comme la clé elle-même
impl Drop for PrivateKeyJson {
    fn drop(&mut self) {
        self.lambda.zeroize();
        self.mu.zeroize();
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct KeyPairJson {
    pub public_key:  PublicKeyJson,
    pub private_key: PrivateKeyJson,
}

// ============================================================================
// Conversion BigUint ↔ hexadécimal
// ============================================================================

pub fn biguint_to_hex(value: &BigUint) -> String {
    value.to_str_radix(16).to_uppercase()
}

/// Convertit une string hex en BigUint.
///
/// Vérifie la longueur du champ AVANT la conversion pour éviter une
/// allocation BigUint géante.
///
/// Retourne :
///   Err(HexFieldTooLong)  si len > MAX_HEX_FIELD_LEN
///   Err(HexParseError)    si le contenu n'est pas un hex valide
pub fn hex_to_biguint(hex_str: &str) -> Result<BigUint, CryptoError> {
    if hex_str.len() > MAX_HEX_FIELD_LEN {
        return Err(CryptoError::HexFieldTooLong {
            actual:  hex_str.len(),
            maximum: MAX_HEX_FIELD_LEN,
        });
    }
    BigUint::from_str_radix(hex_str, 16)
        .map_err(|_| CryptoError::HexParseError)
}

// ============================================================================
// Conversion structures Rust → JSON
// ============================================================================

pub fn public_key_to_json(pk: &PublicKey) -> PublicKeyJson {
    PublicKeyJson { n: biguint_to_hex(pk.n()) }
}

pub fn private_key_to_json(sk: &PrivateKey) -> PrivateKeyJson {
    PrivateKeyJson {
        n:      biguint_to_hex(sk.n()),
        lambda: biguint_to_hex(sk.lambda()),
        mu:     biguint_to_hex(sk.mu()),
    }
}

pub fn keypair_to_json(kp: &KeyPair) -> KeyPairJson {
    KeyPairJson {
        public_key:  public_key_to_json(kp.public_key()),
        private_key: private_key_to_json(kp.private_key()),
    }
}

// ============================================================================
// Conversion JSON → structures Rust
//
// PublicKey::new refuse n pair ou <= 1, PrivateKey::new revérifie
// gcd(lambda, n) = 1 et mu · L(g^lambda) ≡ 1 (mod n) : un fichier corrompu
// ou falsifié est refusé au chargement, pas au premier déchiffrement.
// ============================================================================

pub fn json_to_public_key(json: &PublicKeyJson) -> Result<PublicKey, CryptoError> {
    PublicKey::new(hex_to_biguint(&json.n)?)
}

pub fn json_to_private_key(json: &PrivateKeyJson) -> Result<PrivateKey, CryptoError> {
    let public_key = PublicKey::new(hex_to_biguint(&json.n)?)?;
    PrivateKey::new(
        public_key,
        hex_to_biguint(&json.lambda)?,
        hex_to_biguint(&json.mu)?,
    )
}

pub fn json_to_keypair(json: &KeyPairJson) -> Result<KeyPair, CryptoError> {
    let public_key  = json_to_public_key(&json.public_key)?;
    let private_key = json_to_private_key(&json.private_key)?;

    // Les deux moitiés doivent porter le même n
    if private_key.public_key() != &public_key {
        return Err(CryptoError::KeyCoherenceError);
    }
    Ok(KeyPair::new(private_key))
}

// ============================================================================
// Vérification de taille de fichier (DoS protection)
//
// Appelée avant fs::read_to_string. La métadonnée est lue sans ouvrir le contenu.
// ============================================================================

fn check_file_size(filepath: &Path) -> io::Result<()> {
    let meta = fs::metadata(filepath)?;
    if meta.len() > MAX_KEY_FILE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Fichier de clés trop grand : {} octets (maximum autorisé : {} octets)",
                meta.len(),
                MAX_KEY_FILE_BYTES
            ),
        ));
    }
    Ok(())
}

fn invalid_data(e: CryptoError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

// Fichier de clé privée : lisible par le seul propriétaire sous Unix
fn write_secret_file(filepath: &Path, contents: &str) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(filepath)?;
        // mode() ne s'applique qu'à la création : un fichier existant garde
        // ses droits, on les resserre avant d'écrire
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(contents.as_bytes())
    }
    #[cfg(not(unix))]
    {
        fs::write(filepath, contents)
    }
}

// ============================================================================
// Sauvegarde JSON sur disque
// ============================================================================

pub fn save_keypair_json(kp: &KeyPair, filepath: impl AsRef<Path>) -> io::Result<()> {
    let filepath = filepath.as_ref();
    let json = Zeroizing::new(serde_json::to_string_pretty(&keypair_to_json(kp))?);
    write_secret_file(filepath, &json)?;
    debug!(path = %filepath.display(), bits = kp.public_key().bits(), "paire de clés sauvegardée");
    Ok(())
}

pub fn save_public_key_json(pk: &PublicKey, filepath: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&public_key_to_json(pk))?;
    fs::write(filepath, json)?;
    Ok(())
}

pub fn save_private_key_json(sk: &PrivateKey, filepath: impl AsRef<Path>) -> io::Result<()> {
    let json = Zeroizing::new(serde_json::to_string_pretty(&private_key_to_json(sk))?);
    write_secret_file(filepath.as_ref(), &json)

}

// ============================================================================
// Chargement JSON depuis disque
// Vérification de la taille du fichier AVANT la lecture (protection DoS).
// ============================================================================

pub fn load_keypair_json(filepath: impl AsRef<Path>) -> io::Result<KeyPair> {
    let filepath = filepath.as_ref();
    check_file_size(filepath)?;
    let mut raw = fs::read_to_string(filepath)?;
    let parsed: Result<KeyPairJson, _> = serde_json::from_str(&raw);
    raw.zeroize();
    let kp = json_to_keypair(&parsed?).map_err(invalid_data)?;
    debug!(path = %filepath.display(), bits = kp.public_key().bits(), "paire de clés chargée");
    Ok(kp)
}

pub fn load_public_key_json(filepath: impl AsRef<Path>) -> io::Result<PublicKey> {
    let filepath = filepath.as_ref();
    check_file_size(filepath)?;
    let raw  = fs::read_to_string(filepath)?;
    let json: PublicKeyJson = serde_json::from_str(&raw)?;
    json_to_public_key(&json).map_err(invalid_data)
}

pub fn load_private_key_json(filepath: impl AsRef<Path>) -> io::Result<PrivateKey> {
    let filepath = filepath.as_ref();
    check_file_size(filepath)?;
    let mut raw = fs::read_to_string(filepath)?;
    let parsed: Result<PrivateKeyJson, _> = serde_json::from_str(&raw);
    raw.zeroize();
    json_to_private_key(&parsed?).map_err(invalid_data)
}

// ============================================================================
// Utilitaires
// ============================================================================

pub fn key_file_exists(filepath: impl AsRef<Path>) -> bool {
    filepath.as_ref().exists()
}

pub fn ensure_keys_directory(dir_path: impl AsRef<Path>) -> io::Result<()> {
    let dir_path = dir_path.as_ref();
    if !dir_path.exists() {
        fs::create_dir_all(dir_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn keypair() -> KeyPair {
        KeyPair::from_primes(&BigUint::from(251u32), &BigUint::from(257u32)).unwrap()
    }

    #[test]
    fn test_hex_limits() {
        assert_eq!(hex_to_biguint("fbFB").unwrap(), BigUint::from(0xFBFBu32));
        assert_eq!(hex_to_biguint("0xFB"), Err(CryptoError::HexParseError));
        let long = "F".repeat(MAX_HEX_FIELD_LEN + 1);
        assert_eq!(
            hex_to_biguint(&long),
            Err(CryptoError::HexFieldTooLong { actual: MAX_HEX_FIELD_LEN + 1, maximum: MAX_HEX_FIELD_LEN })
        );
    }

    #[test]
    fn test_public_json_has_no_generator() {
        let json = serde_json::to_string(&public_key_to_json(keypair().public_key())).unwrap();
        assert_eq!(json, r#"{"n":"FBFB"}"#);
    }

    #[test]
    fn test_json_rejects_tampered_private_key() {
        let kp = keypair();
        let mut json = keypair_to_json(&kp);
        json.private_key.mu = biguint_to_hex(&(kp.private_key().mu() + 1u32));
        assert!(matches!(json_to_keypair(&json), Err(CryptoError::KeyCoherenceError)));
    }

    #[test]
    fn test_json_rejects_mismatched_halves() {
        let kp = keypair();
        let other = KeyPair::from_primes(&BigUint::from(239u32), &BigUint::from(263u32)).unwrap();
        let json = KeyPairJson {
            public_key:  public_key_to_json(other.public_key()),
            private_key: private_key_to_json(kp.private_key()),
        };
        assert!(matches!(json_to_keypair(&json), Err(CryptoError::KeyCoherenceError)));
    }

    #[test]
    fn test_save_and_load_files() {
        let dir = tempdir().unwrap();
        let keys = dir.path().join("keys");
        ensure_keys_directory(&keys).unwrap();

        let kp = keypair();
        let kp_path = keys.join("keypair.json");
        let pk_path = keys.join("public_key.json");
        let sk_path = keys.join("private_key.json");
        assert!(!key_file_exists(&kp_path));

        save_keypair_json(&kp, &kp_path).unwrap();
        save_public_key_json(kp.public_key(), &pk_path).unwrap();
        save_private_key_json(kp.private_key(), &sk_path).unwrap();
        assert!(key_file_exists(&kp_path));

        let loaded = load_keypair_json(&kp_path).unwrap();
        assert_eq!(loaded.public_key(), kp.public_key());
        assert_eq!(loaded.private_key().lambda(), kp.private_key().lambda());
        assert_eq!(&load_public_key_json(&pk_path).unwrap(), kp.public_key());
        assert_eq!(load_private_key_json(&sk_path).unwrap().mu(), kp.private_key().mu());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_file_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("private_key.json");
        save_private_key_json(keypair().private_key(), &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_tightens_existing_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        for name in ["sk.json", "keypair.json"] {
            let path = dir.path().join(name);
            fs::write(&path, "{}").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

            if name == "sk.json" {
                save_private_key_json(keypair().private_key(), &path).unwrap();
            } else {
                save_keypair_json(&keypair(), &path).unwrap();
            }
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{name}");
        }
    }

    #[test]
    fn test_largest_public_key_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pk.json");
        let pk = PublicKey::new((BigUint::from(1u32) << MAX_KEY_BITS) - 1u32).unwrap();
        save_public_key_json(&pk, &path).unwrap();
        assert_eq!(load_public_key_json(&path).unwrap(), pk);
    }

    #[test]
    fn test_load_rejects_oversized_and_garbage() {
        let dir = tempdir().unwrap();
        let big = dir.path().join("big.json");
        fs::write(&big, vec![b' '; (MAX_KEY_FILE_BYTES + 1) as usize]).unwrap();
        let err = load_keypair_json(&big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let garbage = dir.path().join("garbage.json");
        fs::write(&garbage, r#"{"n":"10"}"#).unwrap();
        // n pair
        assert_eq!(load_public_key_json(&garbage).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }
}
