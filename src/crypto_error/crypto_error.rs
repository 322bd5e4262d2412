// ===========================================================================
// Gestion centralisée des erreurs cryptographiques
//
// Tous les modules utilisent ce type au lieu de panic!/assert!/unwrap().
// Le sous-système appelant (authentification) reçoit une Err(...) avec un
// genre distinct et ne reçoit jamais une valeur fausse ou nulle.
// ===========================================================================

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CryptoError {
    // --- Erreurs de paramètres d'entrée ---
    /// Le message m est hors de [0, n) (négatif ou >= n)
    InvalidPlaintext,
    /// Le chiffré est hors de [0, n²) ou n'appartient pas à cette clé
    InvalidCiphertext,
    /// L'aléa r fourni n'est pas dans [1, n) ou n'est pas premier avec n
    InvalidNonce,
    /// La taille demandée est trop petite
    KeySizeTooSmall { requested: u64, minimum: u64 },
    /// Taille de clé au-delà de ce que le stockage sait relire
    KeySizeTooLarge { requested: u64, maximum: u64 },

    // --- Erreurs de génération de clés ---
    /// gcd(lambda, n) != 1 : mu n'existe pas. Récupérée en interne (nouveau tirage).
    KeyGeneration,
    /// Nombre maximal de tirages de premiers atteint sans paire valide
    KeyGenerationExhausted { attempts: u32 },

    // --- Source d'aléa ---
    /// Le générateur du système a échoué : fatal, jamais réessayé
    RandomnessUnavailable(String),

    // --- Erreurs mathématiques internes ---
    /// L'inverse modulaire n'existe pas (gcd != 1)
    NoModularInverse,
    /// Conversion BigInt -> BigUint échouée (résultat négatif, invariant interne)
    NegativeConversion,

    // --- Erreurs de structure / stockage des clés ---
    /// n pair ou <= 1
    InvalidPublicKey,
    /// Clé chargée incohérente : n_squared != n*n, ou lambda/mu ne correspondent pas à n
    KeyCoherenceError,
    /// Parsing hexadécimal invalide dans un champ de clé ou de chiffré
    HexParseError,
    /// Champ hex trop long : vecteur DoS potentiel (conversion BigUint coûteuse)
    HexFieldTooLong { actual: usize, maximum: usize },
    /// Échec d'encodage / décodage JSON ou binaire
    Encoding(String),
    /// Paramètre de configuration invalide
    Config(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidPlaintext =>
                write!(f, "Le message doit être dans [0, n)"),
            CryptoError::InvalidCiphertext =>
                write!(f, "Chiffré invalide : hors de [0, n²) ou étranger à cette clé"),
            CryptoError::InvalidNonce =>
                write!(f, "L'aléa r doit être dans [1, n) et premier avec n"),
            CryptoError::KeySizeTooSmall { requested, minimum } =>
                write!(f, "Taille {requested} bits insuffisante, minimum requis : {minimum} bits"),
            CryptoError::KeySizeTooLarge { requested, maximum } =>
                write!(f, "Taille {requested} bits trop grande, maximum autorisé : {maximum} bits"),
            CryptoError::KeyGeneration =>
                write!(f, "Génération de clés : lambda et n ne sont pas premiers entre eux"),
            CryptoError::KeyGenerationExhausted { attempts } =>
                write!(f, "Génération de clés abandonnée après {attempts} tirages"),
            CryptoError::RandomnessUnavailable(msg) =>
                write!(f, "Source d'aléa du système indisponible : {msg}"),
            CryptoError::NoModularInverse =>
                write!(f, "Impossible de calculer l'inverse modulaire (gcd != 1)"),
            CryptoError::NegativeConversion =>
                write!(f, "Conversion interne BigInt -> BigUint : résultat négatif inattendu"),
            CryptoError::InvalidPublicKey =>
                write!(f, "Clé publique invalide : n doit être impair et > 1"),
            CryptoError::KeyCoherenceError =>
                write!(f, "Clés incohérentes (fichier corrompu ou falsifié)"),
            CryptoError::HexParseError =>
                write!(f, "Parsing hexadécimal invalide"),
            CryptoError::HexFieldTooLong { actual, maximum } =>
                write!(f, "Champ hexadécimal trop long : {actual} caractères (maximum autorisé : {maximum})"),
            CryptoError::Encoding(msg) =>
                write!(f, "Erreur d'encodage : {msg}"),
            CryptoError::Config(msg) =>
                write!(f, "Configuration invalide : {msg}"),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<serde_json::Error> for CryptoError {
    fn from(e: serde_json::Error) -> Self {
        CryptoError::Encoding(e.to_string())
    }
}

impl From<bincode::Error> for CryptoError {
    fn from(e: bincode::Error) -> Self {
        CryptoError::Encoding(e.to_string())
    }
}

impl From<rand_core::Error> for CryptoError {
    fn from(e: rand_core::Error) -> Self {
        CryptoError::RandomnessUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let e = CryptoError::KeySizeTooSmall { requested: 4, minimum: 8 };
        assert!(e.to_string().contains("4 bits"));
        assert!(e.to_string().contains("8 bits"));

        let e = CryptoError::KeyGenerationExhausted { attempts: 3 };
        assert!(e.to_string().contains('3'));
    }

    #[test]
    fn test_json_error_maps_to_encoding() {
        let err = serde_json::from_str::<u32>("pas du json").unwrap_err();
        assert!(matches!(CryptoError::from(err), CryptoError::Encoding(_)));
    }
}
