use std::fmt;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand_core::OsRng;
use tracing::{debug, warn};
use zeroize::Zeroize;
use crate::config::{KeygenConfig, MAX_KEY_BITS, RECOMMENDED_KEY_BITS};
use crate::crypto_error::CryptoError;
use crate::paillier::math::{
    ensure_entropy, gcd, is_probable_prime, l_function, lcm, miller_rabin_rounds, mod_inverse,
};
use crate::paillier::p_prime::generate_prime;

// ============================================================================
// Clé publique Paillier — pas de données secrètes, pas de zeroize nécessaire
//
// Le générateur est fixé à g = n + 1 : il n'est pas stocké, g() le recalcule.
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    n:         BigUint,
    n_squared: BigUint,
}

impl PublicKey {
    /// n doit être impair, > 1 et d'au plus MAX_KEY_BITS bits
    pub fn new(n: BigUint) -> Result<Self, CryptoError> {
        if n <= BigUint::one() || n.is_even() {
            return Err(CryptoError::InvalidPublicKey);
        }
        if n.bits() > MAX_KEY_BITS {
            return Err(CryptoError::KeySizeTooLarge { requested: n.bits(), maximum: MAX_KEY_BITS });
        }
        let n_squared = &n * &n;
        Ok(PublicKey { n, n_squared })
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn n_squared(&self) -> &BigUint {
        &self.n_squared
    }

    pub fn g(&self) -> BigUint {
        &self.n + BigUint::one()
    }

    /// Taille de n en bits
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }
}

// ============================================================================
// Helper : efface les chiffres internes d'un BigUint
//
// num-bigint n'expose pas son Vec<u64>. On remet chaque bit à zéro en place,
// du poids faible au poids fort : le tampon n'est tronqué qu'une fois
// entièrement nul, les anciens chiffres ne sont donc jamais libérés intacts.
// ============================================================================
fn zeroize_biguint(n: &mut BigUint) {
    for i in 0..n.bits() {
        n.set_bit(i, false);
    }
}

// ============================================================================
// Clé privée Paillier — ZEROISÉE À LA DESTRUCTION
//
// Garde une copie de la clé publique : n et n² servent à toutes les
// réductions du déchiffrement.
// ============================================================================
#[derive(Clone)]
pub struct PrivateKey {
    public_key: PublicKey,
    lambda:     BigUint,
    mu:         BigUint,
}

impl PrivateKey {
    // -----------------------------------------------------------------------
    // Reconstruit une clé privée à partir de ses composantes (chargement
    // depuis le disque). Vérifie :
    //   gcd(lambda, n) = 1
    //   mu < n  et  mu · L(g^lambda mod n²) ≡ 1 (mod n)
    // -----------------------------------------------------------------------
    pub fn new(public_key: PublicKey, lambda: BigUint, mu: BigUint) -> Result<Self, CryptoError> {
        let n = public_key.n();
        if !gcd(&lambda, n).is_one() || &mu >= n {
            return Err(CryptoError::KeyCoherenceError);
        }

        let g_lambda = public_key.g().modpow(&lambda, public_key.n_squared());
        let l_value  = l_function(&g_lambda, n);
        if !((&l_value * &mu) % n).is_one() {
            return Err(CryptoError::KeyCoherenceError);
        }

        Ok(PrivateKey { public_key, lambda, mu })
    }

    // -----------------------------------------------------------------------
    // Dérive la clé privée de deux premiers distincts p et q.
    //
    //   n      = p·q
    //   lambda = lcm(p-1, q-1) = (p-1)(q-1) / gcd(p-1, q-1)
    //   mu     = L((n+1)^lambda mod n²)^-1 mod n
    //
    // Avec g = n+1, L(g^lambda mod n²) = lambda mod n : mu existe si et
    // seulement si gcd(lambda, n) = 1. Sinon Err(KeyGeneration), que
    // l'appelant traite par un nouveau tirage.
    // -----------------------------------------------------------------------
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self, CryptoError> {
        if p == q {
            return Err(CryptoError::KeyGeneration);
        }

        let n          = p * q;
        let public_key = PublicKey::new(n)?;
        let n          = public_key.n();

        let p_minus_1 = p - BigUint::one();
        let q_minus_1 = q - BigUint::one();
        let lambda    = lcm(&p_minus_1, &q_minus_1);

        if !gcd(&lambda, n).is_one() {
            return Err(CryptoError::KeyGeneration);
        }

        let g_lambda = public_key.g().modpow(&lambda, public_key.n_squared());
        let l_value  = l_function(&g_lambda, n);
        let mu = mod_inverse(&l_value, n).map_err(|_| CryptoError::KeyGeneration)?;

        Ok(PrivateKey { public_key, lambda, mu })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn n(&self) -> &BigUint {
        self.public_key.n()
    }

    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    pub fn mu(&self) -> &BigUint {
        &self.mu
    }
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        zeroize_biguint(&mut self.lambda);
        zeroize_biguint(&mut self.mu);
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// lambda et mu ne doivent jamais apparaître dans les journaux
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("n_bits", &self.public_key.bits())
            .field("lambda", &"<secret>")
            .field("mu", &"<secret>")
            .finish()
    }
}

// ============================================================================
// Paire de clés
// ============================================================================
#[derive(Clone, Debug)]
pub struct KeyPair {
    public_key:  PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    pub fn new(private_key: PrivateKey) -> Self {
        KeyPair {
            public_key: private_key.public_key().clone(),
            private_key,
        }
    }

    /// Construit la paire à partir de p et q fournis (tests, vecteurs connus).
    /// p et q doivent être premiers et distincts.
    pub fn from_primes(p: &BigUint, q: &BigUint) -> Result<Self, CryptoError> {
        let mut rng = OsRng;
        ensure_entropy(&mut rng)?;
        for x in [p, q] {
            if !is_probable_prime(x, miller_rabin_rounds(x.bits()), &mut rng) {
                return Err(CryptoError::KeyGeneration);
            }
        }
        Ok(KeyPair::new(PrivateKey::from_primes(p, q)?))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

// ============================================================================
// Génération de clés Paillier
//
// p_keygen(bits) : configuration par défaut, taille de n = bits.
// ============================================================================
pub fn p_keygen(bit_length: u64) -> Result<KeyPair, CryptoError> {
    p_keygen_with_config(&KeygenConfig::new(bit_length))
}

// ---------------------------------------------------------------------------
// Boucle de génération, bornée par config.max_attempts. Un tirage est à
// refaire quand :
//   - q == p            → seul q est retiré
//   - |n| != bit_length → on garde le plus grand des deux premiers (à taille
//                         égale) et on retire l'autre
//   - gcd(lambda, n) != 1 (KeyGeneration) → p et q sont retirés
// L'échec de la source d'aléa est propagé immédiatement, sans nouvel essai.
// ---------------------------------------------------------------------------
pub fn p_keygen_with_config(config: &KeygenConfig) -> Result<KeyPair, CryptoError> {
    config.validate()?;
    if config.bit_length < RECOMMENDED_KEY_BITS {
        warn!(
            bits = config.bit_length,
            recommended = RECOMMENDED_KEY_BITS,
            "taille de clé inférieure à la recommandation"
        );
    }
    ensure_entropy(&mut OsRng)?;

    let (p_bits, q_bits) = config.prime_bits();
    let mut kept: Option<Retained> = None;

    for attempt in 1..=config.max_attempts {
        let (p, q) = match kept.take() {
            Some(Retained::P(p)) => (p, generate_prime(q_bits)?),
            Some(Retained::Q(q)) => (generate_prime(p_bits)?, q),
            None => draw_primes(p_bits, q_bits, config.parallel_prime_search)?,
        };

        if p == q {
            debug!(attempt, "p == q, nouveau tirage de q");
            kept = Some(Retained::P(p));
            continue;
        }

        if (&p * &q).bits() != config.bit_length {
            debug!(attempt, bits = config.bit_length, "taille de n incorrecte, nouveau tirage d'un premier");
            kept = Some(retain_larger(p, q, p_bits, q_bits));
            continue;
        }

        match PrivateKey::from_primes(&p, &q) {
            Ok(sk) => {
                debug!(attempt, bits = config.bit_length, "paire de clés générée");
                return Ok(KeyPair::new(sk));
            }
            Err(CryptoError::KeyGeneration) => {
                warn!(attempt, "gcd(lambda, n) != 1, nouveau tirage de p et q");
            }
            Err(e) => return Err(e),
        }
    }

    Err(CryptoError::KeyGenerationExhausted { attempts: config.max_attempts })
}

// Premier conservé d'un tirage à compléter
#[derive(Debug, PartialEq)]
enum Retained {
    P(BigUint),
    Q(BigUint),
}

// ---------------------------------------------------------------------------
// n trop court : garde le premier le plus grand relativement à sa taille.
// Comparés à bits égaux (p décalé de q_bits - p_bits), le plus grand laisse
// le plus de chances au nouveau tirage d'atteindre bit_length.
// ---------------------------------------------------------------------------
fn retain_larger(p: BigUint, q: BigUint, p_bits: u64, q_bits: u64) -> Retained {
    let p_scaled = &p << (q_bits - p_bits);
    if p_scaled >= q {
        Retained::P(p)
    } else {
        Retained::Q(q)
    }
}

fn draw_primes(
    p_bits: u64,
    q_bits: u64,
    parallel: bool,
) -> Result<(BigUint, BigUint), CryptoError> {
    if parallel {
        let (p, q) = rayon::join(|| generate_prime(p_bits), || generate_prime(q_bits));
        Ok((p?, q?))
    } else {
        Ok((generate_prime(p_bits)?, generate_prime(q_bits)?))
    }
}
