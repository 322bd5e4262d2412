// Cryptosystème de Paillier, générateur fixe g = n + 1
//
//   math          : L(u), pgcd, ppcm, inverse modulaire, Miller-Rabin
//   p_prime       : génération de premiers de taille exacte
//   p_keygen      : PublicKey / PrivateKey / KeyPair
//   ciphertext    : type Ciphertext + encodages hex / binaire
//   p_encrypt     : c = (n+1)^m · r^n mod n²
//   p_decrypt     : m = L(c^λ mod n²) · μ mod n
//   p_homomorphic : addition de chiffrés, opérations avec un clair

pub mod math;
pub mod p_prime;
pub mod p_keygen;
pub mod ciphertext;
pub mod p_encrypt;
pub mod p_decrypt;
pub mod p_homomorphic;
