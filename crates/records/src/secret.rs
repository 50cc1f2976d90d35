//! JWT secret generation.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

/// Characters allowed in the printable secret.
pub const SECRET_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

pub const PRINTABLE_LENGTH: usize = 64;
pub const BASE64_BYTES: usize = 48;
pub const HEX_BYTES: usize = 32;

/// Shortest secret the backend should accept.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Three interchangeable secrets in different encodings.
#[derive(Debug, Clone)]
pub struct SecretCandidates {
    pub printable: String,
    pub base64: String,
    pub hex: String,
}

impl SecretCandidates {
    /// Draws all three from the operating system's CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self {
            printable: printable_secret(rng, PRINTABLE_LENGTH),
            base64: STANDARD.encode(random_bytes(rng, BASE64_BYTES)),
            hex: hex::encode(random_bytes(rng, HEX_BYTES)),
        }
    }
}

impl fmt::Display for SecretCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "JWT Secret Key Generator")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f, "Option 1 (Alphanumeric + Special chars):")?;
        writeln!(f, "JWT_SECRET={}", self.printable)?;
        writeln!(f)?;
        writeln!(f, "Option 2 (Base64 encoded):")?;
        writeln!(f, "JWT_SECRET={}", self.base64)?;
        writeln!(f)?;
        writeln!(f, "Option 3 (Hex encoded):")?;
        writeln!(f, "JWT_SECRET={}", self.hex)?;
        writeln!(f)?;
        writeln!(f, "Security notes:")?;
        writeln!(f, "- Never commit these secrets to version control")?;
        writeln!(f, "- Use different secrets for development and production")?;
        writeln!(f, "- Store them in environment variables only")?;
        writeln!(f, "- Minimum length is {MIN_SECRET_LENGTH} characters")
    }
}

/// Picks `len` characters uniformly from [`SECRET_ALPHABET`].
pub fn printable_secret<R: Rng + CryptoRng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .filter_map(|_| SECRET_ALPHABET.choose(rng).copied())
        .map(char::from)
        .collect()
}

fn random_bytes<R: RngCore + ?Sized>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}
