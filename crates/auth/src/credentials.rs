//! Generated one-time passwords and password hashing.
//!
//! Walk-in customers never choose a password; accounts created on their behalf
//! get a random one that is hashed before it reaches storage.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

const LOWER: &[u8] = b"abcdefghijkmnpqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*-_+=?";

/// Length of generated passwords.
pub const GENERATED_PASSWORD_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Generate a random password with at least one lowercase letter, uppercase
/// letter, digit and symbol.
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let classes = [LOWER, UPPER, DIGITS, SYMBOLS];
    let all: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = classes
        .iter()
        .filter_map(|class| class.choose(rng).copied())
        .collect();
    while chars.len() < GENERATED_PASSWORD_LEN {
        if let Some(c) = all.choose(rng) {
            chars.push(*c);
        }
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}

/// Hash a password with Argon2id and a random salt (PHC string format).
pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

pub fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
