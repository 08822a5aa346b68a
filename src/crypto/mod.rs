//! Cryptographic operations for QRseal.
//!
//! This module provides:
//! - RSA-3072 key pair generation and PEM persistence
//! - AES-256-GCM authenticated encryption under single-use session keys
//! - RSA-OAEP (SHA-256) session-key wrapping
//! - Payload compression (zstd)
//!
//! The hybrid split is the standard one: RSA-OAEP bounds what it can
//! encrypt to a small fixed-size secret, so it wraps only the 32-byte
//! session key, while AES-GCM does the bulk authenticated work.

pub mod aead;
pub mod compression;
pub mod keys;
pub mod wrap;

pub use aead::{
    aead_decrypt, aead_encrypt, generate_session_material, SessionKey, NONCE_LEN, SESSION_KEY_LEN,
    TAG_LEN,
};
pub use compression::{compress, decompress, Compression, CompressionError};
pub use keys::{load_private_key, load_public_key, KeyError, KeyPair};
pub use wrap::{max_wrap_len, unwrap_key, wrap_key};

use thiserror::Error;

/// Errors that can occur during cipher operations.
///
/// `Authentication` and `KeyUnwrap` are deliberately unexplanatory: a tag
/// mismatch, a padding failure, and a wrong key must all look identical to
/// a caller (and to anyone observing the caller's behavior).
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid session key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("invalid nonce length: expected {expected} bytes, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },

    #[error("authentication failed")]
    Authentication,

    #[error("plaintext too large for RSA-OAEP: maximum {max} bytes, got {got}")]
    OversizePlaintext { max: usize, got: usize },

    #[error("key wrapping failed: {0}")]
    WrapFailed(String),

    #[error("key unwrap failed")]
    KeyUnwrap,

    #[error("entropy source failure: {0}")]
    Rng(String),
}
