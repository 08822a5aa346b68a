//! RSA-OAEP session-key wrapping.
//!
//! OAEP with SHA-256 for both the hash and the MGF1 mask function. The
//! maximum wrappable length is computed from the actual modulus and hash
//! output sizes rather than a hard-coded overhead, so swapping the hash
//! would move the bound instead of silently breaking it.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::aead::{SessionKey, SESSION_KEY_LEN};
use super::CipherError;

/// Maximum plaintext length wrappable under `public_key`.
///
/// OAEP overhead is `2 * hash_len + 2` bytes; for SHA-256 and a 3072-bit
/// modulus that leaves 318 bytes, so a 32-byte session key always fits.
pub fn max_wrap_len(public_key: &RsaPublicKey) -> usize {
    public_key
        .size()
        .saturating_sub(2 * Sha256::output_size() + 2)
}

/// Wraps a session key under the recipient's public key.
pub fn wrap_key(
    session_key: &SessionKey,
    public_key: &RsaPublicKey,
) -> Result<Vec<u8>, CipherError> {
    let max = max_wrap_len(public_key);
    if SESSION_KEY_LEN > max {
        return Err(CipherError::OversizePlaintext {
            max,
            got: SESSION_KEY_LEN,
        });
    }

    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), session_key.as_bytes())
        .map_err(|e| CipherError::WrapFailed(e.to_string()))
}

/// Unwraps a session key with the recipient's private key.
///
/// Every failure - OAEP padding, wrong length, wrong key - collapses into
/// the single generic [`CipherError::KeyUnwrap`] so the error channel
/// cannot serve as a padding oracle.
pub fn unwrap_key(
    wrapped_key: &[u8],
    private_key: &RsaPrivateKey,
) -> Result<SessionKey, CipherError> {
    let bytes = private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped_key)
        .map_err(|_| CipherError::KeyUnwrap)?;

    SessionKey::from_bytes(&bytes).map_err(|_| CipherError::KeyUnwrap)
}
