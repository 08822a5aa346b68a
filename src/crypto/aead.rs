//! AES-256-GCM authenticated encryption.
//!
//! Every encryption call runs under a fresh session key and nonce from
//! [`generate_session_material`]; neither is ever reused or persisted.
//! Decryption is verify-then-release: the GCM tag check happens inside the
//! primitive (constant time) and no plaintext leaves this module unless the
//! whole message authenticates.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::CipherError;

/// Session key length for AES-256 (bytes).
pub const SESSION_KEY_LEN: usize = 32;

/// Nonce length for GCM (bytes).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for GCM (bytes).
pub const TAG_LEN: usize = 16;

/// A single-use 256-bit symmetric key.
///
/// Exists only for the duration of one encrypt or decrypt call; the key
/// material is zeroed when the value is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Wraps existing key material, rejecting anything that is not exactly
    /// 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        let key: [u8; SESSION_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CipherError::InvalidKeyLength {
                    expected: SESSION_KEY_LEN,
                    got: bytes.len(),
                })?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material, not even in debug output.
        f.debug_tuple("SessionKey").field(&"[REDACTED]").finish()
    }
}

/// Generates a fresh session key and nonce from the OS entropy source.
///
/// The only failure mode is an entropy-source failure, which is fatal and
/// non-retryable.
pub fn generate_session_material() -> Result<(SessionKey, [u8; NONCE_LEN]), CipherError> {
    let mut key = [0u8; SESSION_KEY_LEN];
    let mut nonce = [0u8; NONCE_LEN];

    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| CipherError::Rng(e.to_string()))?;
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CipherError::Rng(e.to_string()))?;

    Ok((SessionKey(key), nonce))
}

/// Encrypts `plaintext` with AES-256-GCM.
///
/// Returns the ciphertext (same length as the plaintext; GCM is a stream
/// construction) and the detached 16-byte authentication tag.
pub fn aead_encrypt(
    plaintext: &[u8],
    key: &SessionKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer)
        .map_err(|_| CipherError::Authentication)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok((buffer, tag_bytes))
}

/// Decrypts `ciphertext`, verifying the authentication tag.
///
/// The tag comparison is done by the primitive itself in constant time.
/// On any mismatch the whole operation fails with
/// [`CipherError::Authentication`] and no partial plaintext is returned.
pub fn aead_decrypt(
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
    key: &SessionKey,
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| CipherError::Authentication)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (key, nonce) = generate_session_material().unwrap();
        let plaintext = b"the quick brown fox";

        let (ciphertext, tag) = aead_encrypt(plaintext, &key, &nonce).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(ciphertext.as_slice(), plaintext.as_slice());

        let decrypted = aead_decrypt(&ciphertext, &tag, &key, &nonce).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let (key, nonce) = generate_session_material().unwrap();
        let (ciphertext, tag) = aead_encrypt(b"", &key, &nonce).unwrap();
        assert!(ciphertext.is_empty());
        assert_eq!(aead_decrypt(&ciphertext, &tag, &key, &nonce).unwrap(), b"");
    }

    #[test]
    fn test_session_material_is_fresh() {
        let (key_a, nonce_a) = generate_session_material().unwrap();
        let (key_b, nonce_b) = generate_session_material().unwrap();
        assert_ne!(key_a.as_bytes(), key_b.as_bytes());
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn test_tampered_tag_fails() {
        let (key, nonce) = generate_session_material().unwrap();
        let (ciphertext, mut tag) = aead_encrypt(b"payload", &key, &nonce).unwrap();

        tag[0] ^= 0x01;
        assert!(matches!(
            aead_decrypt(&ciphertext, &tag, &key, &nonce),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let (key, nonce) = generate_session_material().unwrap();
        let (mut ciphertext, tag) = aead_encrypt(b"payload", &key, &nonce).unwrap();

        ciphertext[3] ^= 0x80;
        assert!(matches!(
            aead_decrypt(&ciphertext, &tag, &key, &nonce),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let (key, nonce) = generate_session_material().unwrap();
        let (other_key, _) = generate_session_material().unwrap();
        let (ciphertext, tag) = aead_encrypt(b"payload", &key, &nonce).unwrap();

        assert!(matches!(
            aead_decrypt(&ciphertext, &tag, &other_key, &nonce),
            Err(CipherError::Authentication)
        ));
    }

    #[test]
    fn test_session_key_length_check() {
        assert!(SessionKey::from_bytes(&[0u8; 32]).is_ok());
        assert!(matches!(
            SessionKey::from_bytes(&[0u8; 31]),
            Err(CipherError::InvalidKeyLength {
                expected: 32,
                got: 31
            })
        ));
    }

    #[test]
    fn test_debug_redacts_key_material() {
        let (key, _) = generate_session_material().unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(rendered.len() < 40);
    }
}
