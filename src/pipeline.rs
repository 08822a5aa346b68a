//! The end-to-end encrypt/decrypt orchestrator.
//!
//! Composes compression, the hybrid cipher, the envelope codec, the Base45
//! transport codec, and the chunker into two operations:
//!
//! ```text
//! encrypt: payload -> compress -> AES-GCM -> wrap key -> envelope
//!          -> Base45 -> chunks
//! decrypt: chunks -> reassemble -> Base45 -> envelope -> unwrap key
//!          -> AES-GCM verify+decrypt -> decompress -> payload
//! ```
//!
//! Both are all-or-nothing: a failure at any stage aborts the whole
//! operation and the component error is forwarded unwrapped. No
//! intermediate artifact - session key, partial plaintext, partial
//! ciphertext - is returned, logged, or retried; cryptographic failures
//! are not transient.

use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

use crate::chunk::{self, Chunk, ChunkError};
use crate::crypto::{
    aead_decrypt, aead_encrypt, compress, decompress, generate_session_material, unwrap_key,
    wrap_key, CipherError, Compression, CompressionError,
};
use crate::envelope::{Envelope, EnvelopeError};
use crate::transport::{self, TransportError};

/// Failures forwarded from the pipeline's stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("transport encoding error: {0}")]
    Transport(#[from] TransportError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),
}

/// Encrypts `payload` for the holder of the matching private key and
/// splits the result into QR-sized chunks.
///
/// `max_chunk_chars` is the per-symbol character budget, normally taken
/// from [`crate::qr::max_chunk_chars`] for the target QR version and
/// error-correction level.
pub fn encrypt(
    payload: &[u8],
    public_key: &RsaPublicKey,
    compression: Compression,
    max_chunk_chars: usize,
) -> Result<Vec<Chunk>, PipelineError> {
    let transport = encrypt_to_transport(payload, public_key, compression)?;
    Ok(chunk::split(&transport, max_chunk_chars)?)
}

/// Reassembles scanned chunks (any arrival order) and decrypts the payload.
pub fn decrypt(chunks: &[Chunk], private_key: &RsaPrivateKey) -> Result<Vec<u8>, PipelineError> {
    let transport = chunk::reassemble(chunks)?;
    decrypt_transport(&transport, private_key)
}

/// Encrypts `payload` down to a single transport string, without chunking.
///
/// Useful when the result is known to fit one QR symbol, and as the
/// substrate for [`encrypt`].
pub fn encrypt_to_transport(
    payload: &[u8],
    public_key: &RsaPublicKey,
    compression: Compression,
) -> Result<String, PipelineError> {
    let compressed = compress(payload, compression)?;

    let (session_key, nonce) = generate_session_material()?;
    let (ciphertext, tag) = aead_encrypt(&compressed, &session_key, &nonce)?;
    let wrapped_key = wrap_key(&session_key, public_key)?;

    let envelope = Envelope::new(wrapped_key, nonce, tag, ciphertext, compression.id())?;

    Ok(transport::encode_base45(&envelope.serialize()?))
}

/// Decrypts a complete transport string back to the original payload.
pub fn decrypt_transport(
    transport_string: &str,
    private_key: &RsaPrivateKey,
) -> Result<Vec<u8>, PipelineError> {
    let serialized = transport::decode_base45(transport_string)?;
    let envelope = Envelope::deserialize(&serialized)?;

    let session_key = unwrap_key(envelope.wrapped_key(), private_key)?;
    let compressed = aead_decrypt(
        envelope.ciphertext(),
        envelope.tag(),
        &session_key,
        envelope.iv(),
    )?;

    Ok(decompress(&compressed, envelope.compression_id())?)
}
