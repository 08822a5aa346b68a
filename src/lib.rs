//! # QRseal - Encrypted data transfer over QR codes
//!
//! QRseal delivers data (text or files) to a recipient through an offline,
//! out-of-band channel: printed or displayed QR codes. Confidentiality and
//! integrity are guaranteed end to end by a hybrid-encryption envelope.
//!
//! ## How it works
//!
//! Encryption pipeline:
//! 1. Compress the payload (zstd)
//! 2. Encrypt with AES-256-GCM under a fresh, single-use session key
//! 3. Wrap the session key with the recipient's RSA-3072 public key (OAEP)
//! 4. Package everything in a versioned CBOR envelope
//! 5. Encode the envelope with Base45 (QR alphanumeric mode)
//! 6. Split into chunks sized to the target QR symbol's capacity
//!
//! Decryption runs the same pipeline in reverse: reassemble the chunks in
//! any scan order, decode, parse, unwrap the session key, verify and
//! decrypt, decompress.
//!
//! Each chunk carries its own `index/total` header, so QR codes can be
//! scanned out of sequence and reassembly still either reproduces the exact
//! original or fails closed - never a silently wrong payload.
//!
//! ## Example
//!
//! ```no_run
//! use qrseal::crypto::{Compression, KeyPair};
//! use qrseal::pipeline;
//!
//! // The recipient generates a key pair and shares the public half.
//! let keys = KeyPair::generate().unwrap();
//!
//! // Sender: payload -> QR-sized chunks.
//! let chunks = pipeline::encrypt(
//!     b"meet at the usual place",
//!     keys.public_key(),
//!     Compression::Zstd,
//!     1024,
//! ).unwrap();
//!
//! // Recipient: scanned chunks (any order) -> payload.
//! let payload = pipeline::decrypt(&chunks, keys.private_key()).unwrap();
//! assert_eq!(payload, b"meet at the usual place");
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: key pairs, AES-GCM, RSA-OAEP key wrapping, compression
//! - [`envelope`]: the canonical CBOR wire record
//! - [`transport`]: Base45 encoding (RFC 9285)
//! - [`chunk`]: QR-capacity-bounded splitting and order-independent reassembly
//! - [`pipeline`]: the end-to-end encrypt/decrypt orchestrator
//! - [`qr`]: QR rendering, reading, and capacity planning

/// Envelope protocol version understood by this implementation.
pub const ENVELOPE_VERSION: u64 = 1;

/// Identifier of the one cipher suite this implementation speaks.
pub const ALGORITHM_ID: &str = "RSA3072-OAEP+AES256-GCM";

pub mod chunk;
pub mod crypto;
pub mod envelope;
pub mod pipeline;
pub mod qr;
pub mod transport;

// Re-export commonly used types at the crate root
pub use chunk::{reassemble, split, Chunk, ChunkError};
pub use crypto::keys::{load_private_key, load_public_key, KeyError, KeyPair};
pub use crypto::{CipherError, Compression, CompressionError, SessionKey};
pub use envelope::{Envelope, EnvelopeError};
pub use pipeline::{decrypt, decrypt_transport, encrypt, encrypt_to_transport, PipelineError};
pub use qr::{QrConfig, QrError, QrFormat};
pub use transport::{decode_base45, encode_base45, TransportError};
