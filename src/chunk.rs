//! Capacity-bounded chunking and order-independent reassembly.
//!
//! A transport string rarely fits one QR symbol, so it is split into
//! chunks sized to the target symbol's alphanumeric capacity. Every chunk
//! carries its position (`sequence_index`) and the set size
//! (`total_chunks`): a human scanning printed codes gives no ordering
//! guarantee, and a bare split-by-length cannot be reassembled safely once
//! scan order is lost. Reassembly accepts any arrival order and either
//! reproduces the original string exactly or fails closed.
//!
//! The wire carriage for a chunk is a text prefix `"{index}/{total}:"`
//! ahead of the payload. Digits, `/` and `:` are all Base45-alphabet
//! characters, so a carried chunk still qualifies for QR alphanumeric
//! mode end to end.

use thiserror::Error;

/// Errors that can occur while splitting or reassembling chunks.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk size must be at least 1 character")]
    InvalidChunkSize,

    #[error("transport strings are always ASCII; input contains non-ASCII data")]
    NonAsciiTransport,

    #[error("cannot reassemble an empty chunk set")]
    EmptyChunkSet,

    #[error("chunks disagree on the total count: {first} vs {other}")]
    InconsistentTotal { first: u32, other: u32 },

    #[error("chunk index {index} is out of range for a set of {total}")]
    IndexOutOfRange { index: u32, total: u32 },

    #[error("chunk {index} was provided twice with different payloads")]
    DuplicateChunk { index: u32 },

    #[error("chunk {missing} of {total} is missing")]
    IncompleteChunkSet { missing: u32, total: u32 },

    #[error("malformed chunk header: {0}")]
    MalformedHeader(String),
}

/// One QR-sized fragment of a transport string.
///
/// Concatenating the payloads of a complete set in `sequence_index` order
/// reconstructs the transport string exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk within the set.
    pub sequence_index: u32,
    /// Number of chunks in the set; identical across the whole set.
    pub total_chunks: u32,
    /// A contiguous slice of the transport string.
    pub payload: String,
}

impl Chunk {
    /// Renders the chunk with its header, ready to encode as one QR symbol.
    pub fn to_qr_text(&self) -> String {
        format!(
            "{}/{}:{}",
            self.sequence_index, self.total_chunks, self.payload
        )
    }

    /// Parses a chunk from its QR text form.
    ///
    /// The header ends at the first `:`; the payload may itself contain
    /// `:`, so only that first occurrence delimits.
    pub fn from_qr_text(text: &str) -> Result<Self, ChunkError> {
        let (header, payload) = text
            .split_once(':')
            .ok_or_else(|| ChunkError::MalformedHeader("no ':' separator".to_string()))?;

        let (index, total) = header
            .split_once('/')
            .ok_or_else(|| ChunkError::MalformedHeader("no '/' in header".to_string()))?;

        let sequence_index: u32 = index
            .parse()
            .map_err(|_| ChunkError::MalformedHeader(format!("bad index {index:?}")))?;
        let total_chunks: u32 = total
            .parse()
            .map_err(|_| ChunkError::MalformedHeader(format!("bad total {total:?}")))?;

        if total_chunks == 0 {
            return Err(ChunkError::MalformedHeader(
                "total count must be at least 1".to_string(),
            ));
        }
        if sequence_index >= total_chunks {
            return Err(ChunkError::IndexOutOfRange {
                index: sequence_index,
                total: total_chunks,
            });
        }

        Ok(Self {
            sequence_index,
            total_chunks,
            payload: payload.to_string(),
        })
    }
}

/// Splits a transport string into chunks of at most `max_chunk_chars`.
///
/// Slices are contiguous and non-overlapping, indexed from 0 in slicing
/// order. An empty transport string yields a single empty chunk so the
/// set is never empty.
pub fn split(transport: &str, max_chunk_chars: usize) -> Result<Vec<Chunk>, ChunkError> {
    if max_chunk_chars == 0 {
        return Err(ChunkError::InvalidChunkSize);
    }
    if !transport.is_ascii() {
        return Err(ChunkError::NonAsciiTransport);
    }

    if transport.is_empty() {
        return Ok(vec![Chunk {
            sequence_index: 0,
            total_chunks: 1,
            payload: String::new(),
        }]);
    }

    let total_chunks = transport.len().div_ceil(max_chunk_chars) as u32;

    Ok(transport
        .as_bytes()
        .chunks(max_chunk_chars)
        .enumerate()
        .map(|(i, slice)| Chunk {
            sequence_index: i as u32,
            total_chunks,
            // ASCII input, checked above.
            payload: String::from_utf8_lossy(slice).into_owned(),
        })
        .collect())
}

/// Reassembles a transport string from chunks in any arrival order.
///
/// Verifies that all chunks agree on `total_chunks`, that the indices form
/// exactly the set `{0 .. total_chunks}` with no gaps, and that any
/// repeated index carries an identical payload (a re-scan of the same
/// code is tolerated; a conflicting payload is not). Concatenates by
/// ascending index.
pub fn reassemble(chunks: &[Chunk]) -> Result<String, ChunkError> {
    let first = chunks.first().ok_or(ChunkError::EmptyChunkSet)?;
    let total = first.total_chunks;

    for chunk in chunks {
        if chunk.total_chunks != total {
            return Err(ChunkError::InconsistentTotal {
                first: total,
                other: chunk.total_chunks,
            });
        }
        if chunk.sequence_index >= total {
            return Err(ChunkError::IndexOutOfRange {
                index: chunk.sequence_index,
                total,
            });
        }
    }

    // `total` comes from untrusted scanned headers; a set smaller than it
    // is necessarily incomplete, and bailing here also bounds the slot
    // allocation below by the number of chunks actually supplied.
    if chunks.len() < total as usize {
        let mut seen: Vec<u32> = chunks.iter().map(|c| c.sequence_index).collect();
        seen.sort_unstable();
        seen.dedup();
        let mut missing = seen.len() as u32;
        for (i, index) in seen.iter().enumerate() {
            if *index != i as u32 {
                missing = i as u32;
                break;
            }
        }
        return Err(ChunkError::IncompleteChunkSet { missing, total });
    }

    let mut slots: Vec<Option<&str>> = vec![None; total as usize];
    for chunk in chunks {
        let slot = &mut slots[chunk.sequence_index as usize];
        match slot {
            Some(existing) if *existing != chunk.payload => {
                return Err(ChunkError::DuplicateChunk {
                    index: chunk.sequence_index,
                });
            }
            Some(_) => {}
            None => *slot = Some(&chunk.payload),
        }
    }

    let mut transport = String::with_capacity(chunks.iter().map(|c| c.payload.len()).sum());
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            Some(payload) => transport.push_str(payload),
            None => {
                return Err(ChunkError::IncompleteChunkSet {
                    missing: index as u32,
                    total,
                })
            }
        }
    }

    Ok(transport)
}
