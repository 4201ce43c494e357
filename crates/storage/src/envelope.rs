// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact file format.
//!
//! Each artifact is a single file so metadata and payload are published
//! together by one rename:
//!
//! ```text
//! [u32 big-endian header length][JSON ArtifactMeta][payload bytes]
//! ```

use ci_core::ArtifactMeta;
use std::io::Read;
use thiserror::Error;

/// Header length cap; anything larger is not a file we wrote.
const MAX_HEADER_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub(crate) enum EnvelopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("header length {0} out of range")]
    HeaderTooLarge(usize),
    #[error("bad header: {0}")]
    Header(#[from] serde_json::Error),
    #[error("payload is {actual} bytes, header says {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
}

pub(crate) fn encode(meta: &ArtifactMeta, payload: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let header = serde_json::to_vec(meta)?;
    if header.len() > MAX_HEADER_LEN {
        return Err(EnvelopeError::HeaderTooLarge(header.len()));
    }
    let mut buf = Vec::with_capacity(4 + header.len() + payload.len());
    buf.extend_from_slice(&(header.len() as u32).to_be_bytes());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Read only the metadata header.
pub(crate) fn read_header<R: Read>(reader: &mut R) -> Result<ArtifactMeta, EnvelopeError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_HEADER_LEN {
        return Err(EnvelopeError::HeaderTooLarge(len));
    }
    let mut header = vec![0u8; len];
    reader.read_exact(&mut header)?;
    Ok(serde_json::from_slice(&header)?)
}

/// Split a whole artifact file into metadata and payload.
pub(crate) fn decode(bytes: &[u8]) -> Result<(ArtifactMeta, Vec<u8>), EnvelopeError> {
    let mut reader = bytes;
    let meta = read_header(&mut reader)?;
    let payload = reader.to_vec();
    if payload.len() as u64 != meta.size && !meta.is_remote() {
        return Err(EnvelopeError::SizeMismatch { expected: meta.size, actual: payload.len() as u64 });
    }
    Ok((meta, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ci_core::{ArtifactId, RemoteArtifact};

    fn meta(size: u64) -> ArtifactMeta {
        ArtifactMeta::new(ArtifactId::from_seq(1), "text/plain", size, 1_000)
    }

    #[test]
    fn decode_splits_header_and_payload() {
        let bytes = encode(&meta(12), b"test_content").unwrap();
        let (decoded, payload) = decode(&bytes).unwrap();
        assert_eq!(decoded, meta(12));
        assert_eq!(payload, b"test_content");
    }

    #[test]
    fn header_reads_without_payload() {
        let bytes = encode(&meta(4), b"data").unwrap();
        let mut reader = &bytes[..];
        assert_eq!(read_header(&mut reader).unwrap(), meta(4));
        assert_eq!(reader, b"data");
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = encode(&meta(12), b"test_content").unwrap();
        let err = decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, EnvelopeError::SizeMismatch { expected: 12, actual: 9 }));
    }

    #[test]
    fn remote_mirror_carries_no_payload() {
        let mut mirrored = meta(512);
        mirrored.remote = Some(RemoteArtifact { artifact_id: ArtifactId::from_seq(4) });
        let (decoded, payload) = decode(&encode(&mirrored, &[]).unwrap()).unwrap();
        assert!(decoded.is_remote());
        assert!(payload.is_empty());
    }

    #[test]
    fn oversized_header_length_is_rejected() {
        let mut bytes = u32::MAX.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        assert!(matches!(decode(&bytes), Err(EnvelopeError::HeaderTooLarge(_))));
    }

    #[test]
    fn short_file_is_io_error() {
        assert!(matches!(decode(&[0, 0]), Err(EnvelopeError::Io(_))));
    }
}
