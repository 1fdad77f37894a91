// ---------------------------------------------------------------------------
// file_header – Race file header with magic bytes, versions and checksum
// ---------------------------------------------------------------------------
//
// Header format (32 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "CHRN"
//   [4..8]   Header format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4 compressed)
//   [12..20] Race creation time (Unix epoch ms, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] Record schema version (u32)
//   [28..32] xxHash32 checksum of the payload as stored
//
// There is no headerless fallback: anything without the magic is corrupt.

use xxhash_rust::xxh32::xxh32;

use crate::store_error::StoreError;

/// Magic bytes identifying a race file.
pub const MAGIC: [u8; 4] = *b"CHRN";

pub const HEADER_SIZE: usize = 32;

/// Version of the header layout itself, distinct from the record schema.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Payload is lz4 block-compressed with a prepended size.
pub const FLAG_COMPRESSED: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub created_at_ms: u64,
    pub uncompressed_size: u32,
    pub schema_version: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.created_at_ms.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.schema_version.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Prepend a header to `payload`.
///
/// `uncompressed_size` is the length of the payload before compression (equal
/// to `payload.len()` when `flags` has no compression bit).
pub fn wrap_with_header(
    payload: &[u8],
    flags: u32,
    created_at_ms: u64,
    uncompressed_size: usize,
    schema_version: u32,
) -> Vec<u8> {
    let header = FileHeader {
        format_version: HEADER_FORMAT_VERSION,
        flags,
        created_at_ms,
        uncompressed_size: uncompressed_size as u32,
        schema_version,
        checksum: xxh32(payload, XXHASH_SEED),
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write(&mut out);
    out.extend_from_slice(payload);
    out
}

/// Parse and validate the header, returning it with the payload that follows.
///
/// # Errors
///
/// - `Corrupt` when the magic is missing, the header is truncated or the
///   checksum does not match
/// - `VersionMismatch` when the header layout is newer than this build
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), StoreError> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(StoreError::Corrupt("missing CHRN magic bytes".into()));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Corrupt(format!(
            "file too short ({} bytes, need at least {} for header)",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let format_version = le_u32(bytes, 4);
    if format_version > HEADER_FORMAT_VERSION {
        return Err(StoreError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: format_version,
        });
    }

    let mut created = [0u8; 8];
    created.copy_from_slice(&bytes[12..20]);
    let header = FileHeader {
        format_version,
        flags: le_u32(bytes, 8),
        created_at_ms: u64::from_le_bytes(created),
        uncompressed_size: le_u32(bytes, 20),
        schema_version: le_u32(bytes, 24),
        checksum: le_u32(bytes, 28),
    };

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(StoreError::Corrupt(format!(
            "checksum mismatch (expected {:#010X}, got {:#010X})",
            header.checksum, computed
        )));
    }

    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(payload: &[u8]) -> Vec<u8> {
        wrap_with_header(payload, 0, 1_700_000_000_000, payload.len(), 1)
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let payload = b"race payload";
        let wrapped = wrap(payload);
        assert_eq!(&wrapped[..4], b"CHRN");
        assert_eq!(wrapped.len(), HEADER_SIZE + payload.len());

        let (header, body) = unwrap_header(&wrapped).expect("valid header");
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert_eq!(header.created_at_ms, 1_700_000_000_000);
        assert_eq!(header.uncompressed_size, payload.len() as u32);
        assert_eq!(header.schema_version, 1);
        assert!(!header.is_compressed());
        assert_eq!(body, payload);
    }

    #[test]
    fn test_compressed_flag() {
        let wrapped = wrap_with_header(b"xyz", FLAG_COMPRESSED, 0, 100, 1);
        let (header, _) = unwrap_header(&wrapped).expect("valid header");
        assert!(header.is_compressed());
        assert_eq!(header.uncompressed_size, 100);
    }

    #[test]
    fn test_missing_magic_is_corrupt() {
        let result = unwrap_header(b"\x00\x01\x02\x03 some bytes");
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
        assert!(matches!(unwrap_header(b""), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_truncated_header_is_corrupt() {
        match unwrap_header(b"CHRN\x01\x00") {
            Err(StoreError::Corrupt(msg)) => assert!(msg.contains("too short"), "got: {msg}"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let mut wrapped = wrap(b"lap times");
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xFF;
        match unwrap_header(&wrapped) {
            Err(StoreError::Corrupt(msg)) => assert!(msg.contains("checksum"), "got: {msg}"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_future_header_version_rejected() {
        let mut wrapped = wrap(b"lap times");
        wrapped[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(StoreError::VersionMismatch { found: 9, .. })
        ));
    }

    #[test]
    fn test_empty_payload() {
        let wrapped = wrap(b"");
        assert_eq!(wrapped.len(), HEADER_SIZE);
        let (_, body) = unwrap_header(&wrapped).expect("valid header");
        assert!(body.is_empty());
    }
}
