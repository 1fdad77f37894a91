// ---------------------------------------------------------------------------
// StoreError: typed failures of the race store
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors a race store can report.
///
/// Not-found is not an error: `RaceStore::load` returns `Ok(None)`.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error (permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Encoding a race failed.
    Encode(String),
    /// Decoding a race failed (invalid payload).
    Decode(String),
    /// The stored bytes are damaged: bad magic, truncated header, checksum
    /// mismatch or a failed decompression.
    Corrupt(String),
    /// The file was written by a newer build.
    VersionMismatch { expected_max: u32, found: u32 },
    /// The store backend cannot be reached.
    Unavailable(String),
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            StoreError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            StoreError::Corrupt(msg) => write!(f, "Corrupt race file: {msg}"),
            StoreError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: race is v{found}, but this build only supports up to v{expected_max}"
            ),
            StoreError::Unavailable(msg) => write!(f, "Race store unavailable: {msg}"),
            StoreError::Poisoned => write!(f, "Race store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<bitcode::Error> for StoreError {
    fn from(e: bitcode::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Encode(e.to_string())
        }
    }
}
