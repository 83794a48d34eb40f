//! Error types for dataspace selection and transfer operations.

use std::io;

/// Broad error classes, used when reporting into an external error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad rank, bad parameter, mismatched element counts.
    Argument,
    /// Allocation failure.
    Resource,
    /// Selection (plus offset) outside its extent, or overlapping blocks.
    Bounds,
    /// Extent class or selection-kind combination that is not implemented.
    Unsupported,
    /// Propagated from the byte store.
    Io,
}

/// Errors raised while building, validating, iterating or encoding selections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpaceError {
    /// An argument was malformed (wrong rank, zero stride, empty point list, ...).
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Rank of the supplied coordinates or encoded selection does not match the extent.
    #[error("rank mismatch: expected {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Element counts of two selections differ.
    #[error("element count mismatch: file selection has {file}, memory selection has {mem}")]
    CountMismatch { file: u64, mem: u64 },

    /// Memory could not be reserved.
    #[error("allocation failed: {0}")]
    Resource(String),

    /// Selection lies outside the extent, or an extent change would cut it.
    #[error("out of bounds: {0}")]
    Bounds(String),

    /// Blocks of a single hyperslab request overlap (stride < block).
    #[error("hyperslab blocks overlap in dimension {dim}: stride {stride} < block {block}")]
    OverlappingBlocks { dim: usize, stride: u64, block: u64 },

    /// Operation is not supported for this extent class or selection kind.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Encoded selection uses an unknown kind tag.
    #[error("unknown selection kind {0}")]
    UnknownSelectionKind(u32),

    /// Encoded selection or dataspace uses an unknown version.
    #[error("unsupported encoding version {0}")]
    UnsupportedVersion(u32),

    /// Unexpected end of data while decoding.
    #[error("unexpected EOF: need {expected} bytes, have {available}")]
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },

    /// Invalid dataspace message version.
    #[error("invalid dataspace message version: {0}")]
    InvalidDataspaceVersion(u8),

    /// Invalid dataspace message type byte.
    #[error("invalid dataspace type: {0}")]
    InvalidDataspaceType(u8),

    /// Invalid length size (must be 2, 4, or 8).
    #[error("invalid length size: {0} (must be 2, 4, or 8)")]
    InvalidLengthSize(u8),
}

impl SpaceError {
    /// The taxonomy class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpaceError::Argument(_)
            | SpaceError::RankMismatch { .. }
            | SpaceError::CountMismatch { .. }
            | SpaceError::UnexpectedEof { .. }
            | SpaceError::InvalidDataspaceVersion(_)
            | SpaceError::InvalidDataspaceType(_)
            | SpaceError::InvalidLengthSize(_) => ErrorCategory::Argument,
            SpaceError::Resource(_) => ErrorCategory::Resource,
            SpaceError::Bounds(_) | SpaceError::OverlappingBlocks { .. } => ErrorCategory::Bounds,
            SpaceError::Unsupported(_)
            | SpaceError::UnknownSelectionKind(_)
            | SpaceError::UnsupportedVersion(_) => ErrorCategory::Unsupported,
        }
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        SpaceError::Argument(msg.into())
    }

    pub(crate) fn bounds(msg: impl Into<String>) -> Self {
        SpaceError::Bounds(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        SpaceError::Unsupported(msg.into())
    }
}

impl From<std::collections::TryReserveError> for SpaceError {
    fn from(e: std::collections::TryReserveError) -> Self {
        SpaceError::Resource(e.to_string())
    }
}

/// Errors raised by the scatter/gather transfer engine.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Selection or argument problem detected before or during the transfer.
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// The byte store failed. `moved` bytes reached the destination first;
    /// they are not rolled back.
    #[error("I/O error after {moved} bytes moved: {source}")]
    Io {
        moved: u64,
        #[source]
        source: io::Error,
    },
}

impl TransferError {
    /// The taxonomy class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TransferError::Space(e) => e.category(),
            TransferError::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Bytes that reached the destination before an I/O failure.
    pub fn bytes_moved(&self) -> Option<u64> {
        match self {
            TransferError::Io { moved, .. } => Some(*moved),
            TransferError::Space(_) => None,
        }
    }
}

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, SpaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(SpaceError::argument("x").category(), ErrorCategory::Argument);
        assert_eq!(
            SpaceError::OverlappingBlocks { dim: 0, stride: 1, block: 2 }.category(),
            ErrorCategory::Bounds
        );
        assert_eq!(SpaceError::UnknownSelectionKind(9).category(), ErrorCategory::Unsupported);
        assert_eq!(
            SpaceError::UnexpectedEof { expected: 8, available: 2 }.category(),
            ErrorCategory::Argument
        );
        let io = TransferError::Io {
            moved: 12,
            source: io::Error::new(io::ErrorKind::Other, "disk gone"),
        };
        assert_eq!(io.category(), ErrorCategory::Io);
        assert_eq!(io.bytes_moved(), Some(12));
    }

    #[test]
    fn display_messages() {
        let e = SpaceError::RankMismatch { expected: 2, got: 3 };
        assert_eq!(e.to_string(), "rank mismatch: expected 2, got 3");
        let t: TransferError = SpaceError::CountMismatch { file: 4, mem: 5 }.into();
        assert_eq!(
            t.to_string(),
            "element count mismatch: file selection has 4, memory selection has 5"
        );
    }

    #[test]
    fn try_reserve_maps_to_resource() {
        let mut v: Vec<u64> = Vec::new();
        let err: SpaceError = v.try_reserve(usize::MAX).unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Resource);
    }
}
