//! Transfer property list.
//!
//! Groups the knobs of a scatter/gather transfer into one reusable bundle,
//! built with chained setters.

use crate::error::{Result, SpaceError};

/// Default number of sequences per sequence-list batch.
pub const DEFAULT_MAX_SEQUENCES: usize = 1024;

/// Default byte budget per sequence-list batch.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Default size of the intermediate buffer used by [`Strategy::Buffered`].
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// How bytes travel between the two sides of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Pair file and memory sequences directly, one move per overlap.
    #[default]
    Zipper,
    /// Pack through a bounded intermediate buffer using the conversion
    /// path's gather and scatter functions.
    Buffered,
}

/// Transfer properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferProps {
    /// Sequences per batch pulled from each side.
    pub max_sequences: usize,
    /// Bytes per batch pulled from each side.
    pub max_bytes: usize,
    /// Intermediate buffer size for [`Strategy::Buffered`].
    pub buffer_size: usize,
    pub strategy: Strategy,
    /// Allow the single-move fast path when both sides are contiguous.
    pub direct: bool,
}

impl Default for TransferProps {
    fn default() -> Self {
        Self {
            max_sequences: DEFAULT_MAX_SEQUENCES,
            max_bytes: DEFAULT_MAX_BYTES,
            buffer_size: DEFAULT_BUFFER_SIZE,
            strategy: Strategy::Zipper,
            direct: true,
        }
    }
}

impl TransferProps {
    /// Create default transfer properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sequence count per batch.
    pub fn max_sequences(mut self, n: usize) -> Self {
        self.max_sequences = n;
        self
    }

    /// Set the byte budget per batch.
    pub fn max_bytes(mut self, n: usize) -> Self {
        self.max_bytes = n;
        self
    }

    /// Set the intermediate buffer size.
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    /// Pick how non-contiguous transfers are carried out.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enable or disable the direct fast path.
    pub fn direct(mut self, enabled: bool) -> Self {
        self.direct = enabled;
        self
    }

    /// Reject settings no transfer can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_sequences == 0 {
            return Err(SpaceError::argument("max_sequences must be non-zero"));
        }
        if self.max_bytes == 0 {
            return Err(SpaceError::argument("max_bytes must be non-zero"));
        }
        if self.buffer_size == 0 {
            return Err(SpaceError::argument("buffer_size must be non-zero"));
        }
        Ok(())
    }

    /// Batch byte budget for elements of `elem_size`, never below one element.
    pub(crate) fn batch_bytes(&self, elem_size: usize) -> usize {
        self.max_bytes.max(elem_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = TransferProps::new();
        assert_eq!(p.max_sequences, 1024);
        assert_eq!(p.max_bytes, 1 << 20);
        assert_eq!(p.buffer_size, 1 << 20);
        assert_eq!(p.strategy, Strategy::Zipper);
        assert!(p.direct);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn builder_chain() {
        let p = TransferProps::new()
            .max_sequences(4)
            .max_bytes(64)
            .buffer_size(128)
            .strategy(Strategy::Buffered)
            .direct(false);
        assert_eq!(p.max_sequences, 4);
        assert_eq!(p.max_bytes, 64);
        assert_eq!(p.buffer_size, 128);
        assert_eq!(p.strategy, Strategy::Buffered);
        assert!(!p.direct);
        assert_eq!(p.batch_bytes(100), 100);
    }

    #[test]
    fn validate_rejects_zeros() {
        assert!(TransferProps::new().max_sequences(0).validate().is_err());
        assert!(TransferProps::new().max_bytes(0).validate().is_err());
        assert!(TransferProps::new().buffer_size(0).validate().is_err());
    }
}
