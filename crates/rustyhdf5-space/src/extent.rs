//! Dataspace extents: the logical shape a selection lives in.
//!
//! An [`Extent`] also knows how to read and write itself in the HDF5
//! dataspace message layout (message type 0x0001), which is what
//! [`Dataspace::encode`](crate::Dataspace::encode) embeds.

use crate::error::{Result, SpaceError};

/// Largest supported rank.
pub const MAX_RANK: usize = 32;

/// Marks an unlimited dimension in `max_dims`.
pub const UNLIMITED: u64 = u64::MAX;

/// Class of an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtentClass {
    /// No elements at all.
    Null,
    /// A single element, rank 0.
    Scalar,
    /// N-dimensional array.
    Simple,
}

/// Shape of the logical array a selection is defined over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    class: ExtentClass,
    dims: Vec<u64>,
    /// `None` means fixed size equal to `dims`.
    max_dims: Option<Vec<u64>>,
}

impl Default for Extent {
    fn default() -> Self {
        Extent::scalar()
    }
}

impl Extent {
    /// Extent with no elements.
    pub fn null() -> Self {
        Extent {
            class: ExtentClass::Null,
            dims: Vec::new(),
            max_dims: None,
        }
    }

    /// Single-element extent of rank 0.
    pub fn scalar() -> Self {
        Extent {
            class: ExtentClass::Scalar,
            dims: Vec::new(),
            max_dims: None,
        }
    }

    /// Fixed-size N-dimensional extent.
    pub fn simple(dims: &[u64]) -> Result<Self> {
        Self::build(dims, None)
    }

    /// N-dimensional extent with maximum sizes; use [`UNLIMITED`] for
    /// dimensions that may grow without bound.
    pub fn simple_with_max(dims: &[u64], max_dims: &[u64]) -> Result<Self> {
        Self::build(dims, Some(max_dims))
    }

    fn build(dims: &[u64], max_dims: Option<&[u64]>) -> Result<Self> {
        if dims.is_empty() || dims.len() > MAX_RANK {
            return Err(SpaceError::argument(format!(
                "simple extent rank must be 1..={MAX_RANK}, got {}",
                dims.len()
            )));
        }
        if let Some(max) = max_dims {
            if max.len() != dims.len() {
                return Err(SpaceError::RankMismatch {
                    expected: dims.len(),
                    got: max.len(),
                });
            }
        }
        let mut total: u64 = 1;
        for (i, &d) in dims.iter().enumerate() {
            let max = max_dims.map_or(d, |m| m[i]);
            if d == 0 && max != UNLIMITED {
                return Err(SpaceError::argument(format!(
                    "dimension {i} has zero size and is not unlimited"
                )));
            }
            if max < d {
                return Err(SpaceError::argument(format!(
                    "dimension {i}: maximum {max} is smaller than current size {d}"
                )));
            }
            total = total.checked_mul(d).ok_or_else(|| {
                SpaceError::argument("extent element count overflows u64")
            })?;
        }
        Ok(Extent {
            class: ExtentClass::Simple,
            dims: dims.to_vec(),
            max_dims: max_dims.map(|m| m.to_vec()),
        })
    }

    /// Null, scalar or simple.
    pub fn class(&self) -> ExtentClass {
        self.class
    }

    /// Number of dimensions; 0 for null and scalar extents.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Current size of each dimension.
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Explicit maximum sizes, if any were given.
    pub fn max_dims(&self) -> Option<&[u64]> {
        self.max_dims.as_deref()
    }

    /// Maximum size of dimension `i` (the current size for fixed extents).
    pub fn max_dim(&self, i: usize) -> u64 {
        match &self.max_dims {
            Some(m) => m[i],
            None => self.dims[i],
        }
    }

    /// Can dimension `i` grow without bound?
    pub fn is_unlimited(&self, i: usize) -> bool {
        self.max_dim(i) == UNLIMITED
    }

    /// True for simple extents (rank 1 or more).
    pub fn is_simple(&self) -> bool {
        self.class == ExtentClass::Simple
    }

    /// Total number of elements. Scalar = 1, Null = 0.
    pub fn num_elements(&self) -> u64 {
        match self.class {
            ExtentClass::Null => 0,
            ExtentClass::Scalar => 1,
            ExtentClass::Simple => self.dims.iter().product(),
        }
    }

    /// Grow dimensions in place. Shrinking, or growing past the maximum,
    /// is rejected and leaves the extent untouched.
    pub fn extend(&mut self, new_dims: &[u64]) -> Result<()> {
        self.check_simple_rank(new_dims)?;
        for (i, (&cur, &new)) in self.dims.iter().zip(new_dims).enumerate() {
            if new < cur {
                return Err(SpaceError::bounds(format!(
                    "extend cannot shrink dimension {i} from {cur} to {new}"
                )));
            }
            let max = self.max_dim(i);
            if new > max {
                return Err(SpaceError::bounds(format!(
                    "dimension {i}: {new} exceeds maximum {max}"
                )));
            }
        }
        self.dims.copy_from_slice(new_dims);
        Ok(())
    }

    /// Replace the current dimensions, keeping maximum sizes when present.
    /// Fixed-size extents take `new_dims` as their new fixed size.
    pub(crate) fn resize(&mut self, new_dims: &[u64]) -> Result<()> {
        self.check_simple_rank(new_dims)?;
        let rebuilt = Self::build(new_dims, self.max_dims.as_deref())?;
        *self = rebuilt;
        Ok(())
    }

    fn check_simple_rank(&self, new_dims: &[u64]) -> Result<()> {
        if self.class != ExtentClass::Simple {
            return Err(SpaceError::unsupported("only simple extents can change size"));
        }
        if new_dims.len() != self.rank() {
            return Err(SpaceError::RankMismatch {
                expected: self.rank(),
                got: new_dims.len(),
            });
        }
        Ok(())
    }

    /// Row-major element strides: `strides[d]` is the distance between
    /// neighbouring elements along dimension `d`.
    pub fn strides(&self) -> Vec<u64> {
        let mut strides = vec![1u64; self.rank()];
        for d in (0..self.rank().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.dims[d + 1];
        }
        strides
    }

    /// Row-major index of in-bounds coordinates.
    pub fn linear_index(&self, coords: &[u64]) -> u64 {
        debug_assert_eq!(coords.len(), self.rank());
        coords
            .iter()
            .zip(&self.dims)
            .fold(0u64, |acc, (&c, &d)| acc * d + c)
    }

    /// Inverse of [`linear_index`](Self::linear_index).
    pub fn unravel(&self, mut index: u64) -> Vec<u64> {
        let mut coords = vec![0u64; self.rank()];
        for d in (0..self.rank()).rev() {
            let size = self.dims[d].max(1);
            coords[d] = index % size;
            index /= size;
        }
        coords
    }

    /// Parse a dataspace message from raw message bytes.
    ///
    /// `length_size` is the width of each dimension value.
    pub fn parse(data: &[u8], length_size: u8) -> Result<Extent> {
        ensure_len(data, 0, 4)?;

        let version = data[0];
        let rank = data[1];
        let flags = data[2];

        let (class, header_size) = match version {
            1 => {
                // byte 3 and the following 4 bytes are reserved
                ensure_len(data, 0, 8)?;
                let class = if rank == 0 {
                    ExtentClass::Scalar
                } else {
                    ExtentClass::Simple
                };
                (class, 8usize)
            }
            2 => {
                let class = match data[3] {
                    0 => ExtentClass::Scalar,
                    1 => ExtentClass::Simple,
                    2 => ExtentClass::Null,
                    other => return Err(SpaceError::InvalidDataspaceType(other)),
                };
                (class, 4usize)
            }
            _ => return Err(SpaceError::InvalidDataspaceVersion(version)),
        };

        match class {
            ExtentClass::Scalar => return Ok(Extent::scalar()),
            ExtentClass::Null => return Ok(Extent::null()),
            ExtentClass::Simple => {}
        }

        let ls = length_size as usize;
        let mut pos = header_size;

        let mut dims = Vec::with_capacity(rank as usize);
        for _ in 0..rank {
            dims.push(read_length(data, pos, length_size)?);
            pos += ls;
        }

        if flags & 0x01 != 0 {
            let mut max_dims = Vec::with_capacity(rank as usize);
            for _ in 0..rank {
                max_dims.push(read_length(data, pos, length_size)?);
                pos += ls;
            }
            Extent::simple_with_max(&dims, &max_dims)
        } else {
            Extent::simple(&dims)
        }
    }

    /// Serialize to HDF5 dataspace message bytes (version 2).
    pub fn serialize(&self, length_size: u8) -> Result<Vec<u8>> {
        if !matches!(length_size, 2 | 4 | 8) {
            return Err(SpaceError::InvalidLengthSize(length_size));
        }
        let mut buf = Vec::with_capacity(4 + 2 * self.rank() * length_size as usize);
        buf.push(2);
        buf.push(self.rank() as u8);
        buf.push(if self.max_dims.is_some() { 0x01 } else { 0x00 });
        buf.push(match self.class {
            ExtentClass::Scalar => 0,
            ExtentClass::Simple => 1,
            ExtentClass::Null => 2,
        });
        for &dim in &self.dims {
            write_length(&mut buf, dim, length_size)?;
        }
        if let Some(max_dims) = &self.max_dims {
            for &md in max_dims {
                // unlimited is all-ones at every width
                let md = if md == UNLIMITED { u64::MAX } else { md };
                write_length(&mut buf, md, length_size)?;
            }
        }
        Ok(buf)
    }
}

pub(crate) fn ensure_len(data: &[u8], offset: usize, needed: usize) -> Result<()> {
    if offset + needed > data.len() {
        Err(SpaceError::UnexpectedEof {
            expected: offset + needed,
            available: data.len(),
        })
    } else {
        Ok(())
    }
}

fn read_length(data: &[u8], offset: usize, length_size: u8) -> Result<u64> {
    let s = length_size as usize;
    ensure_len(data, offset, s)?;
    let slice = &data[offset..offset + s];
    Ok(match length_size {
        2 => match u16::from_le_bytes([slice[0], slice[1]]) {
            u16::MAX => UNLIMITED,
            v => v as u64,
        },
        4 => match u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]) {
            u32::MAX => UNLIMITED,
            v => v as u64,
        },
        8 => u64::from_le_bytes([
            slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
        ]),
        _ => return Err(SpaceError::InvalidLengthSize(length_size)),
    })
}

fn write_length(buf: &mut Vec<u8>, val: u64, size: u8) -> Result<()> {
    let too_wide = || SpaceError::bounds(format!("value {val} does not fit in {size} bytes"));
    match size {
        2 => {
            let v = if val == UNLIMITED { u16::MAX } else { u16::try_from(val).map_err(|_| too_wide())? };
            buf.extend_from_slice(&v.to_le_bytes());
        }
        4 => {
            let v = if val == UNLIMITED { u32::MAX } else { u32::try_from(val).map_err(|_| too_wide())? };
            buf.extend_from_slice(&v.to_le_bytes());
        }
        8 => buf.extend_from_slice(&val.to_le_bytes()),
        _ => return Err(SpaceError::InvalidLengthSize(size)),
    }
    Ok(())
}
