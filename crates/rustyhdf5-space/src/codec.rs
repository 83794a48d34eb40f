//! Binary encodings of selections and dataspaces.
//!
//! Selections use the version 1 layout of HDF5 region references: five
//! little-endian `u32` header words `kind, version, reserved, length, rank`,
//! where `length` counts the payload bytes after the header, followed by
//! the kind's payload. All and None have no payload. Offsets are not encoded.
//!
//! A whole dataspace is `tag, version, length_size` (one byte each), the
//! extent message length as a `u32`, the extent message, then the selection.

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::dataspace::Dataspace;
use crate::error::{Result, SpaceError};
use crate::extent::{ensure_len, Extent};
use crate::hyperslab::{Hyperslab, Node, RegionList};
use crate::points::PointList;
use crate::selection::{Selection, SelectionKind};

/// Selection encoding version.
pub const SELECTION_VERSION: u32 = 1;

const HEADER_LEN: usize = 20;

/// First byte of an encoded dataspace.
pub const DATASPACE_TAG: u8 = 1;

/// Encoded dataspace version.
pub const DATASPACE_VERSION: u8 = 0;

/// Width of lengths in the embedded extent message.
const LENGTH_SIZE: u8 = 8;

impl Dataspace {
    /// Encode the selection (without offset).
    pub fn serialize_selection(&self) -> Result<Vec<u8>> {
        let kind = self.selection_kind();
        let rank = to_u32(self.rank() as u64, "rank")?;
        let mut words: Vec<u32> = vec![kind as u32, SELECTION_VERSION, 0, 0, rank];
        match self.selection() {
            Selection::None | Selection::All => {}
            Selection::Points(p) => {
                words.push(to_u32(p.len() as u64, "point count")?);
                words.try_reserve(p.len() * p.rank())?;
                for pt in p.iter() {
                    for &c in pt {
                        words.push(coord_u32(c)?);
                    }
                }
            }
            Selection::Hyperslab(h) => {
                let blocks = h.blocks()?;
                words.push(to_u32(blocks.len() as u64, "block count")?);
                words.try_reserve(blocks.len() * 2 * h.rank())?;
                for b in &blocks {
                    for &c in &b.start {
                        words.push(coord_u32(c)?);
                    }
                    for &c in &b.end {
                        words.push(coord_u32(c)?);
                    }
                }
            }
        }
        words[3] = to_u32(((words.len() - HEADER_LEN / 4) * 4) as u64, "encoded length")?;
        let mut out = vec![0u8; words.len() * 4];
        LittleEndian::write_u32_into(&words, &mut out);
        Ok(out)
    }

    /// Replace the selection with one decoded from `data`. Returns the
    /// number of bytes consumed. The dataspace is unchanged on error.
    pub fn deserialize_selection(&mut self, data: &[u8]) -> Result<usize> {
        let (selection, used) = decode_selection(data, self.rank())?;
        debug!(kind = ?selection.kind(), bytes = used, "selection decoded");
        *self = Dataspace::from_parts(self.extent().clone(), selection);
        Ok(used)
    }

    /// Encode extent and selection together.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let extent = self.extent().serialize(LENGTH_SIZE)?;
        let selection = self.serialize_selection()?;
        let mut out = Vec::with_capacity(7 + extent.len() + selection.len());
        out.extend_from_slice(&[DATASPACE_TAG, DATASPACE_VERSION, LENGTH_SIZE]);
        let mut len = [0u8; 4];
        LittleEndian::write_u32(&mut len, to_u32(extent.len() as u64, "extent length")?);
        out.extend_from_slice(&len);
        out.extend_from_slice(&extent);
        out.extend_from_slice(&selection);
        Ok(out)
    }

    /// Decode a dataspace written by [`encode`](Self::encode).
    pub fn decode(data: &[u8]) -> Result<Dataspace> {
        ensure_len(data, 0, 7)?;
        if data[0] != DATASPACE_TAG {
            return Err(SpaceError::argument(format!(
                "not an encoded dataspace (tag {})",
                data[0]
            )));
        }
        if data[1] != DATASPACE_VERSION {
            return Err(SpaceError::UnsupportedVersion(u32::from(data[1])));
        }
        let length_size = data[2];
        let extent_len = LittleEndian::read_u32(&data[3..7]) as usize;
        ensure_len(data, 7, extent_len)?;
        let extent = Extent::parse(&data[7..7 + extent_len], length_size)?;
        let mut space = Dataspace::new(extent);
        space.deserialize_selection(&data[7 + extent_len..])?;
        Ok(space)
    }
}

fn decode_selection(data: &[u8], rank: usize) -> Result<(Selection, usize)> {
    ensure_len(data, 0, HEADER_LEN)?;
    let mut header = [0u32; 5];
    LittleEndian::read_u32_into(&data[..HEADER_LEN], &mut header);
    let [tag, version, _reserved, length, got] = header;
    let kind = SelectionKind::from_u32(tag).ok_or(SpaceError::UnknownSelectionKind(tag))?;
    if version != SELECTION_VERSION {
        return Err(SpaceError::UnsupportedVersion(version));
    }
    let got = got as usize;
    if got != rank {
        return Err(SpaceError::RankMismatch {
            expected: rank,
            got,
        });
    }
    let length = length as usize;
    ensure_len(data, HEADER_LEN, length)?;
    let body = &data[HEADER_LEN..HEADER_LEN + length];
    let used = HEADER_LEN + length;
    let selection = match kind {
        SelectionKind::None | SelectionKind::All if length != 0 => {
            return Err(SpaceError::argument(format!(
                "{kind:?} selection carries {length} payload bytes"
            )));
        }
        SelectionKind::None => Selection::None,
        SelectionKind::All => Selection::All,
        SelectionKind::Points => {
            let (n, coords) = read_body(body, rank, 1)?;
            if n == 0 {
                return Err(SpaceError::argument("encoded point list is empty"));
            }
            Selection::Points(PointList::from_flat(rank, coords))
        }
        SelectionKind::Hyperslab => {
            let (n, coords) = read_body(body, rank, 2)?;
            let mut list = RegionList::new(rank);
            for block in coords.chunks_exact(2 * rank) {
                let (start, end) = block.split_at(rank);
                if start.iter().zip(end).any(|(s, e)| s > e) {
                    return Err(SpaceError::argument("encoded block ends before it starts"));
                }
                list.add(Node::new(start.to_vec(), end.to_vec()));
            }
            if n == 0 || list.is_empty() {
                Selection::None
            } else {
                Selection::Hyperslab(Hyperslab::Irregular(list))
            }
        }
    };
    Ok((selection, used))
}

/// Read `n` and `n * per * rank` coordinates; checks that the body is
/// exactly that long.
fn read_body(body: &[u8], rank: usize, per: usize) -> Result<(usize, Vec<i64>)> {
    if rank == 0 {
        return Err(SpaceError::argument("coordinate selection on a rank-0 extent"));
    }
    ensure_len(body, 0, 4)?;
    let n = LittleEndian::read_u32(&body[0..4]) as usize;
    let words = n
        .checked_mul(per * rank)
        .ok_or_else(|| SpaceError::argument("encoded coordinate count overflows"))?;
    let expected = words
        .checked_mul(4)
        .and_then(|b| b.checked_add(4))
        .ok_or_else(|| SpaceError::argument("encoded coordinate count overflows"))?;
    if body.len() != expected {
        return Err(SpaceError::argument(format!(
            "length field says {} bytes, payload needs {expected}",
            body.len()
        )));
    }
    let mut raw = vec![0u32; words];
    LittleEndian::read_u32_into(&body[4..], &mut raw);
    Ok((n, raw.into_iter().map(i64::from).collect()))
}

fn to_u32(v: u64, what: &str) -> Result<u32> {
    u32::try_from(v).map_err(|_| SpaceError::bounds(format!("{what} {v} does not fit in 32 bits")))
}

fn coord_u32(c: i64) -> Result<u32> {
    u32::try_from(c).map_err(|_| SpaceError::bounds(format!("coordinate {c} is outside 0..=u32::MAX")))
}
