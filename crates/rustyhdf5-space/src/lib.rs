//! Dataspaces and selections for HDF5-style N-dimensional arrays.
//!
//! A [`Dataspace`] pairs an [`Extent`] with a selection of its elements:
//! none, all, an ordered point list or a union of rectangular blocks. A
//! [`SelectionIter`] walks a selection as runs of contiguous bytes, and the
//! [`TransferEngine`] uses two iterators to move elements between a
//! [`ByteStore`] and a memory buffer.
//!
//! ```
//! use rustyhdf5_space::{Dataspace, SelectOp};
//!
//! let mut space = Dataspace::simple(&[10, 10]).unwrap();
//! space
//!     .select_hyperslab(SelectOp::Set, &[0, 0], Some(&[2, 2]), &[5, 5], None)
//!     .unwrap();
//! assert_eq!(space.num_elem(), 25);
//! ```

pub mod codec;
pub mod dataspace;
pub mod error;
pub mod extent;
pub mod hyperslab;
pub mod iter;
pub mod path;
pub mod plist;
pub mod points;
pub mod profiling;
pub mod registry;
pub mod selection;
pub mod seq;
pub mod store;
pub mod transfer;

pub use dataspace::{Dataspace, PointOp};
pub use error::{ErrorCategory, Result, SpaceError, TransferError};
pub use extent::{Extent, ExtentClass, MAX_RANK, UNLIMITED};
pub use hyperslab::{HyperDim, Hyperslab, Node, RegionList, RegularHyperslab, SelectOp};
pub use iter::SelectionIter;
pub use path::{Path, PathCache};
pub use plist::{Strategy, TransferProps};
pub use points::PointList;
pub use profiling::{DefaultProfiler, TransferProfiler};
pub use registry::{Handle, Registry, SpaceRegistry};
pub use selection::{Selection, SelectionKind};
pub use seq::{SeqList, Sequence};
pub use store::ByteStore;
pub use transfer::{fill, gather, scatter, shape_same, Direction, TransferEngine, TransferIo};
