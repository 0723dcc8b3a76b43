//! A packed-vector, generational-handle medial skeleton: atoms (balls), links (edges), and faces
//! (triangles), with a bulk parallel filter/remove engine and a pluggable file-format codec.
//!
//! The three tiers are independent packed vectors (see [`store::TierStore`]) addressed through
//! [`handle::Handle`]s rather than raw indices, so a handle into a removed-and-reused slot is
//! detectable instead of silently resolving to the wrong element. [`skeleton::Skeleton`] ties the
//! tiers together with the adjacency invariants described in its module docs, and [`codec`]
//! reads and writes it to disk in four formats.

pub mod codec;
pub mod config;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod property;
pub mod skeleton;
pub mod store;

pub use config::SkeletonConfig;
pub use error::{Error, Result};
pub use geometry::BoundingBox;
pub use handle::{AtomHandle, FaceHandle, LinkHandle};
pub use skeleton::{Atom, Face, Link, Skeleton};
