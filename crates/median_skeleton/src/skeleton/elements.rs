//! The three packed element types. Required built-in adjacency (`atom_links`, `atom_faces`,
//! `link_faces`) lives directly on these structs rather than behind the dynamic property
//! registry: its schema is fixed by the topology manager, not chosen by a caller, so there is
//! nothing to gain from type erasure here. User-defined properties go through
//! [`crate::property::PropertyRegistry`] instead.

use smallvec::SmallVec;

use crate::handle::{AtomHandle, FaceHandle, LinkHandle};

/// One entry in an atom's adjacency list: a link incident to the atom, and the atom at the
/// link's other endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AtomLinkIncidence {
    pub link: LinkHandle,
    pub other: AtomHandle,
}

/// One entry in an atom's face-incidence list.
#[derive(Debug, Clone, Copy)]
pub struct AtomFaceIncidence {
    pub face: FaceHandle,
    pub others: [AtomHandle; 2],
    pub links: [LinkHandle; 3],
    /// This atom's position (0, 1, or 2) among the face's vertex triple.
    pub position: u8,
}

/// One entry in a link's face-incidence list.
#[derive(Debug, Clone, Copy)]
pub struct LinkFaceIncidence {
    pub face: FaceHandle,
    pub opposite: AtomHandle,
    pub others: [LinkHandle; 2],
    /// This link's position (0, 1, or 2) among the face's edge triple.
    pub position: u8,
}

/// A maximally inscribed ball: a 4-tuple (x, y, z, r).
#[derive(Debug, Clone, Default)]
pub struct Atom {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
    pub(crate) links: SmallVec<[AtomLinkIncidence; 6]>,
    pub(crate) faces: SmallVec<[AtomFaceIncidence; 6]>,
}

impl Atom {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self {
            x,
            y,
            z,
            r,
            links: SmallVec::new(),
            faces: SmallVec::new(),
        }
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn ball(&self) -> [f64; 4] {
        [self.x, self.y, self.z, self.r]
    }

    /// Links incident to this atom, each paired with the atom at the other end.
    pub fn atom_links(&self) -> &[AtomLinkIncidence] {
        &self.links
    }

    /// Faces incident to this atom.
    pub fn atom_faces(&self) -> &[AtomFaceIncidence] {
        &self.faces
    }

    /// Whether this ball intersects `other`: the distance between centers is at most the sum
    /// of the two radii.
    pub fn intersects(&self, other: &Atom) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        let d2 = dx * dx + dy * dy + dz * dz;
        let rsum = self.r + other.r;
        d2 <= rsum * rsum
    }
}

/// An unordered pair of atom handles, with the faces incident to this edge.
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) a: AtomHandle,
    pub(crate) b: AtomHandle,
    pub(crate) faces: SmallVec<[LinkFaceIncidence; 4]>,
}

impl Default for Link {
    fn default() -> Self {
        // Never observed by callers: `TierStore::create` always overwrites this immediately
        // with real endpoints before the handle escapes `add_link`/`add_face`.
        Self {
            a: AtomHandle::pack(0, 0),
            b: AtomHandle::pack(0, 0),
            faces: SmallVec::new(),
        }
    }
}

impl Link {
    pub fn endpoints(&self) -> (AtomHandle, AtomHandle) {
        (self.a, self.b)
    }

    /// The atom at the other end of this link from `from`. `None` if `from` is not one of the
    /// two endpoints.
    pub fn other(&self, from: AtomHandle) -> Option<AtomHandle> {
        if self.a == from {
            Some(self.b)
        } else if self.b == from {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn link_faces(&self) -> &[LinkFaceIncidence] {
        &self.faces
    }
}

/// A triangle: three atom handles and the three link handles forming its edges.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub(crate) atoms: [AtomHandle; 3],
    pub(crate) links: [LinkHandle; 3],
}

impl Default for Face {
    fn default() -> Self {
        Self {
            atoms: [AtomHandle::pack(0, 0); 3],
            links: [LinkHandle::pack(0, 0); 3],
        }
    }
}

impl Face {
    pub fn atoms(&self) -> [AtomHandle; 3] {
        self.atoms
    }

    pub fn links(&self) -> [LinkHandle; 3] {
        self.links
    }
}
