//! The skeleton container itself: three [`crate::store::TierStore`]s (atoms, links, faces), the
//! topology manager (C3) that keeps their built-in adjacency fields consistent, and the bulk
//! filter engine (C4).

mod elements;
mod filter;
mod topology;

pub use elements::{Atom, AtomLinkIncidence, AtomFaceIncidence, Face, Link, LinkFaceIncidence};

use crate::config::SkeletonConfig;
use crate::error::Result;
use crate::handle::{AtomHandle, FaceHandle, LinkHandle};
use crate::property::PropertyRegistry;
use crate::store::TierStore;

/// The medial-skeleton core: atoms, links, and faces, plus the invariants that tie them
/// together. This is the type every geometry pipeline (atomizer, structurer, regularizer) and
/// every persistence codec is built against.
pub struct Skeleton {
    pub(crate) atoms: TierStore<crate::handle::AtomTier, Atom>,
    pub(crate) links: TierStore<crate::handle::LinkTier, Link>,
    pub(crate) faces: TierStore<crate::handle::FaceTier, Face>,
}

impl Skeleton {
    pub fn new(config: SkeletonConfig) -> Self {
        Self {
            atoms: TierStore::new(config.atoms),
            links: TierStore::new(config.links),
            faces: TierStore::new(config.faces),
        }
    }

    pub fn with_capacities(atoms: usize, links: usize, faces: usize) -> Self {
        Self::new(SkeletonConfig::new(atoms, links, faces))
    }

    /// Reset every tier to empty, then reserve capacities for whatever is about to be loaded.
    pub fn clear(&mut self, config: SkeletonConfig) {
        self.atoms.clear(config.atoms);
        self.links.clear(config.links);
        self.faces.clear(config.faces);
    }

    pub fn reserve_atoms(&mut self, capacity: usize) -> Result<()> {
        self.atoms.reserve(capacity)
    }

    pub fn reserve_links(&mut self, capacity: usize) -> Result<()> {
        self.links.reserve(capacity)
    }

    pub fn reserve_faces(&mut self, capacity: usize) -> Result<()> {
        self.faces.reserve(capacity)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.size()
    }

    pub fn link_count(&self) -> usize {
        self.links.size()
    }

    pub fn face_count(&self) -> usize {
        self.faces.size()
    }

    // ---- element access --------------------------------------------------------------

    pub fn atom(&self, handle: AtomHandle) -> Result<&Atom> {
        self.atoms.get(handle)
    }

    pub fn atom_mut(&mut self, handle: AtomHandle) -> Result<&mut Atom> {
        self.atoms.get_mut(handle)
    }

    pub fn link(&self, handle: LinkHandle) -> Result<&Link> {
        self.links.get(handle)
    }

    pub fn link_mut(&mut self, handle: LinkHandle) -> Result<&mut Link> {
        self.links.get_mut(handle)
    }

    pub fn face(&self, handle: FaceHandle) -> Result<&Face> {
        self.faces.get(handle)
    }

    pub fn is_atom_valid(&self, handle: AtomHandle) -> bool {
        self.atoms.is_valid(handle)
    }

    pub fn is_link_valid(&self, handle: LinkHandle) -> bool {
        self.links.is_valid(handle)
    }

    pub fn is_face_valid(&self, handle: FaceHandle) -> bool {
        self.faces.is_valid(handle)
    }

    pub fn atom_handle_at(&self, index: usize) -> Result<AtomHandle> {
        self.atoms.handle_at(index)
    }

    pub fn link_handle_at(&self, index: usize) -> Result<LinkHandle> {
        self.links.handle_at(index)
    }

    pub fn face_handle_at(&self, index: usize) -> Result<FaceHandle> {
        self.faces.handle_at(index)
    }

    pub fn atom_index_of(&self, handle: AtomHandle) -> Result<usize> {
        self.atoms.index_of(handle)
    }

    pub fn link_index_of(&self, handle: LinkHandle) -> Result<usize> {
        self.links.index_of(handle)
    }

    pub fn face_index_of(&self, handle: FaceHandle) -> Result<usize> {
        self.faces.index_of(handle)
    }

    // ---- property tables --------------------------------------------------------------

    pub fn add_atom_property<T: Default + Send + Sync + 'static>(&mut self, name: &str) -> usize {
        self.atoms.properties_mut().add::<T>(name, self.atoms.size())
    }

    pub fn add_link_property<T: Default + Send + Sync + 'static>(&mut self, name: &str) -> usize {
        self.links.properties_mut().add::<T>(name, self.links.size())
    }

    pub fn add_face_property<T: Default + Send + Sync + 'static>(&mut self, name: &str) -> usize {
        self.faces.properties_mut().add::<T>(name, self.faces.size())
    }

    pub fn atom_properties(&self) -> &PropertyRegistry {
        self.atoms.properties()
    }

    pub fn atom_properties_mut(&mut self) -> &mut PropertyRegistry {
        self.atoms.properties_mut()
    }

    pub fn link_properties(&self) -> &PropertyRegistry {
        self.links.properties()
    }

    pub fn link_properties_mut(&mut self) -> &mut PropertyRegistry {
        self.links.properties_mut()
    }

    pub fn face_properties(&self) -> &PropertyRegistry {
        self.faces.properties()
    }

    pub fn face_properties_mut(&mut self) -> &mut PropertyRegistry {
        self.faces.properties_mut()
    }

    // ---- iteration ----------------------------------------------------------------------

    pub fn process_atoms<F: Fn(&Atom) + Sync>(&self, f: F, parallel: bool) {
        if parallel {
            use rayon::prelude::*;
            self.atoms.elements().par_iter().for_each(f);
        } else {
            self.atoms.elements().iter().for_each(f);
        }
    }

    pub fn process_atoms_mut<F: FnMut(&mut Atom)>(&mut self, mut f: F) {
        for atom in self.atoms.elements_mut() {
            f(atom);
        }
    }

    pub fn process_links<F: Fn(&Link) + Sync>(&self, f: F, parallel: bool) {
        if parallel {
            use rayon::prelude::*;
            self.links.elements().par_iter().for_each(f);
        } else {
            self.links.elements().iter().for_each(f);
        }
    }

    pub fn process_faces<F: Fn(&Face) + Sync>(&self, f: F, parallel: bool) {
        if parallel {
            use rayon::prelude::*;
            self.faces.elements().par_iter().for_each(f);
        } else {
            self.faces.elements().iter().for_each(f);
        }
    }

    // ---- index-based bulk construction (C6) ---------------------------------------------

    /// Insert an atom and return its packed index, for hot write loops that don't need the
    /// handle back.
    pub fn add_atom_indexed(&mut self, ball: [f64; 4]) -> Result<usize> {
        let (_, index) = self.add_atom_ex(ball[0], ball[1], ball[2], ball[3])?;
        Ok(index)
    }

    pub fn add_link_indexed(&mut self, a: usize, b: usize) -> Result<usize> {
        let ha = self.atoms.handle_at(a)?;
        let hb = self.atoms.handle_at(b)?;
        let handle = self.add_link(ha, hb)?;
        self.links.index_of(handle)
    }

    pub fn add_face_indexed(&mut self, a: usize, b: usize, c: usize) -> Result<usize> {
        let ha = self.atoms.handle_at(a)?;
        let hb = self.atoms.handle_at(b)?;
        let hc = self.atoms.handle_at(c)?;
        let handle = self.add_face(ha, hb, hc)?;
        self.faces.index_of(handle)
    }

    // ---- persistence (C5) -----------------------------------------------------------------

    /// Replace this skeleton's contents with whatever `path` decodes to, dispatched by
    /// extension through the process-wide default [`crate::codec::CodecRegistry`].
    pub fn load(&mut self, path: impl AsRef<std::path::Path>) -> Result<()> {
        crate::codec::load(self, path)
    }

    /// Write this skeleton to `path`, dispatched by extension through the process-wide default
    /// [`crate::codec::CodecRegistry`].
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        crate::codec::save(self, path)
    }
}
