//! Topology manager (C3): keeps atom<->link, atom<->face, and link<->face adjacency
//! consistent across `add_*`/`remove_*`, including cascade deletion and auto-creation of
//! missing edges when a face is added.

use smallvec::SmallVec;

use super::elements::{Atom, AtomFaceIncidence, AtomLinkIncidence, Face, Link, LinkFaceIncidence};
use super::Skeleton;
use crate::error::Result;
use crate::handle::{AtomHandle, FaceHandle, LinkHandle};

fn pair_matches(pair: [AtomHandle; 2], b: AtomHandle, c: AtomHandle) -> bool {
    (pair[0] == b && pair[1] == c) || (pair[0] == c && pair[1] == b)
}

fn swap_remove_link_incidence(list: &mut SmallVec<[AtomLinkIncidence; 6]>, link: LinkHandle) {
    if let Some(pos) = list.iter().position(|e| e.link == link) {
        list.swap_remove(pos);
        if list.is_empty() {
            list.shrink_to_fit();
        }
    }
}

fn swap_remove_atom_face_incidence(list: &mut SmallVec<[AtomFaceIncidence; 6]>, face: FaceHandle) {
    if let Some(pos) = list.iter().position(|e| e.face == face) {
        list.swap_remove(pos);
        if list.is_empty() {
            list.shrink_to_fit();
        }
    }
}

fn swap_remove_link_face_incidence(list: &mut SmallVec<[LinkFaceIncidence; 4]>, face: FaceHandle) {
    if let Some(pos) = list.iter().position(|e| e.face == face) {
        list.swap_remove(pos);
        if list.is_empty() {
            list.shrink_to_fit();
        }
    }
}

impl Skeleton {
    pub fn add_atom(&mut self, ball: [f64; 4]) -> Result<AtomHandle> {
        Ok(self.add_atom_ex(ball[0], ball[1], ball[2], ball[3])?.0)
    }

    pub fn add_atom_xyzr(&mut self, x: f64, y: f64, z: f64, r: f64) -> Result<AtomHandle> {
        Ok(self.add_atom_ex(x, y, z, r)?.0)
    }

    pub(crate) fn add_atom_ex(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        r: f64,
    ) -> Result<(AtomHandle, usize)> {
        debug_assert!(r >= 0.0, "atom radius must be non-negative");
        self.atoms.create(Atom::new(x, y, z, r))
    }

    /// Add a link between two atoms, or return the existing one if `a` and `b` are already
    /// linked. `a` and `b` must be distinct, live atoms.
    pub fn add_link(&mut self, a: AtomHandle, b: AtomHandle) -> Result<LinkHandle> {
        debug_assert_ne!(a, b, "a link cannot join an atom to itself");
        self.atoms.get(a)?;
        self.atoms.get(b)?;
        if let Some(existing) = self
            .atoms
            .get(a)?
            .links
            .iter()
            .find(|inc| inc.other == b)
            .map(|inc| inc.link)
        {
            return Ok(existing);
        }
        let (handle, _) = self.links.create(Link {
            a,
            b,
            faces: SmallVec::new(),
        })?;
        self.atoms
            .get_mut(a)?
            .links
            .push(AtomLinkIncidence { link: handle, other: b });
        self.atoms
            .get_mut(b)?
            .links
            .push(AtomLinkIncidence { link: handle, other: a });
        Ok(handle)
    }

    /// Add a face spanning three atoms, auto-creating any of its three edges that don't
    /// already exist, or return the existing face if one already spans this vertex triple
    /// (checked as an unordered set, fixing the contradictory-conjunction dedup bug of the
    /// original implementation; see `DESIGN.md`).
    pub fn add_face(
        &mut self,
        a: AtomHandle,
        b: AtomHandle,
        c: AtomHandle,
    ) -> Result<FaceHandle> {
        debug_assert!(
            a != b && b != c && a != c,
            "face vertices must be pairwise distinct"
        );
        self.atoms.get(a)?;
        self.atoms.get(b)?;
        self.atoms.get(c)?;
        if let Some(existing) = self
            .atoms
            .get(a)?
            .faces
            .iter()
            .find(|inc| pair_matches(inc.others, b, c))
            .map(|inc| inc.face)
        {
            return Ok(existing);
        }

        let lab = self.add_link(a, b)?;
        let lbc = self.add_link(b, c)?;
        let lca = self.add_link(c, a)?;

        let (handle, _) = self.faces.create(Face {
            atoms: [a, b, c],
            links: [lab, lbc, lca],
        })?;

        self.atoms.get_mut(a)?.faces.push(AtomFaceIncidence {
            face: handle,
            others: [b, c],
            links: [lab, lbc, lca],
            position: 0,
        });
        self.atoms.get_mut(b)?.faces.push(AtomFaceIncidence {
            face: handle,
            others: [c, a],
            links: [lab, lbc, lca],
            position: 1,
        });
        self.atoms.get_mut(c)?.faces.push(AtomFaceIncidence {
            face: handle,
            others: [a, b],
            links: [lab, lbc, lca],
            position: 2,
        });

        self.links.get_mut(lab)?.faces.push(LinkFaceIncidence {
            face: handle,
            opposite: c,
            others: [lbc, lca],
            position: 0,
        });
        self.links.get_mut(lbc)?.faces.push(LinkFaceIncidence {
            face: handle,
            opposite: a,
            others: [lca, lab],
            position: 1,
        });
        self.links.get_mut(lca)?.faces.push(LinkFaceIncidence {
            face: handle,
            opposite: b,
            others: [lab, lbc],
            position: 2,
        });

        Ok(handle)
    }

    /// Remove a face: clears its incidence from the three atoms and three links it referenced.
    /// No cascade into links, which may legally survive without incident faces. A stale or
    /// invalid handle is a silent no-op.
    pub fn remove_face(&mut self, handle: FaceHandle) {
        self.destroy_face(handle);
    }

    /// Remove a link, cascading into any faces it is still part of. A stale or invalid handle
    /// is a silent no-op.
    pub fn remove_link(&mut self, handle: LinkHandle) {
        self.destroy_link(handle);
    }

    /// Remove an atom, cascading into every link and face it is part of. A stale or invalid
    /// handle is a silent no-op. Atoms with no incident links or faces are removed directly.
    pub fn remove_atom(&mut self, handle: AtomHandle) {
        let (faces, links) = match self.atoms.get(handle) {
            Ok(atom) => (atom.faces.clone(), atom.links.clone()),
            Err(_) => return,
        };
        for incidence in faces {
            self.destroy_face(incidence.face);
        }
        for incidence in links {
            self.destroy_link(incidence.link);
        }
        self.atoms.remove(handle);
    }

    fn destroy_face(&mut self, handle: FaceHandle) {
        let face = match self.faces.get(handle) {
            Ok(face) => *face,
            Err(_) => return,
        };
        self.strip_face_incidence(handle, &face);
        self.faces.remove(handle);
    }

    fn destroy_link(&mut self, handle: LinkHandle) {
        let (a, b, faces) = match self.links.get(handle) {
            Ok(link) => (link.a, link.b, link.faces.clone()),
            Err(_) => return,
        };
        for incidence in faces {
            self.destroy_face(incidence.face);
        }
        self.strip_link_incidence(handle, a, b);
        self.links.remove(handle);
    }

    /// Remove `handle`'s incidence entry from the three atoms and three links its face
    /// referenced, without touching the face tier itself. Shared by the element-wise
    /// `destroy_face` above and the bulk filter engine (`filter.rs`), which must clear these
    /// entries from every surviving atom/link before a flagged face is compacted away.
    pub(super) fn strip_face_incidence(&mut self, handle: FaceHandle, face: &Face) {
        for atom_handle in face.atoms {
            if let Ok(atom) = self.atoms.get_mut(atom_handle) {
                swap_remove_atom_face_incidence(&mut atom.faces, handle);
            }
        }
        for link_handle in face.links {
            if let Ok(link) = self.links.get_mut(link_handle) {
                swap_remove_link_face_incidence(&mut link.faces, handle);
            }
        }
    }

    /// Remove `handle`'s incidence entry from its two endpoint atoms, without touching the
    /// link tier itself. Shared by `destroy_link` above and the bulk filter engine, which must
    /// clear these entries from surviving atoms before a flagged link is compacted away.
    pub(super) fn strip_link_incidence(&mut self, handle: LinkHandle, a: AtomHandle, b: AtomHandle) {
        if let Ok(atom) = self.atoms.get_mut(a) {
            swap_remove_link_incidence(&mut atom.links, handle);
        }
        if let Ok(atom) = self.atoms.get_mut(b) {
            swap_remove_link_incidence(&mut atom.links, handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Skeleton as RootSkeleton;
    use pretty_assertions::assert_eq;

    fn triangle() -> (RootSkeleton, AtomHandle, AtomHandle, AtomHandle, FaceHandle) {
        let mut sk = RootSkeleton::with_capacities(0, 0, 0);
        let a0 = sk.add_atom([0.0, 0.0, 0.0, 1.0]).unwrap();
        let a1 = sk.add_atom([1.0, 0.0, 0.0, 1.0]).unwrap();
        let a2 = sk.add_atom([0.0, 1.0, 0.0, 1.0]).unwrap();
        let f = sk.add_face(a0, a1, a2).unwrap();
        (sk, a0, a1, a2, f)
    }

    #[test]
    fn scenario_a_triangle_construction() {
        let (sk, a0, a1, a2, _f) = triangle();
        assert_eq!(sk.atom_count(), 3);
        assert_eq!(sk.link_count(), 3);
        assert_eq!(sk.face_count(), 1);
        for a in [a0, a1, a2] {
            let atom = sk.atom(a).unwrap();
            assert_eq!(atom.atom_faces().len(), 1);
            assert_eq!(atom.atom_links().len(), 2);
        }
        for l in 0..sk.link_count() {
            let lh = sk.link_handle_at(l).unwrap();
            assert_eq!(sk.link(lh).unwrap().link_faces().len(), 1);
        }
    }

    #[test]
    fn scenario_b_face_auto_linking_is_idempotent() {
        let (mut sk, a0, a1, a2, f) = triangle();
        let f2 = sk.add_face(a0, a1, a2).unwrap();
        assert_eq!(f, f2);
        assert_eq!(sk.atom_count(), 3);
        assert_eq!(sk.link_count(), 3);
        assert_eq!(sk.face_count(), 1);
    }

    #[test]
    fn scenario_b_dedup_is_permutation_insensitive() {
        let (mut sk, a0, a1, a2, f) = triangle();
        let f2 = sk.add_face(a2, a0, a1).unwrap();
        assert_eq!(f, f2);
        assert_eq!(sk.face_count(), 1);
    }

    #[test]
    fn scenario_c_atom_removal_cascades() {
        let (mut sk, a0, a1, a2, f) = triangle();
        let link_a0_a1 = sk.add_link(a0, a1).unwrap();
        let link_a0_a2 = sk.add_link(a0, a2).unwrap();
        sk.remove_atom(a0);

        assert_eq!(sk.atom_count(), 2);
        assert_eq!(sk.link_count(), 1);
        assert_eq!(sk.face_count(), 0);

        assert!(!sk.is_atom_valid(a0));
        assert!(!sk.is_link_valid(link_a0_a1));
        assert!(!sk.is_link_valid(link_a0_a2));
        assert!(!sk.is_face_valid(f));

        let a1_atom = sk.atom(a1).unwrap();
        assert_eq!(a1_atom.atom_links().len(), 1);
        assert!(a1_atom.atom_faces().is_empty());
        let a2_atom = sk.atom(a2).unwrap();
        assert_eq!(a2_atom.atom_links().len(), 1);
        assert!(a2_atom.atom_faces().is_empty());

        let remaining_link = sk.link_handle_at(0).unwrap();
        let (ea, eb) = sk.link(remaining_link).unwrap().endpoints();
        assert!((ea == a1 && eb == a2) || (ea == a2 && eb == a1));
    }

    #[test]
    fn isolated_atom_removal_leaves_others_untouched() {
        let mut sk = RootSkeleton::with_capacities(0, 0, 0);
        let a = sk.add_atom([0.0, 0.0, 0.0, 1.0]).unwrap();
        let b = sk.add_atom([1.0, 0.0, 0.0, 1.0]).unwrap();
        sk.add_link(a, b).unwrap();
        let isolated = sk.add_atom([9.0, 9.0, 9.0, 1.0]).unwrap();
        sk.remove_atom(isolated);
        assert_eq!(sk.atom_count(), 2);
        assert_eq!(sk.link_count(), 1);
    }

    #[test]
    fn removing_invalid_handle_is_a_silent_no_op() {
        let (mut sk, a0, _a1, _a2, _f) = triangle();
        sk.remove_atom(a0);
        // a0 is already gone; removing it again must not panic or affect the rest.
        sk.remove_atom(a0);
        assert_eq!(sk.atom_count(), 2);
    }

    #[test]
    fn remove_link_cascades_into_faces_but_not_other_links() {
        let (mut sk, a0, a1, _a2, f) = triangle();
        let (link_handle, _) = sk
            .atoms
            .get(a0)
            .unwrap()
            .atom_links()
            .iter()
            .find(|inc| inc.other == a1)
            .map(|inc| (inc.link, ()))
            .unwrap();
        sk.remove_link(link_handle);
        assert_eq!(sk.face_count(), 0);
        assert!(!sk.is_face_valid(f));
        assert_eq!(sk.atom_count(), 3);
        assert_eq!(sk.link_count(), 2);
    }

    #[test]
    fn remove_face_does_not_cascade_into_links() {
        let (mut sk, _a0, _a1, _a2, f) = triangle();
        sk.remove_face(f);
        assert_eq!(sk.face_count(), 0);
        assert_eq!(sk.link_count(), 3);
        assert_eq!(sk.atom_count(), 3);
    }
}
