//! Bulk filter/remove engine (C4): two-pass predicate evaluation, cross-tier flag
//! propagation, then in-place compaction, face tier first, then links, then atoms.
//!
//! The predicate is evaluated against every live element up front into a flag array
//! (`Phase 1`) rather than streamed into removal, because removal indices shift as soon as
//! compaction begins: a predicate closure that captured a packed index would be invalidated
//! mid-sweep. Materializing the decision first decouples it from compaction order.

use super::Skeleton;

impl Skeleton {
    /// Remove every atom for which `pred` returns `true`. Cascades into incident links and
    /// faces exactly as [`Skeleton::remove_atom`] would, but as a single two-pass sweep
    /// instead of one cascade per atom.
    ///
    /// When `parallel`, the predicate is evaluated over the atom tier with `rayon`; `pred`
    /// must therefore be pure with respect to the skeleton (read element fields and
    /// handle-indexed properties, never mutate them).
    pub fn remove_atoms<F: Fn(&crate::skeleton::Atom) -> bool + Sync>(
        &mut self,
        pred: F,
        parallel: bool,
    ) {
        let atom_flags = evaluate(self.atoms.elements(), &pred, parallel);
        if !atom_flags.iter().any(|&f| f) {
            return;
        }

        let mut link_flags = vec![false; self.links.size()];
        let mut face_flags = vec![false; self.faces.size()];
        for (index, &flagged) in atom_flags.iter().enumerate() {
            if !flagged {
                continue;
            }
            let atom = &self.atoms.elements()[index];
            for incidence in atom.atom_faces() {
                if let Ok(i) = self.faces.index_of(incidence.face) {
                    face_flags[i] = true;
                }
            }
            for incidence in atom.atom_links() {
                if let Ok(i) = self.links.index_of(incidence.link) {
                    link_flags[i] = true;
                }
            }
        }

        self.strip_flagged_incidence(&face_flags, &link_flags);

        self.faces.compact(&face_flags);
        self.links.compact(&link_flags);
        self.atoms.compact(&atom_flags);
    }

    /// Remove every link for which `pred` returns `true`, cascading into incident faces.
    pub fn remove_links<F: Fn(&crate::skeleton::Link) -> bool + Sync>(
        &mut self,
        pred: F,
        parallel: bool,
    ) {
        let link_flags = evaluate(self.links.elements(), &pred, parallel);
        if !link_flags.iter().any(|&f| f) {
            return;
        }

        let mut face_flags = vec![false; self.faces.size()];
        for (index, &flagged) in link_flags.iter().enumerate() {
            if !flagged {
                continue;
            }
            let link = &self.links.elements()[index];
            for incidence in link.link_faces() {
                if let Ok(i) = self.faces.index_of(incidence.face) {
                    face_flags[i] = true;
                }
            }
        }

        self.strip_flagged_incidence(&face_flags, &link_flags);

        self.faces.compact(&face_flags);
        self.links.compact(&link_flags);
    }

    /// Remove every face for which `pred` returns `true`. No cascade: faces are leaves of the
    /// incidence graph, but the atoms and links that referenced them still need their
    /// `atom_faces`/`link_faces` incidence entries cleared.
    pub fn remove_faces<F: Fn(&crate::skeleton::Face) -> bool + Sync>(
        &mut self,
        pred: F,
        parallel: bool,
    ) {
        let face_flags = evaluate(self.faces.elements(), &pred, parallel);
        if !face_flags.iter().any(|&f| f) {
            return;
        }
        self.strip_flagged_incidence(&face_flags, &[]);
        self.faces.compact(&face_flags);
    }

    /// Clear the incidence entries surviving atoms/links hold for every flagged face, and the
    /// entries surviving atoms hold for every flagged link, before the corresponding tier is
    /// compacted. Mirrors what `topology::destroy_face`/`destroy_link` do one element at a time
    /// (`strip_face_incidence`/`strip_link_incidence`), applied here to a whole flagged batch
    /// up front so no surviving element is left holding a handle into a slot about to be freed.
    fn strip_flagged_incidence(&mut self, face_flags: &[bool], link_flags: &[bool]) {
        for (index, &flagged) in face_flags.iter().enumerate() {
            if !flagged {
                continue;
            }
            let handle = self
                .faces
                .handle_at(index)
                .expect("flagged index is still within the live face tier");
            let face = self.faces.elements()[index];
            self.strip_face_incidence(handle, &face);
        }
        for (index, &flagged) in link_flags.iter().enumerate() {
            if !flagged {
                continue;
            }
            let handle = self
                .links
                .handle_at(index)
                .expect("flagged index is still within the live link tier");
            let (a, b) = self.links.elements()[index].endpoints();
            self.strip_link_incidence(handle, a, b);
        }
    }
}

fn evaluate<E, F: Fn(&E) -> bool + Sync>(elements: &[E], pred: &F, parallel: bool) -> Vec<bool>
where
    E: Sync,
{
    if parallel {
        use rayon::prelude::*;
        elements.par_iter().map(pred).collect()
    } else {
        elements.iter().map(pred).collect()
    }
}
