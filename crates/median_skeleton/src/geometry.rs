//! Geometry utility callbacks expected from pipeline collaborators (C6): an `intersect`
//! predicate between two atoms — already [`crate::skeleton::Atom::intersects`] — and a bounding
//! box helper over atom centers, used by regularizers to build acceleration structures.

use crate::skeleton::Skeleton;

/// An axis-aligned bounding box over a set of points, expressed as min/max corners rather than
/// the original's center+half-extents form: equivalent information, fewer reasons for callers
/// to get a half-extent/full-extent mixup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn half_extents(&self) -> [f64; 3] {
        [
            (self.max[0] - self.min[0]) * 0.5,
            (self.max[1] - self.min[1]) * 0.5,
            (self.max[2] - self.min[2]) * 0.5,
        ]
    }
}

impl Skeleton {
    /// The bounding box of every atom's center. `None` if the skeleton has no atoms.
    pub fn compute_centers_bounding_box(&self) -> Option<BoundingBox> {
        if self.atom_count() == 0 {
            return None;
        }
        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];
        for i in 0..self.atom_count() {
            let handle = self.atom_handle_at(i).expect("i < atom_count");
            let atom = self.atom(handle).expect("handle just resolved");
            let p = atom.position();
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some(BoundingBox { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_skeleton_has_no_bounding_box() {
        let sk = Skeleton::with_capacities(0, 0, 0);
        assert!(sk.compute_centers_bounding_box().is_none());
    }

    #[test]
    fn bounding_box_spans_atom_centers() {
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        sk.add_atom([-1.0, 2.0, 0.0, 1.0]).unwrap();
        sk.add_atom([3.0, -4.0, 5.0, 1.0]).unwrap();
        let bbox = sk.compute_centers_bounding_box().unwrap();
        assert_eq!(bbox.min, [-1.0, -4.0, 0.0]);
        assert_eq!(bbox.max, [3.0, 2.0, 5.0]);
    }
}
