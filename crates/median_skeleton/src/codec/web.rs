//! The WEB format: a single line of JSON intended for a browser-side viewer, matching the
//! original's ad hoc streaming writer. Write-only — there is no corresponding loader, and
//! attempting to load a `.web` file is an [`Error::UnknownFormat`](crate::error::Error).

use serde::Serialize;

use super::{has_extension, Saver};
use crate::error::{Error, Result};
use crate::skeleton::Skeleton;

const EXTENSION: &str = "web";
const FORMAT: &str = "web";
const AUTHOR: &str = "median_skeleton";

#[derive(Serialize)]
struct WebFile {
    author: &'static str,
    number_of_atoms: usize,
    number_of_links: usize,
    number_of_faces: usize,
    max_radius: f64,
    min_radius: f64,
    atoms: Vec<f64>,
    links: Vec<u64>,
    faces: Vec<u64>,
}

pub(crate) struct WebCodec;

impl Saver for WebCodec {
    fn can_save_to(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn save(&self, skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
        let mut min_radius = f64::MAX;
        let mut max_radius = -1.0;
        let mut atoms = Vec::with_capacity(skeleton.atom_count() * 4);
        for i in 0..skeleton.atom_count() {
            let atom = skeleton
                .atom(skeleton.atom_handle_at(i).expect("i < atom_count"))
                .expect("handle just resolved");
            min_radius = min_radius.min(atom.r);
            max_radius = max_radius.max(atom.r);
            atoms.extend_from_slice(&[atom.x, atom.y, atom.z, atom.r]);
        }

        let mut links = Vec::with_capacity(skeleton.link_count() * 2);
        for i in 0..skeleton.link_count() {
            let link = skeleton
                .link(skeleton.link_handle_at(i).expect("i < link_count"))
                .expect("handle just resolved");
            let (a, b) = link.endpoints();
            links.push(skeleton.atom_index_of(a).expect("live link endpoint") as u64);
            links.push(skeleton.atom_index_of(b).expect("live link endpoint") as u64);
        }

        let mut faces = Vec::with_capacity(skeleton.face_count() * 3);
        for i in 0..skeleton.face_count() {
            let face = skeleton
                .face(skeleton.face_handle_at(i).expect("i < face_count"))
                .expect("handle just resolved");
            for atom in face.atoms() {
                faces.push(skeleton.atom_index_of(atom).expect("live face vertex") as u64);
            }
        }

        let file = WebFile {
            author: AUTHOR,
            number_of_atoms: skeleton.atom_count(),
            number_of_links: skeleton.link_count(),
            number_of_faces: skeleton.face_count(),
            max_radius,
            min_radius,
            atoms,
            links,
            faces,
        };

        let text = serde_json::to_string(&file).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            format: FORMAT,
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_single_line_of_json() {
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        sk.add_atom([1.0, 2.0, 3.0, 0.5]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.web");
        WebCodec.save(&sk, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"number_of_atoms\":1"));
    }

    #[test]
    fn not_a_loader() {
        use super::super::CodecRegistry;
        let registry = CodecRegistry::with_defaults();
        assert!(!registry.can_load_from(std::path::Path::new("x.web")));
    }
}
