//! The JSON "median" format: this library's own serialization, grounded on the original's
//! rapidjson SAX reader/writer in `median_format.h`. Root object: `header` (author, version,
//! and atom/link/face counts as reserve-capacity hints, not authoritative), flattened `atoms`
//! (4 floats each), `links` (2 indices each), `faces` (3 indices each), and three property
//! slots that the original always wrote as `null` and this crate does not populate either —
//! property-table persistence is explicitly deferred (`SPEC_FULL.md` §4.5).

use serde::{Deserialize, Serialize};

use super::{has_extension, Loader, Saver};
use crate::config::SkeletonConfig;
use crate::error::{Error, Result};
use crate::skeleton::Skeleton;

const EXTENSION: &str = "median";
const FORMAT: &str = "median";
const AUTHOR: &str = "median_skeleton";
const VERSION: &str = "1.0";

#[derive(Serialize, Deserialize)]
struct Header {
    author: String,
    version: String,
    atoms: usize,
    links: usize,
    faces: usize,
    #[serde(default)]
    atom_properties: usize,
    #[serde(default)]
    link_properties: usize,
    #[serde(default)]
    face_properties: usize,
}

#[derive(Serialize, Deserialize)]
struct MedianFile {
    header: Header,
    atoms: Vec<f64>,
    links: Vec<u64>,
    faces: Vec<u64>,
    #[serde(default)]
    atom_properties: Option<serde_json::Value>,
    #[serde(default)]
    link_properties: Option<serde_json::Value>,
    #[serde(default)]
    face_properties: Option<serde_json::Value>,
}

pub(crate) struct MedianCodec;

impl Loader for MedianCodec {
    fn can_load_from(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn load(&self, skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
        match load_median(skeleton, path) {
            Ok(()) => Ok(()),
            Err(err) => {
                skeleton.clear(SkeletonConfig::new(0, 0, 0));
                Err(err)
            }
        }
    }
}

impl Saver for MedianCodec {
    fn can_save_to(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn save(&self, skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
        save_median(skeleton, path)
    }
}

fn load_median(skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: MedianFile = serde_json::from_str(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        format: FORMAT,
        message: e.to_string(),
    })?;

    if file.atoms.len() % 4 != 0 {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            format: FORMAT,
            message: format!("atoms array length {} is not a multiple of 4", file.atoms.len()),
        });
    }
    if file.links.len() % 2 != 0 {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            format: FORMAT,
            message: format!("links array length {} is not a multiple of 2", file.links.len()),
        });
    }
    if file.faces.len() % 3 != 0 {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            format: FORMAT,
            message: format!("faces array length {} is not a multiple of 3", file.faces.len()),
        });
    }

    skeleton.clear(SkeletonConfig::new(
        file.header.atoms,
        file.header.links,
        file.header.faces,
    ));

    for chunk in file.atoms.chunks_exact(4) {
        skeleton
            .add_atom([chunk[0], chunk[1], chunk[2], chunk[3]])
            .map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                format: FORMAT,
                message: e.to_string(),
            })?;
    }
    for chunk in file.links.chunks_exact(2) {
        skeleton
            .add_link_indexed(chunk[0] as usize, chunk[1] as usize)
            .map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                format: FORMAT,
                message: e.to_string(),
            })?;
    }
    for chunk in file.faces.chunks_exact(3) {
        skeleton
            .add_face_indexed(chunk[0] as usize, chunk[1] as usize, chunk[2] as usize)
            .map_err(|e| Error::Parse {
                path: path.to_path_buf(),
                format: FORMAT,
                message: e.to_string(),
            })?;
    }

    Ok(())
}

fn save_median(skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
    let mut atoms = Vec::with_capacity(skeleton.atom_count() * 4);
    for i in 0..skeleton.atom_count() {
        let atom = skeleton.atom(skeleton.atom_handle_at(i).expect("i < atom_count")).unwrap();
        atoms.extend_from_slice(&[atom.x, atom.y, atom.z, atom.r]);
    }

    let mut links = Vec::with_capacity(skeleton.link_count() * 2);
    for i in 0..skeleton.link_count() {
        let link = skeleton.link(skeleton.link_handle_at(i).expect("i < link_count")).unwrap();
        let (a, b) = link.endpoints();
        links.push(skeleton.atom_index_of(a).expect("live link endpoint") as u64);
        links.push(skeleton.atom_index_of(b).expect("live link endpoint") as u64);
    }

    let mut faces = Vec::with_capacity(skeleton.face_count() * 3);
    for i in 0..skeleton.face_count() {
        let face = skeleton.face(skeleton.face_handle_at(i).expect("i < face_count")).unwrap();
        for atom in face.atoms() {
            faces.push(skeleton.atom_index_of(atom).expect("live face vertex") as u64);
        }
    }

    let file = MedianFile {
        header: Header {
            author: AUTHOR.to_string(),
            version: VERSION.to_string(),
            atoms: skeleton.atom_count(),
            links: skeleton.link_count(),
            faces: skeleton.face_count(),
            atom_properties: 0,
            link_properties: 0,
            face_properties: 0,
        },
        atoms,
        links,
        faces,
        atom_properties: None,
        link_properties: None,
        face_properties: None,
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn triangle() -> Skeleton {
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        let a0 = sk.add_atom([0.0, 0.0, 0.0, 1.0]).unwrap();
        let a1 = sk.add_atom([1.0, 0.0, 0.0, 1.5]).unwrap();
        let a2 = sk.add_atom([0.0, 1.0, 0.0, 0.5]).unwrap();
        sk.add_face(a0, a1, a2).unwrap();
        sk
    }

    #[test]
    fn round_trips_atoms_links_and_faces() {
        let sk = triangle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.median");
        save_median(&sk, &path).unwrap();

        let mut loaded = Skeleton::with_capacities(0, 0, 0);
        load_median(&mut loaded, &path).unwrap();

        assert_eq!(loaded.atom_count(), 3);
        assert_eq!(loaded.link_count(), 3);
        assert_eq!(loaded.face_count(), 1);
        for i in 0..3 {
            let orig = sk.atom(sk.atom_handle_at(i).unwrap()).unwrap();
            let new = loaded.atom(loaded.atom_handle_at(i).unwrap()).unwrap();
            assert_eq!((orig.x, orig.y, orig.z, orig.r), (new.x, new.y, new.z, new.r));
        }
    }

    #[test]
    fn malformed_json_is_an_error_and_leaves_skeleton_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.median");
        std::fs::write(&path, "{ not json").unwrap();
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        sk.add_atom([1.0, 1.0, 1.0, 1.0]).unwrap();
        let codec = MedianCodec;
        assert!(codec.load(&mut sk, &path).is_err());
        assert_eq!(sk.atom_count(), 0);
    }
}
