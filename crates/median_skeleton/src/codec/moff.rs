//! The MOFF text format, originally used by Mesecina (Balint Miklos's Scale Axis Transform
//! tool): a header line `MOFF <natoms> <nfaces> <scale>`, `natoms` atom lines of 4 floats, then
//! `nfaces` polygon records `<k> i0 i1 ... i{k-1}` fan-triangulated around their last index.
//! Isolated links (not part of any face) are not representable and are lost on save.

use std::io::Write;

use super::text::{parse_error, relevant_lines};
use super::{has_extension, Loader, Saver};
use crate::config::SkeletonConfig;
use crate::error::{Error, Result};
use crate::skeleton::Skeleton;

const EXTENSION: &str = "moff";
const FORMAT: &str = "MOFF";

pub(crate) struct MoffCodec;

impl Loader for MoffCodec {
    fn can_load_from(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn load(&self, skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
        match load_moff(skeleton, path) {
            Ok(()) => Ok(()),
            Err(err) => {
                skeleton.clear(SkeletonConfig::new(0, 0, 0));
                Err(err)
            }
        }
    }
}

impl Saver for MoffCodec {
    fn can_save_to(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn save(&self, skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
        save_moff(skeleton, path)
    }
}

fn load_moff(skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
    let lines = relevant_lines(path)?;
    let mut lines = lines.into_iter();

    let (header_no, header_line) = lines
        .next()
        .ok_or_else(|| parse_error(path, FORMAT, 0, "empty file, expected a MOFF header"))?;
    let mut tokens = header_line.split_whitespace();
    let magic = tokens
        .next()
        .ok_or_else(|| parse_error(path, FORMAT, header_no, "missing magic word"))?;
    if magic != "MOFF" {
        return Err(parse_error(
            path,
            FORMAT,
            header_no,
            format!("wrong magic word '{magic}', expected MOFF"),
        ));
    }
    let natoms: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(path, FORMAT, header_no, "missing or invalid atom count"))?;
    let nfaces: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(path, FORMAT, header_no, "missing or invalid face count"))?;
    let _scale: f64 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(path, FORMAT, header_no, "missing or invalid scale"))?;

    skeleton.clear(SkeletonConfig::new(natoms, natoms * 3, nfaces));

    for i in 0..natoms {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, FORMAT, header_no, format!("missing atom #{i}")))?;
        let values: Vec<f64> = line
            .split_whitespace()
            .map(|t| t.parse())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| parse_error(path, FORMAT, line_no, format!("invalid atom #{i}")))?;
        if values.len() != 4 {
            return Err(parse_error(
                path,
                FORMAT,
                line_no,
                format!("atom #{i} needs 4 components, got {}", values.len()),
            ));
        }
        skeleton
            .add_atom([values[0], values[1], values[2], values[3]])
            .map_err(|_| parse_error(path, FORMAT, line_no, "atom buffer overflow"))?;
    }

    for i in 0..nfaces {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, FORMAT, header_no, format!("missing face #{i}")))?;
        let mut tokens = line.split_whitespace();
        let k: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| parse_error(path, FORMAT, line_no, format!("face #{i}: missing index count")))?;
        let indices: Vec<usize> = tokens
            .map(|t| t.parse())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| parse_error(path, FORMAT, line_no, format!("face #{i}: invalid index")))?;
        if indices.len() != k {
            return Err(parse_error(
                path,
                FORMAT,
                line_no,
                format!("face #{i}: declared {k} indices, found {}", indices.len()),
            ));
        }
        for &idx in &indices {
            if idx >= natoms {
                return Err(parse_error(
                    path,
                    FORMAT,
                    line_no,
                    format!("face #{i}: atom index {idx} out of range (natoms={natoms})"),
                ));
            }
        }
        if k > 1 {
            let force = indices[k - 1];
            let mut last = force;
            for &current in &indices {
                skeleton
                    .add_link_indexed(current, last)
                    .map_err(|e| parse_error(path, FORMAT, line_no, e.to_string()))?;
                if current != force && last != force {
                    skeleton
                        .add_link_indexed(current, force)
                        .map_err(|e| parse_error(path, FORMAT, line_no, e.to_string()))?;
                    skeleton
                        .add_face_indexed(current, force, last)
                        .map_err(|e| parse_error(path, FORMAT, line_no, e.to_string()))?;
                }
                last = current;
            }
        }
    }

    Ok(())
}

fn save_moff(skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = std::io::BufWriter::new(file);

    let write = |out: &mut std::io::BufWriter<std::fs::File>, line: String| {
        out.write_all(line.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })
    };

    write(
        &mut out,
        format!("MOFF {} {} 1", skeleton.atom_count(), skeleton.face_count()),
    )?;

    for i in 0..skeleton.atom_count() {
        let handle = skeleton.atom_handle_at(i).expect("i < atom_count");
        let atom = skeleton.atom(handle).expect("handle just resolved");
        write(
            &mut out,
            format!(
                "{:.10} {:.10} {:.10} {:.10}",
                atom.x, atom.y, atom.z, atom.r
            ),
        )?;
    }

    for i in 0..skeleton.face_count() {
        let handle = skeleton.face_handle_at(i).expect("i < face_count");
        let face = skeleton.face(handle).expect("handle just resolved");
        let [a, b, c] = face.atoms();
        let ia = skeleton.atom_index_of(a).expect("live face vertex");
        let ib = skeleton.atom_index_of(b).expect("live face vertex");
        let ic = skeleton.atom_index_of(c).expect("live face vertex");
        write(&mut out, format!("3 {ia} {ib} {ic}"))?;
    }

    out.flush().map_err(|source| Error::Io {
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
        let a1 = sk.add_atom([1.0, 0.0, 0.0, 1.0]).unwrap();
        let a2 = sk.add_atom([0.0, 1.0, 0.0, 1.0]).unwrap();
        sk.add_face(a0, a1, a2).unwrap();
        sk
    }

    #[test]
    fn scenario_f_moff_round_trip() {
        let sk = triangle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.moff");
        save_moff(&sk, &path).unwrap();

        let mut loaded = Skeleton::with_capacities(0, 0, 0);
        load_moff(&mut loaded, &path).unwrap();

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
    fn malformed_header_is_an_error_and_leaves_skeleton_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.moff");
        std::fs::write(&path, "NOTMOFF 1 0 1\n0 0 0 1\n").unwrap();
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        sk.add_atom([9.0, 9.0, 9.0, 1.0]).unwrap();
        let codec = MoffCodec;
        let err = codec.load(&mut sk, &path);
        assert!(err.is_err());
        assert_eq!(sk.atom_count(), 0);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commented.moff");
        std::fs::write(
            &path,
            "// a skeleton of one ball\nMOFF 1 0 1\n\n0 0 0 2 // the ball\n",
        )
        .unwrap();
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        load_moff(&mut sk, &path).unwrap();
        assert_eq!(sk.atom_count(), 1);
        let h = sk.atom_handle_at(0).unwrap();
        assert_eq!(sk.atom(h).unwrap().r, 2.0);
    }
}
