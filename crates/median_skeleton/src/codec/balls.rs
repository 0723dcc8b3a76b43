//! The BALLS format: atoms only, a count line followed by four floats per atom, useful for
//! importing atom clouds from other software before a reconstruction pipeline rebuilds
//! topology over them.

use std::io::Write;

use super::text::{parse_error, relevant_lines};
use super::{has_extension, Loader, Saver};
use crate::config::SkeletonConfig;
use crate::error::{Error, Result};
use crate::skeleton::Skeleton;

const EXTENSION: &str = "balls";
const FORMAT: &str = "BALLS";

pub(crate) struct BallsCodec;

impl Loader for BallsCodec {
    fn can_load_from(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn load(&self, skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
        match load_balls(skeleton, path) {
            Ok(()) => Ok(()),
            Err(err) => {
                skeleton.clear(SkeletonConfig::new(0, 0, 0));
                Err(err)
            }
        }
    }
}

impl Saver for BallsCodec {
    fn can_save_to(&self, path: &std::path::Path) -> bool {
        has_extension(path, EXTENSION)
    }

    fn save(&self, skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
        save_balls(skeleton, path)
    }
}

fn load_balls(skeleton: &mut Skeleton, path: &std::path::Path) -> Result<()> {
    let lines = relevant_lines(path)?;
    let mut lines = lines.into_iter();

    let (count_no, count_line) = lines
        .next()
        .ok_or_else(|| parse_error(path, FORMAT, 0, "empty file, expected a ball count"))?;
    let natoms: usize = count_line
        .trim()
        .parse()
        .map_err(|_| parse_error(path, FORMAT, count_no, "invalid ball count"))?;

    skeleton.clear(SkeletonConfig::new(natoms, 0, 0));

    for i in 0..natoms {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| parse_error(path, FORMAT, count_no, format!("missing ball #{i}")))?;
        let values: Vec<f64> = line
            .split_whitespace()
            .map(|t| t.parse())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| parse_error(path, FORMAT, line_no, format!("invalid ball #{i}")))?;
        if values.len() != 4 {
            return Err(parse_error(
                path,
                FORMAT,
                line_no,
                format!("ball #{i} needs 4 components, got {}", values.len()),
            ));
        }
        skeleton
            .add_atom([values[0], values[1], values[2], values[3]])
            .map_err(|_| parse_error(path, FORMAT, line_no, "atom buffer overflow"))?;
    }

    Ok(())
}

fn save_balls(skeleton: &Skeleton, path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = std::io::BufWriter::new(file);
    writeln!(out, "{}", skeleton.atom_count()).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    for i in 0..skeleton.atom_count() {
        let atom = skeleton
            .atom(skeleton.atom_handle_at(i).expect("i < atom_count"))
            .expect("handle just resolved");
        writeln!(
            out,
            "{:.10} {:.10} {:.10} {:.10}",
            atom.x, atom.y, atom.z, atom.r
        )
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
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

    #[test]
    fn round_trips_atoms_only() {
        let mut sk = Skeleton::with_capacities(0, 0, 0);
        sk.add_atom([1.0, 2.0, 3.0, 0.5]).unwrap();
        sk.add_atom([4.0, 5.0, 6.0, 1.5]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.balls");
        save_balls(&sk, &path).unwrap();

        let mut loaded = Skeleton::with_capacities(0, 0, 0);
        load_balls(&mut loaded, &path).unwrap();
        assert_eq!(loaded.atom_count(), 2);
        let a = loaded.atom(loaded.atom_handle_at(1).unwrap()).unwrap();
        assert_eq!((a.x, a.y, a.z, a.r), (4.0, 5.0, 6.0, 1.5));
    }
}
