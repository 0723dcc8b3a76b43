//! Persistence codec (C5): MOFF, BALLS, the JSON "median" format, and the write-only WEB
//! format, behind a small loader/saver registry.
//!
//! The original kept two mutex-guarded process-wide `std::list<loader*>`/`std::list<saver*>`,
//! populated by a `__attribute__((constructor))` at process start. This rendition makes the
//! registry an explicit value, [`CodecRegistry`], constructed with [`CodecRegistry::with_defaults`];
//! callers who want the original's ambient-registration behavior get it from [`default_registry`],
//! a lazily-constructed global guarded by a `Mutex` exactly as the original guarded its lists.

mod balls;
mod median;
mod moff;
mod text;
mod web;

use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::skeleton::Skeleton;

/// A skeleton file reader. One instance per format.
pub trait Loader: Send + Sync {
    fn can_load_from(&self, path: &Path) -> bool;
    fn load(&self, skeleton: &mut Skeleton, path: &Path) -> Result<()>;
}

/// A skeleton file writer. One instance per format.
pub trait Saver: Send + Sync {
    fn can_save_to(&self, path: &Path) -> bool;
    fn save(&self, skeleton: &Skeleton, path: &Path) -> Result<()>;
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// An ordered list of loaders and savers, consulted in registration order: the first one that
/// claims a path via `can_load_from`/`can_save_to` handles it.
pub struct CodecRegistry {
    loaders: Vec<Box<dyn Loader>>,
    savers: Vec<Box<dyn Saver>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            savers: Vec::new(),
        }
    }

    /// A registry pre-populated with the four built-in formats, in the same order the
    /// original's `init_default_loaders_and_savers` registered them: MOFF, BALLS, median, then
    /// (saver only) WEB.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_loader(Box::new(moff::MoffCodec));
        registry.add_loader(Box::new(balls::BallsCodec));
        registry.add_loader(Box::new(median::MedianCodec));
        registry.add_saver(Box::new(moff::MoffCodec));
        registry.add_saver(Box::new(balls::BallsCodec));
        registry.add_saver(Box::new(median::MedianCodec));
        registry.add_saver(Box::new(web::WebCodec));
        registry
    }

    pub fn add_loader(&mut self, loader: Box<dyn Loader>) {
        self.loaders.push(loader);
    }

    pub fn add_saver(&mut self, saver: Box<dyn Saver>) {
        self.savers.push(saver);
    }

    pub fn can_load_from(&self, path: &Path) -> bool {
        self.loaders.iter().any(|l| l.can_load_from(path))
    }

    pub fn can_save_to(&self, path: &Path) -> bool {
        self.savers.iter().any(|s| s.can_save_to(path))
    }

    pub fn load(&self, skeleton: &mut Skeleton, path: &Path) -> Result<()> {
        for loader in &self.loaders {
            if loader.can_load_from(path) {
                return loader.load(skeleton, path).map_err(|err| {
                    log::warn!("failed to load skeleton from '{}': {err}", path.display());
                    err
                });
            }
        }
        Err(Error::UnknownFormat {
            path: path.to_path_buf(),
            operation: "load",
        })
    }

    pub fn save(&self, skeleton: &Skeleton, path: &Path) -> Result<()> {
        for saver in &self.savers {
            if saver.can_save_to(path) {
                return saver.save(skeleton, path).map_err(|err| {
                    log::warn!("failed to save skeleton to '{}': {err}", path.display());
                    err
                });
            }
        }
        Err(Error::UnknownFormat {
            path: path.to_path_buf(),
            operation: "save",
        })
    }
}

/// Lazily-constructed global registry, for callers that want the original's ambient
/// process-wide registration without threading a `CodecRegistry` value through their code.
pub static DEFAULT_REGISTRY: Lazy<Mutex<CodecRegistry>> =
    Lazy::new(|| Mutex::new(CodecRegistry::with_defaults()));

pub fn load(skeleton: &mut Skeleton, path: impl AsRef<Path>) -> Result<()> {
    DEFAULT_REGISTRY
        .lock()
        .expect("codec registry mutex poisoned")
        .load(skeleton, path.as_ref())
}

pub fn save(skeleton: &Skeleton, path: impl AsRef<Path>) -> Result<()> {
    DEFAULT_REGISTRY
        .lock()
        .expect("codec registry mutex poisoned")
        .save(skeleton, path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_an_unknown_format_error() {
        let registry = CodecRegistry::with_defaults();
        let sk = Skeleton::with_capacities(0, 0, 0);
        let err = registry.save(&sk, Path::new("whatever.xyz")).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat { .. }));
    }

    #[test]
    fn default_registry_recognizes_builtin_extensions() {
        let registry = CodecRegistry::with_defaults();
        for ext in ["x.moff", "x.balls", "x.median"] {
            let path = Path::new(ext);
            assert!(registry.can_load_from(path), "{ext} should be loadable");
            assert!(registry.can_save_to(path), "{ext} should be saveable");
        }
        assert!(registry.can_save_to(Path::new("x.web")));
        assert!(!registry.can_load_from(Path::new("x.web")));
    }
}
