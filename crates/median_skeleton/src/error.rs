use std::path::PathBuf;

/// The three tiers of the skeleton, used to tag structural errors with where they occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Atom,
    Link,
    Face,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Atom => "atom",
            Tier::Link => "link",
            Tier::Face => "face",
        };
        f.write_str(name)
    }
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tier} tier is full: cannot allocate a new slot")]
    BufferOverflow { tier: Tier },

    #[error("invalid {tier} handle (slot {slot}): {reason}")]
    InvalidHandle {
        tier: Tier,
        slot: u64,
        reason: &'static str,
    },

    #[error("invalid {tier} index {index}: tier size is {size}")]
    InvalidIndex {
        tier: Tier,
        index: usize,
        size: usize,
    },

    #[error("no property named '{name}' on {tier} tier")]
    UnknownProperty { tier: Tier, name: String },

    #[error("property '{name}' on {tier} tier has a different type than requested")]
    PropertyTypeMismatch { tier: Tier, name: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}' as {format}: {message}", path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("no codec registered that can {operation} '{}'", path.display())]
    UnknownFormat {
        path: PathBuf,
        operation: &'static str,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
