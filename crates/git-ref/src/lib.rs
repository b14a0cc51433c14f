//! Read-only reference resolution.
//!
//! Refs come from three sources, in decreasing precedence:
//! loose files under `refs/`, the `packed-refs` file, and `info/refs`.
//! [`RefTable::load`] merges them per [`RefCategory`]; [`read_head`]
//! resolves `HEAD` to a branch name or a detached commit id.

mod error;
pub mod files;
mod head;
mod table;

pub use error::RefError;
pub use files::info::InfoRefs;
pub use files::packed::{PackedRef, PackedRefs};
pub use head::{parse_head, read_head, Head};
pub use table::RefTable;

use git_hash::ObjectId;

/// The ref namespaces this crate enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefCategory {
    Heads,
    Tags,
    Remotes,
}

impl RefCategory {
    pub const ALL: [RefCategory; 3] = [Self::Heads, Self::Tags, Self::Remotes];

    /// Directory name under `refs/`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heads => "heads",
            Self::Tags => "tags",
            Self::Remotes => "remotes",
        }
    }

    /// Split a full ref name (`refs/heads/main`) into its category and the
    /// name inside it (`main`). Remote names keep their remote prefix
    /// (`origin/main`).
    pub fn split_full_name(full: &str) -> Option<(RefCategory, &str)> {
        let rest = full.strip_prefix("refs/")?;
        Self::ALL.into_iter().find_map(|category| {
            rest.strip_prefix(category.as_str())
                .and_then(|r| r.strip_prefix('/'))
                .filter(|name| !name.is_empty())
                .map(|name| (category, name))
        })
    }
}

impl std::fmt::Display for RefCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heads" => Ok(Self::Heads),
            "tags" => Ok(Self::Tags),
            "remotes" => Ok(Self::Remotes),
            other => Err(format!("unknown ref category: {other}")),
        }
    }
}

/// What a ref points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefTarget {
    pub oid: ObjectId,
    /// The object an annotated tag finally points at, when the source recorded it.
    pub peeled: Option<ObjectId>,
}

impl RefTarget {
    pub fn new(oid: ObjectId) -> Self {
        Self { oid, peeled: None }
    }
}

/// `true` for a remote's default-branch pointer (`origin/HEAD`), which is
/// never listed as a branch.
pub(crate) fn is_remote_head(name: &str) -> bool {
    name.rsplit('/').next() == Some("HEAD") && name.matches('/').count() == 1
}
