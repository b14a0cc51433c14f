//! Read-only access to a git repository: branches, tags, `HEAD`, and
//! commit history, decoded straight from the object store.
//!
//! ```no_run
//! use git_walk::{RefCategory, Repository};
//!
//! let repo = Repository::discover(".")?;
//! let head = repo.read_head()?;
//! for commit in head.commit()?.first_parents().take(10) {
//!     let commit = commit?;
//!     println!("{} {}", commit.hash(), commit.message());
//! }
//! for branch in repo.read_branches(&[RefCategory::Heads, RefCategory::Remotes])? {
//!     println!("{} -> {}", branch.name(), branch.commit()?.hash());
//! }
//! # Ok::<(), git_walk::Error>(())
//! ```
//!
//! [`nonblocking::AsyncRepository`] offers the same operations as `async`
//! functions.

mod commit;
mod discover;
mod error;
mod objects;
mod options;
mod reference;
mod repository;

pub mod nonblocking;

pub use commit::{Commit, FirstParents};
pub use discover::{find_store_dir, parse_gitdir_file};
pub use error::{Error, Result};
pub use options::RepositoryOptions;
pub use reference::Ref;
pub use repository::{Repository, ResolvedHead};

pub use git_hash::ObjectId;
pub use git_object::{ObjectType, RawObject};
pub use git_ref::{Head, RefCategory};
pub use git_utils::date::{GitDate, Signature};
pub use git_utils::ErrorKind;
