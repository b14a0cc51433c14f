//! Builds the reference repository used by the integration tests.
//!
//! History (current branch `master`):
//!
//! ```text
//! * d3
//! * d2
//! * d1
//! | *-.   master: Merge branches 'a' and 'c'
//! | |\ \
//! | |_|/
//! |/| |
//! * | | c3
//! * | | c2
//! * | | c1
//! | | *   a: Merge branch 'b' into a
//! | | |\
//! | | | * b2
//! | | | * b1
//! | | * | a3
//! | | |/
//! | | * a2
//! | | * a1
//! | |/
//! |/|
//! | * commit3
//! |/
//! * commit2
//! * commit1
//! ```
//!
//! Tags: `v1` (lightweight, commit1), `v2` (annotated, commit2), `v3`
//! (annotated tag of an annotated tag, commit3). Remote `origin` tracks
//! `master`, `a`, and `b` and has a symbolic `origin/HEAD`.
//!
//! The same history can be written as loose objects with loose refs, or as
//! one packfile (whole objects, OFS_DELTA and REF_DELTA entries) with a
//! `packed-refs` file.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use git_hash::hasher::Hasher;
use git_hash::ObjectId;
use git_object::ObjectType;
use git_pack::test_support::PackBuilder;

pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Loose,
    Packed,
}

/// One object of the fixture, in write order.
#[derive(Debug, Clone)]
pub struct FixtureObject {
    pub oid: ObjectId,
    pub kind: ObjectType,
    pub body: Vec<u8>,
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    /// Commit name (`commit1`, `a3`, `master`, ...) to id.
    pub commits: BTreeMap<&'static str, ObjectId>,
    /// Annotated tag name to the id of its tag object.
    pub tag_objects: BTreeMap<&'static str, ObjectId>,
    pub objects: Vec<FixtureObject>,
}

impl Fixture {
    pub fn git_dir(&self) -> PathBuf {
        self.dir.path().join(".git")
    }

    pub fn work_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn commit(&self, name: &str) -> ObjectId {
        self.commits[name]
    }
}

/// Accumulates objects before they are written.
#[derive(Default)]
struct History {
    objects: Vec<FixtureObject>,
    commits: BTreeMap<&'static str, ObjectId>,
    tag_objects: BTreeMap<&'static str, ObjectId>,
    clock: i64,
}

impl History {
    fn push(&mut self, kind: ObjectType, body: Vec<u8>) -> ObjectId {
        let oid = Hasher::hash_object(kind.as_str(), &body).unwrap();
        self.objects.push(FixtureObject { oid, kind, body });
        oid
    }

    fn commit(&mut self, name: &'static str, parents: &[&str], message: &str) -> ObjectId {
        self.clock += 60;
        let mut body = format!("tree {EMPTY_TREE}\n");
        for parent in parents {
            body.push_str(&format!("parent {}\n", self.commits[*parent]));
        }
        body.push_str(&format!(
            "author A U Thor <author@example.com> {} +0900\n",
            1_500_000_000 + self.clock
        ));
        body.push_str(&format!(
            "committer C O Mitter <committer@example.com> {} -0130\n",
            1_500_000_000 + self.clock
        ));
        body.push_str(&format!("\n{message}\n"));
        let oid = self.push(ObjectType::Commit, body.into_bytes());
        self.commits.insert(name, oid);
        oid
    }

    fn annotated_tag(&mut self, name: &'static str, target: ObjectId, kind: ObjectType) -> ObjectId {
        let body = format!(
            "object {target}\ntype {kind}\ntag {name}\ntagger T Agger <tagger@example.com> 1600000000 +0000\n\nrelease {name}\n"
        );
        let oid = self.push(ObjectType::Tag, body.into_bytes());
        self.tag_objects.insert(name, oid);
        oid
    }
}

fn history() -> History {
    let mut h = History::default();
    h.push(ObjectType::Tree, Vec::new());
    h.commit("commit1", &[], "commit1");
    h.commit("commit2", &["commit1"], "commit2");
    h.commit("commit3", &["commit2"], "commit3");
    h.commit("a1", &["commit2"], "a1");
    h.commit("a2", &["a1"], "a2");
    h.commit("a3", &["a2"], "a3");
    h.commit("b1", &["a2"], "b1");
    h.commit("b2", &["b1"], "b2");
    h.commit("a", &["a3", "b2"], "Merge branch 'b' into a");
    h.commit("c1", &["commit2"], "c1");
    h.commit("c2", &["c1"], "c2");
    h.commit("c3", &["c2"], "c3");
    h.commit("master", &["commit3", "a", "c3"], "Merge branches 'a' and 'c'");
    h.commit("d1", &["c3"], "d1");
    h.commit("d2", &["d1"], "d2");
    h.commit("d3", &["d2"], "d3");
    let v2 = h.commits["commit2"];
    h.annotated_tag("v2", v2, ObjectType::Commit);
    let inner = h.annotated_tag("v3-inner", h.commits["commit3"], ObjectType::Commit);
    h.annotated_tag("v3", inner, ObjectType::Tag);
    h
}

const BRANCHES: [&str; 5] = ["master", "a", "b", "c", "d"];
const REMOTE_BRANCHES: [&str; 3] = ["master", "a", "b"];

fn branch_tip(h: &History, branch: &str) -> ObjectId {
    match branch {
        "b" => h.commits["b2"],
        "c" => h.commits["c3"],
        "d" => h.commits["d3"],
        other => h.commits[other],
    }
}

/// Write the reference repository.
pub fn repo1(storage: Storage) -> Fixture {
    let h = history();
    let dir = tempfile::tempdir().unwrap();
    let git_dir = dir.path().join(".git");
    let objects_dir = git_dir.join("objects");
    fs::create_dir_all(&objects_dir).unwrap();
    fs::create_dir_all(git_dir.join("refs/heads")).unwrap();
    fs::create_dir_all(git_dir.join("refs/tags")).unwrap();
    fs::write(git_dir.join("HEAD"), "ref: refs/heads/master\n").unwrap();

    match storage {
        Storage::Loose => {
            for object in &h.objects {
                let oid =
                    git_loose::test_support::write_loose(&objects_dir, object.kind, &object.body)
                        .unwrap();
                assert_eq!(oid, object.oid);
            }
            for branch in BRANCHES {
                write_ref(&git_dir, &format!("refs/heads/{branch}"), &branch_tip(&h, branch));
            }
            for branch in REMOTE_BRANCHES {
                write_ref(
                    &git_dir,
                    &format!("refs/remotes/origin/{branch}"),
                    &branch_tip(&h, branch),
                );
            }
            fs::write(
                git_dir.join("refs/remotes/origin/HEAD"),
                "ref: refs/remotes/origin/master\n",
            )
            .unwrap();
            write_ref(&git_dir, "refs/tags/v1", &h.commits["commit1"]);
            write_ref(&git_dir, "refs/tags/v2", &h.tag_objects["v2"]);
            write_ref(&git_dir, "refs/tags/v3", &h.tag_objects["v3"]);
        }
        Storage::Packed => {
            write_pack(&h, &objects_dir);
            let mut packed = String::from("# pack-refs with: peeled fully-peeled sorted \n");
            for branch in BRANCHES {
                packed.push_str(&format!("{} refs/heads/{branch}\n", branch_tip(&h, branch)));
            }
            for branch in REMOTE_BRANCHES {
                packed.push_str(&format!(
                    "{} refs/remotes/origin/{branch}\n",
                    branch_tip(&h, branch)
                ));
            }
            packed.push_str(&format!("{} refs/tags/v1\n", h.commits["commit1"]));
            packed.push_str(&format!("{} refs/tags/v2\n", h.tag_objects["v2"]));
            packed.push_str(&format!("^{}\n", h.commits["commit2"]));
            packed.push_str(&format!("{} refs/tags/v3\n", h.tag_objects["v3"]));
            packed.push_str(&format!("^{}\n", h.commits["commit3"]));
            fs::write(git_dir.join("packed-refs"), packed).unwrap();
            fs::create_dir_all(git_dir.join("refs/remotes/origin")).unwrap();
            fs::write(
                git_dir.join("refs/remotes/origin/HEAD"),
                "ref: refs/remotes/origin/master\n",
            )
            .unwrap();
        }
    }

    Fixture {
        dir,
        commits: h.commits,
        tag_objects: h.tag_objects,
        objects: h.objects,
    }
}

/// Pack every object; commits alternate between whole entries, OFS_DELTA
/// against the previous commit, and REF_DELTA against the one before.
fn write_pack(h: &History, objects_dir: &Path) {
    let mut pack = PackBuilder::new();
    let mut previous: Vec<&FixtureObject> = Vec::new();
    for (i, object) in h.objects.iter().enumerate() {
        let oid = match (object.kind, i % 3, previous.len()) {
            (ObjectType::Commit, 1, n) if n >= 1 => {
                pack.add_ofs_delta(&previous[n - 1].oid, &object.body)
            }
            (ObjectType::Commit, 2, n) if n >= 2 => {
                let base = previous[n - 2];
                pack.add_ref_delta(&base.oid, base.kind, &base.body, &object.body)
            }
            _ => pack.add(object.kind, &object.body),
        };
        assert_eq!(oid, object.oid);
        if object.kind == ObjectType::Commit {
            previous.push(object);
        }
    }
    pack.write(objects_dir, "fixture").unwrap();
}

pub fn write_ref(git_dir: &Path, name: &str, oid: &ObjectId) {
    let path = git_dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("{oid}\n")).unwrap();
}

/// `true` when a `git` binary is on `PATH`.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
