mod common;

use common::{repo1, Fixture, Storage};
use git_walk::{Commit, RefCategory, Repository, ResolvedHead};

fn open(fixture: &Fixture) -> Repository {
    Repository::open(fixture.work_dir()).unwrap()
}

fn branch_commit(repo: &Repository, name: &str) -> Commit {
    let branches = repo.read_branches(&[RefCategory::Heads]).unwrap();
    let branch = branches.iter().find(|b| b.name() == name).unwrap();
    branch.commit().unwrap().clone()
}

fn walk_commits(storage: Storage) {
    let fx = repo1(storage);
    let repo = open(&fx);

    let head = repo.read_head().unwrap();
    assert_eq!(head.branch_name(), Some("master"));
    let mut commit = head.commit().unwrap().clone();

    // master
    assert_eq!(commit.hash(), &fx.commit("master"));
    assert_eq!(commit.parent_hashes().len(), 3);
    assert!(commit.is_merge_commit());
    assert_eq!(commit.parent_hashes()[0], fx.commit("commit3"));
    assert_eq!(commit.parent_hashes()[1], fx.commit("a"));
    assert_eq!(commit.parent_hashes()[2], fx.commit("c3"));
    assert_eq!(commit.base_parent_hash(), Some(&fx.commit("commit3")));
    assert_eq!(
        commit.merged_parent_hashes(),
        &[fx.commit("a"), fx.commit("c3")]
    );
    assert_eq!(
        commit.walk_to(&commit.parent_hashes()[1]).unwrap().hash(),
        &fx.commit("a")
    );
    assert_eq!(
        commit.walk_to(&commit.parent_hashes()[2]).unwrap().hash(),
        &fx.commit("c3")
    );
    let explicit = commit.walk_to(commit.base_parent_hash().unwrap()).unwrap();
    commit = commit.walk().unwrap();
    assert_eq!(commit, explicit, "walk() follows the base parent");
    assert_eq!(commit.hash(), &fx.commit("commit3"));
    assert!(!commit.is_merge_commit());
    commit = commit.walk().unwrap();
    assert_eq!(commit.hash(), &fx.commit("commit2"));
    commit = commit.walk().unwrap();
    assert_eq!(commit.hash(), &fx.commit("commit1"));
    assert!(!commit.has_parents());
    assert_eq!(commit.base_parent_hash(), None);

    // a
    let mut commit = branch_commit(&repo, "a");
    assert_eq!(commit.hash(), &fx.commit("a"));
    assert_eq!(commit.parent_hashes(), &[fx.commit("a3"), fx.commit("b2")]);
    assert!(commit.is_merge_commit());
    for expected in ["a3", "a2", "a1", "commit2"] {
        commit = commit.walk().unwrap();
        assert_eq!(commit.hash(), &fx.commit(expected));
        assert!(!commit.is_merge_commit());
    }

    // b
    let mut commit = branch_commit(&repo, "b");
    assert_eq!(commit.hash(), &fx.commit("b2"));
    for expected in ["b1", "a2"] {
        commit = commit.walk().unwrap();
        assert_eq!(commit.hash(), &fx.commit(expected));
    }

    // c
    let mut commit = branch_commit(&repo, "c");
    assert_eq!(commit.hash(), &fx.commit("c3"));
    for expected in ["c2", "c1", "commit2"] {
        commit = commit.walk().unwrap();
        assert_eq!(commit.hash(), &fx.commit(expected));
    }

    // d
    let mut commit = branch_commit(&repo, "d");
    assert_eq!(commit.hash(), &fx.commit("d3"));
    for expected in ["d2", "d1", "c3"] {
        commit = commit.walk().unwrap();
        assert_eq!(commit.hash(), &fx.commit(expected));
        assert!(!commit.is_merge_commit());
    }
}

#[test]
fn walk_commits_loose() {
    walk_commits(Storage::Loose);
}

#[test]
fn walk_commits_packed() {
    walk_commits(Storage::Packed);
}

#[test]
fn merge_flag_matches_parent_count() {
    let fx = repo1(Storage::Packed);
    let repo = open(&fx);
    for oid in fx.commits.values() {
        let commit = repo.read_commit(oid).unwrap();
        assert_eq!(commit.is_merge_commit(), commit.parent_hashes().len() >= 2);
        assert_eq!(commit.base_parent_hash(), commit.parent_hashes().first());
        assert_eq!(commit.tree_hash().to_hex(), common::EMPTY_TREE);
    }
}

#[test]
fn packed_and_loose_stores_agree() {
    let loose = repo1(Storage::Loose);
    let packed = repo1(Storage::Packed);
    let loose_repo = open(&loose);
    let packed_repo = open(&packed);
    assert!(packed_repo.git_dir().join("objects/pack").is_dir());

    for object in &loose.objects {
        let a = loose_repo.read_object(&object.oid).unwrap();
        let b = packed_repo.read_object(&object.oid).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.kind, object.kind);
        assert_eq!(a.data, object.body);
    }
    for oid in loose.commits.values() {
        let a = loose_repo.read_commit(oid).unwrap();
        let b = packed_repo.read_commit(oid).unwrap();
        assert_eq!(a.raw_body(), b.raw_body());
        assert_eq!(a.message(), b.message());
    }
}

#[test]
fn repeated_reads_are_equal() {
    let fx = repo1(Storage::Packed);
    let repo = open(&fx);
    let first = repo.read_commit_by_branch("master").unwrap();
    let second = repo.read_commit_by_branch("master").unwrap();
    assert_eq!(first, second);
    let again = repo.read_commit(&fx.commit("master")).unwrap();
    assert_eq!(first, again);
}

#[test]
fn signatures_and_message() {
    let fx = repo1(Storage::Loose);
    let repo = open(&fx);
    let commit = repo.read_commit_by_branch("a").unwrap();
    assert_eq!(commit.message(), "Merge branch 'b' into a");

    let author = commit.author().unwrap();
    assert_eq!(author.name, "A U Thor");
    assert_eq!(author.email, "author@example.com");
    assert_eq!(author.date.tz_offset, 9 * 60);
    assert_eq!(author.date.epoch_millis() % 1000, 0);

    let committer = commit.committer().unwrap();
    assert_eq!(committer.date.tz_offset, -90);
    assert_eq!(committer.date.timestamp, author.date.timestamp);
}

#[test]
fn first_parent_chain() {
    let fx = repo1(Storage::Packed);
    let repo = open(&fx);
    let tip = repo.read_commit_by_branch("d").unwrap();
    let hashes: Vec<_> = tip
        .first_parents()
        .map(|c| *c.unwrap().hash())
        .collect();
    let expected: Vec<_> = ["d3", "d2", "d1", "c3", "c2", "c1", "commit2", "commit1"]
        .iter()
        .map(|name| fx.commit(name))
        .collect();
    assert_eq!(hashes, expected);
}

#[test]
fn walking_past_root_is_not_found() {
    let fx = repo1(Storage::Loose);
    let repo = open(&fx);
    let root = repo.read_commit(&fx.commit("commit1")).unwrap();
    let err = root.walk().unwrap_err();
    assert_eq!(err.kind(), git_walk::ErrorKind::NotFound);
}

#[test]
fn detached_head() {
    let fx = repo1(Storage::Packed);
    std::fs::write(
        fx.git_dir().join("HEAD"),
        format!("{}\n", fx.commit("b1")),
    )
    .unwrap();
    let repo = open(&fx);
    match repo.read_head().unwrap() {
        ResolvedHead::Detached(commit) => {
            assert_eq!(commit.hash(), &fx.commit("b1"));
            assert_eq!(commit.walk().unwrap().hash(), &fx.commit("a2"));
        }
        other => panic!("expected detached HEAD, got {other:?}"),
    }
}

#[test]
fn long_first_parent_walk() {
    // A linear history long enough to cycle the object cache many times.
    let dir = tempfile::tempdir().unwrap();
    let git_dir = dir.path().join(".git");
    let objects = git_dir.join("objects");
    std::fs::create_dir_all(&objects).unwrap();
    std::fs::write(git_dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();

    let mut pack = git_pack::test_support::PackBuilder::new();
    let mut parent: Option<git_walk::ObjectId> = None;
    let mut hashes = Vec::new();
    for i in 0..300 {
        let mut body = format!("tree {}\n", common::EMPTY_TREE);
        if let Some(p) = parent {
            body.push_str(&format!("parent {p}\n"));
        }
        body.push_str(&format!(
            "author A <a@example.com> {} +0000\ncommitter A <a@example.com> {} +0000\n\nstep {i}\n",
            1_000_000 + i,
            1_000_000 + i
        ));
        let oid = match parent {
            Some(p) if i % 10 != 0 => pack.add_ofs_delta(&p, body.as_bytes()),
            _ => pack.add(git_walk::ObjectType::Commit, body.as_bytes()),
        };
        hashes.push(oid);
        parent = Some(oid);
    }
    pack.write(&objects, "long").unwrap();
    common::write_ref(&git_dir, "refs/heads/main", &hashes[hashes.len() - 1]);

    let options = git_walk::RepositoryOptions {
        object_cache_capacity: 16,
        ..Default::default()
    };
    let repo = Repository::open_with_options(dir.path(), options).unwrap();
    let head = repo.read_head().unwrap();
    let walked: Vec<_> = head
        .commit()
        .unwrap()
        .first_parents()
        .map(|c| *c.unwrap().hash())
        .collect();
    hashes.reverse();
    assert_eq!(walked, hashes);
}
