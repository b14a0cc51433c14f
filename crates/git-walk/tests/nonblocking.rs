mod common;

use common::{repo1, Storage};
use git_walk::nonblocking::{find_store_dir_async, AsyncRepository};
use git_walk::{ErrorKind, RefCategory, Repository};

#[tokio::test]
async fn async_walk_matches_blocking_walk() {
    for storage in [Storage::Loose, Storage::Packed] {
        let fx = repo1(storage);
        let repo = AsyncRepository::open(fx.work_dir()).await.unwrap();
        let blocking = Repository::open(fx.work_dir()).unwrap();

        let head = repo.read_head().await.unwrap();
        assert_eq!(head.branch_name(), Some("master"));
        let mut commit = head.commit().unwrap().clone();
        let mut expected = blocking.read_head().unwrap().commit().unwrap().clone();
        loop {
            assert_eq!(commit, expected);
            if !commit.has_parents() {
                break;
            }
            commit = commit.walk_async().await.unwrap();
            expected = expected.walk().unwrap();
        }
        assert_eq!(commit.hash(), &fx.commit("commit1"));
    }
}

#[tokio::test]
async fn async_refs_match_blocking_refs() {
    let fx = repo1(Storage::Packed);
    let repo = AsyncRepository::open(fx.git_dir()).await.unwrap();
    let blocking = repo.blocking();

    let branches = repo
        .read_branches(&[RefCategory::Heads, RefCategory::Remotes])
        .await
        .unwrap();
    assert_eq!(branches.len(), 8);
    for branch in branches {
        let name = branch.name().to_owned();
        let commit = branch.commit_async().await.unwrap();
        assert_eq!(commit, blocking.read_commit_by_branch(&name).unwrap());
    }

    let tags = repo.read_tags().await.unwrap();
    assert_eq!(tags.len(), 3);
    let v3 = repo.read_commit_by_tag("v3").await.unwrap();
    assert_eq!(v3.hash(), &fx.commit("commit3"));

    let a = repo.read_commit_by_branch("a").await.unwrap();
    let b2 = a.walk_to_async(a.parent_hashes()[1]).await.unwrap();
    assert_eq!(b2.hash(), &fx.commit("b2"));

    let object = repo.read_object(fx.commit("master")).await.unwrap();
    assert_eq!(object.kind, git_walk::ObjectType::Commit);
    let read = repo.read_commit(fx.commit("master")).await.unwrap();
    assert_eq!(read.raw_body(), object.data.as_slice());
}

#[tokio::test]
async fn async_errors_keep_their_kind() {
    let fx = repo1(Storage::Loose);
    let repo = AsyncRepository::open(fx.work_dir()).await.unwrap();
    let err = repo.read_commit_by_tag("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let root = repo.read_commit(fx.commit("commit1")).await.unwrap();
    assert_eq!(root.walk_async().await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn async_discovery() {
    let fx = repo1(Storage::Loose);
    let nested = fx.work_dir().join("src/lib");
    std::fs::create_dir_all(&nested).unwrap();

    let found = find_store_dir_async(&nested).await.unwrap();
    assert_eq!(
        found.as_deref().map(|p| p.ends_with(".git")),
        Some(true)
    );
    let repo = AsyncRepository::discover(&nested).await.unwrap();
    assert_eq!(repo.read_tags().await.unwrap().len(), 3);
    assert!(AsyncRepository::open(fx.work_dir().join("src")).await.is_err());
}

#[tokio::test]
async fn async_open_with_private_registry() {
    let fx = repo1(Storage::Packed);
    let registry = std::sync::Arc::new(git_pack::PackStoreRegistry::new());
    let repo = AsyncRepository::open_with(
        std::sync::Arc::new(git_utils::io::FsIo),
        fx.work_dir(),
        git_walk::RepositoryOptions::default(),
        std::sync::Arc::clone(&registry),
    )
    .await
    .unwrap();
    assert!(registry.is_empty());

    let d = repo.read_commit_by_branch("d").await.unwrap();
    assert_eq!(d.hash(), &fx.commit("d3"));
    assert_eq!(registry.len(), 1);
}
