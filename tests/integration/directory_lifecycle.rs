use crate::integration::common::{fixture, BASE_URI};
use fileshare::{ConflictKind, NotFoundKind, ShareError};

#[tokio::test]
async fn create_exists_delete_round_trip() {
    let fx = fixture();
    let mut dir = fx.share.root_directory().get_directory("dir1").unwrap();
    assert!(!dir.exists().await.unwrap());

    dir.create().await.unwrap();
    assert!(dir.exists().await.unwrap());
    assert!(dir.properties().file_id().is_some());
    assert!(dir.properties().etag().is_some());

    dir.delete().await.unwrap();
    assert!(!dir.exists().await.unwrap());
}

#[tokio::test]
async fn create_under_missing_parent_reports_parent_not_found() {
    let fx = fixture();
    let mut dir = fx.share.directory("missing/child").unwrap();
    let err = dir.create().await.unwrap_err();
    assert!(err.is_parent_not_found(), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn create_twice_conflicts_and_create_if_not_exists_reports_false() {
    let fx = fixture();
    let mut first = fx.share.directory("dup").unwrap();
    assert!(first.create_if_not_exists().await.unwrap());

    let mut second = fx.share.directory("dup").unwrap();
    let err = second.create().await.unwrap_err();
    assert!(matches!(
        err,
        ShareError::Conflict {
            kind: ConflictKind::AlreadyExists,
            ..
        }
    ));
    assert!(!second.create_if_not_exists().await.unwrap());
}

#[tokio::test]
async fn delete_if_exists_sequence() {
    let fx = fixture();
    let mut dir = fx.share.directory("transient").unwrap();
    assert!(!dir.delete_if_exists().await.unwrap());
    dir.create().await.unwrap();
    assert!(dir.delete_if_exists().await.unwrap());
    assert!(!dir.delete_if_exists().await.unwrap());
}

#[tokio::test]
async fn delete_if_exists_under_missing_parent_is_false() {
    let fx = fixture();
    let dir = fx.share.directory("nowhere/deeper").unwrap();
    assert!(!dir.delete_if_exists().await.unwrap());
}

#[tokio::test]
async fn deleting_non_empty_directory_conflicts_until_children_are_gone() {
    let fx = fixture();
    let mut parent = fx.share.directory("parent").unwrap();
    parent.create().await.unwrap();
    let mut child = parent.get_directory("child").unwrap();
    child.create().await.unwrap();
    let mut file = parent.get_file("leaf.txt").unwrap();
    file.create(16).await.unwrap();

    let err = parent.delete().await.unwrap_err();
    assert!(matches!(
        err,
        ShareError::Conflict {
            kind: ConflictKind::DirectoryNotEmpty,
            ..
        }
    ));

    child.delete().await.unwrap();
    assert!(parent.delete().await.is_err());
    file.delete().await.unwrap();
    parent.delete().await.unwrap();
    assert!(!parent.exists().await.unwrap());
}

#[tokio::test]
async fn root_create_if_not_exists_is_false() {
    let fx = fixture();
    let mut root = fx.share.root_directory();
    assert!(root.is_root());
    assert!(!root.create_if_not_exists().await.unwrap());
    assert!(!root.create_if_not_exists().await.unwrap());
    assert_eq!(root.properties().file_id(), Some("0"));
}

#[tokio::test]
async fn root_of_missing_share_is_not_found() {
    let fx = fixture();
    let missing = fx.client.share("nosuchshare").unwrap();
    assert!(!missing.exists().await.unwrap());

    let mut root = missing.root_directory();
    let err = root.create_if_not_exists().await.unwrap_err();
    assert!(matches!(
        err,
        ShareError::NotFound {
            kind: NotFoundKind::Share,
            ..
        }
    ));
}

#[tokio::test]
async fn deleting_root_fails_locally() {
    let fx = fixture();
    let root = fx.share.root_directory();
    let before = fx.service.request_count();
    let err = root.delete().await.unwrap_err();
    assert!(matches!(err, ShareError::InvalidOperation(_)));
    assert_eq!(fx.service.request_count(), before);
}

#[tokio::test]
async fn navigation_is_derived_from_the_path() {
    let fx = fixture();
    let root = fx.share.root_directory();
    assert!(root.parent().is_none());

    let a = root.get_directory("a").unwrap();
    let ab = a.get_directory("b").unwrap();
    assert_eq!(ab.parent(), Some(a.clone()));
    assert_eq!(a.parent(), Some(root.clone()));
    assert_eq!(ab.uri(), format!("{}/share/a/b", BASE_URI));
    assert_eq!(ab.name(), "b");
    assert_eq!(fx.share.directory("a/b").unwrap(), ab);

    assert!(matches!(
        root.get_directory(""),
        Err(ShareError::InvalidArgument(_))
    ));
    // Navigation never issues a request.
    assert_eq!(fx.service.request_count(), 0);
}

#[tokio::test]
async fn independent_instances_do_not_share_staging() {
    let fx = fixture();
    let mut first = fx.share.directory("same").unwrap();
    let second = fx.share.directory("same").unwrap();
    first
        .properties_mut()
        .set_ntfs_attributes(fileshare::NtfsAttributes::HIDDEN);
    assert!(first.properties().has_pending());
    assert!(!second.properties().has_pending());
    assert_eq!(first, second);
}
