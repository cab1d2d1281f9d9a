use crate::integration::common::fixture;
use fileshare::{ConflictKind, NtfsAttributes, ShareError};

#[tokio::test]
async fn create_file_with_length() {
    let fx = fixture();
    let mut dir = fx.share.directory("docs").unwrap();
    dir.create().await.unwrap();

    let mut file = dir.get_file("report.txt").unwrap();
    file.create(1024).await.unwrap();
    assert_eq!(file.length(), Some(1024));
    assert_eq!(
        file.properties().parent_id(),
        dir.properties().file_id()
    );
    assert!(file
        .properties()
        .ntfs_attributes()
        .unwrap()
        .contains(NtfsAttributes::ARCHIVE));

    let mut reread = fx.share.file("docs/report.txt").unwrap();
    assert!(reread.exists().await.unwrap());
    assert_eq!(reread.length(), Some(1024));
    assert_eq!(reread.parent(), dir);
}

#[tokio::test]
async fn file_create_if_not_exists_and_delete_if_exists() {
    let fx = fixture();
    let mut file = fx.share.file("a.bin").unwrap();
    assert!(file.create_if_not_exists(8).await.unwrap());
    assert!(!file.create_if_not_exists(8).await.unwrap());
    assert!(file.delete_if_exists().await.unwrap());
    assert!(!file.delete_if_exists().await.unwrap());
}

#[tokio::test]
async fn file_and_directory_share_one_namespace() {
    let fx = fixture();
    let mut dir = fx.share.directory("name").unwrap();
    dir.create().await.unwrap();

    let mut file = fx.share.file("name").unwrap();
    let err = file.create(0).await.unwrap_err();
    assert!(matches!(
        err,
        ShareError::Conflict {
            kind: ConflictKind::AlreadyExists,
            ..
        }
    ));
    // The path holds a directory, so there is no file to find.
    assert!(!file.exists().await.unwrap());
}

#[tokio::test]
async fn resize_submits_length_and_keeps_other_properties() {
    let fx = fixture();
    let mut file = fx.share.file("grow.dat").unwrap();
    file.properties_mut().set_content_type("application/octet-stream");
    file.create(10).await.unwrap();
    assert_eq!(file.properties().content_type(), Some("application/octet-stream"));

    file.resize(4096).await.unwrap();
    assert_eq!(file.length(), Some(4096));
    assert!(!file.properties().has_pending());

    let mut reread = fx.share.file("grow.dat").unwrap();
    reread.fetch_attributes().await.unwrap();
    assert_eq!(reread.length(), Some(4096));
    assert_eq!(
        reread.properties().content_type(),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn file_parent_of_top_level_file_is_root() {
    let fx = fixture();
    let file = fx.share.file("top.txt").unwrap();
    let parent = file.parent();
    assert!(parent.is_root());
    assert_eq!(parent, fx.share.root_directory());
}
