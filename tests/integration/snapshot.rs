use crate::integration::common::{fixture, Fixture, SHARE};
use chrono::Duration;
use fileshare::{HandleOptions, ListItem, ListOptions, NotFoundKind, Share, ShareError};

async fn snapshotted() -> (Fixture, Share) {
    let fx = fixture();
    let mut dir = fx.share.directory("frozen").unwrap();
    dir.metadata_mut().set("state", "before").unwrap();
    dir.create().await.unwrap();
    dir.get_file("kept.txt").unwrap().create(5).await.unwrap();
    let mut doomed = dir.get_file("doomed.txt").unwrap();
    doomed.create(7).await.unwrap();

    let time = fx.service.create_snapshot(SHARE).unwrap();
    let snapshot = fx.share.snapshot(time);

    doomed.delete().await.unwrap();
    dir.metadata_mut().set("state", "after").unwrap();
    dir.set_metadata().await.unwrap();
    (fx, snapshot)
}

fn assert_invalid_operation<T: std::fmt::Debug>(result: fileshare::Result<T>) {
    match result {
        Err(ShareError::InvalidOperation(message)) => assert!(message.contains("snapshot")),
        other => panic!("expected InvalidOperation, got {:?}", other),
    }
}

#[tokio::test]
async fn snapshot_reads_see_frozen_state() {
    let (fx, snapshot) = snapshotted().await;
    assert!(snapshot.is_snapshot());
    assert!(snapshot.exists().await.unwrap());

    let mut dir = snapshot.directory("frozen").unwrap();
    dir.fetch_attributes().await.unwrap();
    assert_eq!(dir.metadata().get("state"), Some("before"));
    assert_eq!(dir.snapshot_time(), snapshot.snapshot_time());

    let names: Vec<String> = dir
        .list_items(ListOptions::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .iter()
        .map(|item| item.name().to_string())
        .collect();
    assert_eq!(names, vec!["doomed.txt", "kept.txt"]);

    let mut live = fx.share.directory("frozen").unwrap();
    live.fetch_attributes().await.unwrap();
    assert_eq!(live.metadata().get("state"), Some("after"));
}

#[tokio::test]
async fn listed_items_stay_in_the_snapshot() {
    let (_fx, snapshot) = snapshotted().await;
    let dir = snapshot.directory("frozen").unwrap();
    let items = dir
        .list_items(ListOptions::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let mut doomed = items
        .into_iter()
        .find(|item| item.name() == "doomed.txt")
        .and_then(ListItem::into_file)
        .unwrap();
    assert_eq!(doomed.snapshot_time(), snapshot.snapshot_time());
    assert!(doomed.exists().await.unwrap());
    assert_eq!(doomed.length(), Some(7));
}

#[tokio::test]
async fn every_mutation_on_a_snapshot_fails_without_requests() {
    let (fx, snapshot) = snapshotted().await;
    let before = fx.service.request_count();

    let mut existing = snapshot.directory("frozen").unwrap();
    let mut fresh = snapshot.directory("frozen/new").unwrap();
    let mut file = snapshot.file("frozen/kept.txt").unwrap();
    let mut root = snapshot.root_directory();

    assert_invalid_operation(fresh.create().await);
    assert_invalid_operation(fresh.create_if_not_exists().await);
    assert_invalid_operation(root.create_if_not_exists().await);
    assert_invalid_operation(existing.delete().await);
    assert_invalid_operation(existing.delete_if_exists().await);
    existing
        .properties_mut()
        .set_ntfs_attributes(fileshare::NtfsAttributes::HIDDEN);
    assert_invalid_operation(existing.set_properties().await);
    existing.metadata_mut().set("state", "mutated").unwrap();
    assert_invalid_operation(existing.set_metadata().await);

    assert_invalid_operation(file.create(1).await);
    assert_invalid_operation(file.delete().await);
    assert_invalid_operation(file.resize(99).await);
    assert_invalid_operation(file.set_metadata().await);

    assert_eq!(fx.service.request_count(), before);
    // Staged values survive the rejected call.
    assert!(existing.properties().has_pending());

    let mut live = snapshot.base_share().directory("frozen/new").unwrap();
    assert!(!live.exists().await.unwrap());
    let mut kept = fx.share.file("frozen/kept.txt").unwrap();
    kept.fetch_attributes().await.unwrap();
    assert_eq!(kept.length(), Some(5));
}

#[tokio::test]
async fn base_share_of_a_snapshot_is_live() {
    let (fx, snapshot) = snapshotted().await;
    let base = snapshot.base_share();
    assert!(!base.is_snapshot());
    assert_eq!(base, fx.share);
    assert_eq!(base.uri(), snapshot.uri());
    assert_ne!(base, snapshot);

    let mut dir = base.directory("frozen/fresh").unwrap();
    dir.create().await.unwrap();
}

#[tokio::test]
async fn snapshot_has_no_open_handles() {
    let (fx, snapshot) = snapshotted().await;
    let address = fx.share.directory("frozen").unwrap().address().clone();
    fx.service.open_handle(&address).unwrap();

    let dir = snapshot.directory("frozen").unwrap();
    let handles = dir.all_handles(&HandleOptions::default()).await.unwrap();
    assert!(handles.is_empty());
    assert_eq!(dir.close_all_handles(None).await.unwrap(), 0);
    assert_eq!(fx.service.open_handle_count(SHARE), 1);
}

#[tokio::test]
async fn unknown_snapshot_time_is_share_not_found() {
    let (_fx, snapshot) = snapshotted().await;
    let time = snapshot.snapshot_time().unwrap() + Duration::hours(1);
    let missing = snapshot.snapshot(time);
    assert!(!missing.exists().await.unwrap());

    let mut dir = missing.directory("frozen").unwrap();
    let err = dir.exists().await.unwrap_err();
    assert!(matches!(
        err,
        ShareError::NotFound {
            kind: NotFoundKind::Share,
            ..
        }
    ));
}
