use crate::integration::common::fixture;
use fileshare::ShareError;

#[tokio::test]
async fn metadata_round_trip_is_case_insensitive() {
    let fx = fixture();
    let mut dir = fx.share.directory("meta").unwrap();
    dir.create().await.unwrap();

    dir.metadata_mut().set("key1", "value1").unwrap();
    dir.set_metadata().await.unwrap();

    let mut second = fx.share.directory("meta").unwrap();
    second.fetch_attributes().await.unwrap();
    assert_eq!(second.metadata().len(), 1);
    assert_eq!(second.metadata().get("KEY1"), Some("value1"));
}

#[tokio::test]
async fn metadata_sent_with_create() {
    let fx = fixture();
    let mut file = fx.share.file("tagged.txt").unwrap();
    file.metadata_mut().set("Owner", "ops").unwrap();
    file.metadata_mut().set("stage", "draft").unwrap();
    file.create(0).await.unwrap();

    let mut reread = fx.share.file("tagged.txt").unwrap();
    assert!(reread.exists().await.unwrap());
    assert_eq!(reread.metadata().len(), 2);
    assert_eq!(reread.metadata().get("owner"), Some("ops"));
}

#[tokio::test]
async fn set_metadata_replaces_the_whole_map() {
    let fx = fixture();
    let mut dir = fx.share.directory("replace").unwrap();
    dir.metadata_mut().set("a", "1").unwrap();
    dir.metadata_mut().set("b", "2").unwrap();
    dir.create().await.unwrap();

    dir.metadata_mut().remove("a");
    dir.set_metadata().await.unwrap();

    let mut reread = fx.share.directory("replace").unwrap();
    reread.fetch_attributes().await.unwrap();
    assert!(!reread.metadata().contains_key("a"));
    assert_eq!(reread.metadata().get("B"), Some("2"));
}

#[tokio::test]
async fn empty_value_fails_before_any_request() {
    let fx = fixture();
    let mut dir = fx.share.directory("strict").unwrap();
    dir.create().await.unwrap();
    let before = fx.service.request_count();

    let err = dir.metadata_mut().set("key", "").unwrap_err();
    assert!(matches!(err, ShareError::InvalidArgument(_)));
    assert!(dir.metadata().is_empty());
    assert_eq!(fx.service.request_count(), before);
}

#[tokio::test]
async fn fetch_replaces_local_metadata() {
    let fx = fixture();
    let mut dir = fx.share.directory("overwrite").unwrap();
    dir.create().await.unwrap();
    dir.metadata_mut().set("local", "only").unwrap();

    dir.fetch_attributes().await.unwrap();
    assert!(dir.metadata().is_empty());
}

#[tokio::test]
async fn empty_local_map_clears_server_metadata() {
    let fx = fixture();
    let mut dir = fx.share.directory("cleared").unwrap();
    dir.metadata_mut().set("a", "1").unwrap();
    dir.create().await.unwrap();

    dir.metadata_mut().clear();
    dir.set_metadata().await.unwrap();

    let mut reread = fx.share.directory("cleared").unwrap();
    reread.fetch_attributes().await.unwrap();
    assert!(reread.metadata().is_empty());
}
