use crate::integration::common::{fixture_with, BASE_URI};
use fileshare::{InMemoryShareService, ListOptions, NtfsAttributes};
use std::time::Duration;
use tokio::time::timeout;

const LATENCY: Duration = Duration::from_millis(200);
const DEADLINE: Duration = Duration::from_millis(10);

#[tokio::test]
async fn abandoned_page_fetch_leaves_enumerator_resumable() {
    let slow = fixture_with(InMemoryShareService::new(BASE_URI).with_latency(LATENCY));
    let mut slow_dir = slow.share.directory("slow").unwrap();
    slow_dir.create().await.unwrap();
    for name in ["a", "b", "c", "d", "e"] {
        slow_dir.get_directory(name).unwrap().create().await.unwrap();
    }

    let mut enumerator = slow_dir
        .list_items(ListOptions::default().with_page_size(2))
        .unwrap();
    let first = enumerator.next_segment().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    let token = enumerator.continuation().cloned();
    assert!(token.is_some());

    assert!(timeout(DEADLINE, enumerator.next_segment()).await.is_err());
    assert_eq!(enumerator.continuation(), token.as_ref());
    assert_eq!(enumerator.pages_fetched(), 1);
    assert!(!enumerator.is_finished());

    let mut names: Vec<String> = first.iter().map(|i| i.name().to_string()).collect();
    while let Some(page) = enumerator.next_segment().await.unwrap() {
        names.extend(page.iter().map(|i| i.name().to_string()));
    }
    assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn abandoned_first_fetch_starts_over_cleanly() {
    let fx = fixture_with(InMemoryShareService::new(BASE_URI).with_latency(LATENCY));
    let mut dir = fx.share.directory("once").unwrap();
    dir.create().await.unwrap();
    dir.get_directory("only").unwrap().create().await.unwrap();

    let mut enumerator = dir.list_items(ListOptions::default()).unwrap();
    assert!(timeout(DEADLINE, enumerator.next_segment()).await.is_err());
    assert!(enumerator.continuation().is_none());
    assert_eq!(enumerator.pages_fetched(), 0);

    let page = enumerator.next_segment().await.unwrap().unwrap();
    assert_eq!(page.len(), 1);
    assert!(enumerator.is_finished());
}

#[tokio::test]
async fn abandoned_create_keeps_staged_properties() {
    let fx = fixture_with(InMemoryShareService::new(BASE_URI).with_latency(LATENCY));
    let mut dir = fx.share.directory("late").unwrap();
    dir.properties_mut()
        .set_ntfs_attributes(NtfsAttributes::HIDDEN);

    assert!(timeout(DEADLINE, dir.create()).await.is_err());
    assert!(dir.properties().has_pending());
    assert!(dir.properties().confirmed_values().is_empty());

    dir.create().await.unwrap();
    assert!(!dir.properties().has_pending());
    assert!(dir
        .properties()
        .ntfs_attributes()
        .unwrap()
        .contains(NtfsAttributes::HIDDEN));
}
