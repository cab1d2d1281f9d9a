use crate::integration::common::{fixture_with, Fixture, BASE_URI, SHARE};
use fileshare::segment::is_terminal;
use fileshare::{
    ClientConfig, ContinuationToken, HandleOptions, InMemoryShareService, ShareError,
    ShareServiceClient, TokenKind,
};
use std::collections::HashSet;

/// Share with `root/dir/file.txt` and `root/dir/sub/`; handles are opened by each test.
async fn tree(handle_page_size: u32) -> Fixture {
    let fx = fixture_with(InMemoryShareService::new(BASE_URI).with_handle_page_size(handle_page_size));
    let mut dir = fx.share.directory("dir").unwrap();
    dir.create().await.unwrap();
    dir.get_directory("sub").unwrap().create().await.unwrap();
    dir.get_file("file.txt").unwrap().create(1).await.unwrap();
    fx
}

fn open(fx: &Fixture, path: &str, count: usize) -> Vec<String> {
    let address = fx.share.directory(path).unwrap().address().clone();
    (0..count)
        .map(|_| fx.service.open_handle(&address).unwrap())
        .collect()
}

#[tokio::test]
async fn handle_listing_ends_with_empty_marker() {
    let fx = tree(2).await;
    let opened = open(&fx, "dir", 5);
    let dir = fx.share.directory("dir").unwrap();

    let mut token: Option<ContinuationToken> = None;
    let mut seen = Vec::new();
    let mut pages = 0;
    loop {
        let segment = dir
            .list_handles_segmented(token.as_ref(), &HandleOptions::default())
            .await
            .unwrap();
        pages += 1;
        seen.extend(segment.items.into_iter().map(|h| h.handle_id));
        let next = segment.continuation.expect("handle pages always carry a token");
        assert_eq!(next.kind(), TokenKind::Handles);
        if is_terminal(Some(&next)) {
            assert_eq!(next.next_marker(), "");
            break;
        }
        token = Some(next);
    }
    assert_eq!(pages, 3);
    assert_eq!(seen, opened);
}

#[tokio::test]
async fn all_handles_respects_recursion() {
    let fx = tree(100).await;
    open(&fx, "dir", 2);
    open(&fx, "dir/sub", 3);
    open(&fx, "dir/file.txt", 1);
    let dir = fx.share.directory("dir").unwrap();

    let flat = dir.all_handles(&HandleOptions::default()).await.unwrap();
    assert_eq!(flat.len(), 2);
    assert!(flat.iter().all(|h| h.path == "dir"));

    let deep = dir
        .all_handles(&HandleOptions::default().recursive(true).with_page_size(2))
        .await
        .unwrap();
    assert_eq!(deep.len(), 6);
    let paths: HashSet<&str> = deep.iter().map(|h| h.path.as_str()).collect();
    let expected: HashSet<&str> = ["dir", "dir/sub", "dir/file.txt"].into_iter().collect();
    assert_eq!(paths, expected);
}

#[tokio::test]
async fn file_handles_report_file_and_parent_ids() {
    let fx = tree(100).await;
    open(&fx, "dir/file.txt", 2);
    let mut file = fx.share.file("dir/file.txt").unwrap();
    file.fetch_attributes().await.unwrap();
    let mut dir = file.parent();
    dir.fetch_attributes().await.unwrap();

    let handles = file
        .all_handles(&HandleOptions::default().recursive(true))
        .await
        .unwrap();
    assert_eq!(handles.len(), 2);
    for handle in &handles {
        assert_eq!(Some(handle.file_id.as_str()), file.properties().file_id());
        assert_eq!(Some(handle.parent_id.as_str()), dir.properties().file_id());
        assert_eq!(handle.client_ip, "127.0.0.1");
    }
}

#[tokio::test]
async fn close_single_handle_by_id() {
    let fx = tree(100).await;
    let ids = open(&fx, "dir/file.txt", 2);
    let file = fx.share.file("dir/file.txt").unwrap();

    let page = file.close_handle_segmented(&ids[0], None).await.unwrap();
    assert_eq!(page.closed_count, 1);
    assert!(page.continuation.is_none());

    let again = file.close_handle_segmented(&ids[0], None).await.unwrap();
    assert_eq!(again.closed_count, 0);
    assert_eq!(fx.service.open_handle_count(SHARE), 1);

    assert!(matches!(
        file.close_handle_segmented("", None).await,
        Err(ShareError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn close_handle_by_id_from_an_ancestor_directory() {
    let fx = tree(100).await;
    let ids = open(&fx, "dir/sub", 1);
    let dir = fx.share.directory("dir").unwrap();
    let page = dir.close_handle_segmented(&ids[0], None).await.unwrap();
    assert_eq!(page.closed_count, 1);
    assert_eq!(fx.service.open_handle_count(SHARE), 0);
}

#[tokio::test]
async fn close_all_handles_sums_every_page() {
    let fx = tree(2).await;
    open(&fx, "dir", 3);
    open(&fx, "dir/sub", 2);
    let dir = fx.share.directory("dir").unwrap();

    let mut closer = dir.close_handles(Some(true));
    let mut pages = 0;
    let mut closed = 0;
    while let Some(reports) = closer.next_segment().await.unwrap() {
        pages += 1;
        closed += reports.iter().map(|r| r.closed).sum::<u32>();
    }
    assert_eq!(pages, 3);
    assert_eq!(closed, 5);
    assert_eq!(fx.service.open_handle_count(SHARE), 0);

    assert_eq!(dir.close_all_handles(Some(true)).await.unwrap(), 0);
}

#[tokio::test]
async fn non_recursive_close_leaves_descendant_handles() {
    let fx = tree(100).await;
    open(&fx, "dir", 2);
    open(&fx, "dir/sub", 2);
    let dir = fx.share.directory("dir").unwrap();
    assert_eq!(dir.close_all_handles(Some(false)).await.unwrap(), 2);
    assert_eq!(fx.service.open_handle_count(SHARE), 2);
}

#[tokio::test]
async fn close_rejects_listing_token() {
    let fx = tree(100).await;
    let dir = fx.share.directory("dir").unwrap();
    let token = ContinuationToken::new(TokenKind::Listing, "sub");
    let before = fx.service.request_count();
    assert!(matches!(
        dir.close_handles_segmented(Some(&token), None).await,
        Err(ShareError::InvalidArgument(_))
    ));
    assert_eq!(fx.service.request_count(), before);
}

#[tokio::test]
async fn recursion_default_comes_from_config() {
    let fx = tree(100).await;
    open(&fx, "dir/sub", 2);

    let mut config = ClientConfig::default();
    config.handles.recursive_by_default = true;
    let client = ShareServiceClient::with_config(BASE_URI, fx.service.clone(), config).unwrap();
    let dir = client.share(SHARE).unwrap().directory("dir").unwrap();

    let handles = dir.all_handles(&HandleOptions::default()).await.unwrap();
    assert_eq!(handles.len(), 2);
    let flat = dir
        .all_handles(&HandleOptions::default().recursive(false))
        .await
        .unwrap();
    assert!(flat.is_empty());
}
