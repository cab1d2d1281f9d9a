use fileshare::{InMemoryShareService, Share, ShareServiceClient};
use std::sync::Arc;

pub const BASE_URI: &str = "https://account.file.example.net";
pub const SHARE: &str = "share";

pub struct Fixture {
    pub service: Arc<InMemoryShareService>,
    pub client: ShareServiceClient,
    pub share: Share,
}

/// Client bound to an emulated service with one existing share.
pub fn fixture() -> Fixture {
    fixture_with(InMemoryShareService::new(BASE_URI))
}

pub fn fixture_with(service: InMemoryShareService) -> Fixture {
    let service = Arc::new(service);
    service.create_share(SHARE).unwrap();
    let client = ShareServiceClient::new(BASE_URI, service.clone());
    let share = client.share(SHARE).unwrap();
    Fixture {
        service,
        client,
        share,
    }
}
