use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::asn::AsnTable;
use crate::config::RetryConfig;
use crate::fetch::Fetcher;
use crate::source::SourceContext;

/// Context with a zero-backoff fetcher and an empty ASN table
pub(crate) fn context() -> SourceContext {
    let fetcher = Fetcher::builder()
        .retry(RetryConfig::new().initial_backoff(Duration::ZERO))
        .build()
        .unwrap();
    SourceContext::new(fetcher, Arc::new(AsnTable::from_text("")))
}

/// Start a server answering GET `route` with `body`
pub(crate) async fn mock_text(route: &str, body: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_text(&server, route, body).await;
    server
}

/// Mount one more GET `route` on an existing server
pub(crate) async fn mount_text(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mount a GET `route` failing with `status`
pub(crate) async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
