//! Skips wiremock-based tests on hosts where localhost sockets cannot be bound.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "WGET_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when localhost cannot be bound.
///
/// Panics instead of skipping when `WGET_REQUIRE_SOCKET_TESTS` is set.
#[allow(dead_code)]
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }

    let message = "[socket-bound-test] cannot bind a localhost socket; mock HTTP test cannot run here";
    assert!(
        !sockets_required(),
        "{message}. Unset {REQUIRE_SOCKETS_ENV} to allow skipping."
    );
    eprintln!("{message}. Skipping. Set {REQUIRE_SOCKETS_ENV}=1 to fail instead.");
    None
}
