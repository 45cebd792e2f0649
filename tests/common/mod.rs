//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use graceful_server::config::ServerConfig;
use tokio::net::TcpStream;

/// Default config listening on a fixed loopback port.
pub fn config_on(port: u16) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{port}");
    config
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..100 {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not start listening on {addr}");
}

/// Client that never reuses connections, so nothing stays in flight after a response.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
