//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use callback_proxy::config::{Mode, ProxyConfig};
use callback_proxy::{HttpServer, RegistryHandle, Shutdown};
use tokio::net::TcpListener;

/// A server running on an ephemeral port. Dropping it shuts the server down.
pub struct TestServer {
    pub addr: SocketAddr,
    pub registry: Option<RegistryHandle>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn registry(&self) -> &RegistryHandle {
        self.registry.as_ref().expect("not a proxy server")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

pub fn url_of(listener: &TcpListener) -> String {
    format!("http://{}", listener.local_addr().unwrap())
}

pub fn proxy_config(downstream: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.downstream_url = downstream.to_string();
    config
}

pub fn simulator_config(proxy: &str, callback_delay_ms: u64, reply_timeout_ms: u64) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.mode = Mode::Simulator;
    config.downstream_url = proxy.to_string();
    config.simulator.callback_delay_ms = callback_delay_ms;
    config.simulator.reply_timeout_ms = reply_timeout_ms;
    config
}

/// Start a proxy or simulator on an already bound listener.
pub fn start(config: ProxyConfig, listener: TcpListener) -> TestServer {
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let registry = server.registry();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        registry,
        shutdown,
    }
}

/// Start a proxy in front of a simulator, each knowing the other's address.
pub async fn start_pair(callback_delay_ms: u64, reply_timeout_ms: u64) -> (TestServer, TestServer) {
    let proxy_listener = bind().await;
    let simulator_listener = bind().await;

    let simulator = start(
        simulator_config(&url_of(&proxy_listener), callback_delay_ms, reply_timeout_ms),
        simulator_listener,
    );
    let proxy = start(proxy_config(&simulator.url()), proxy_listener);
    (proxy, simulator)
}

/// Start a programmable downstream service.
pub async fn start_downstream(router: Router) -> SocketAddr {
    let listener = bind().await;
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = bind().await;
    listener.local_addr().unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll until the registry holds at least `n` waiters.
pub async fn wait_for_waiters(registry: &RegistryHandle, n: usize) {
    for _ in 0..200 {
        if let Some(stats) = registry.stats().await {
            if stats.pending_waiters >= n {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("registry never reached {} waiters", n);
}
