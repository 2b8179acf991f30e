//! Shim registry lifecycle: identity, stop/restart, concurrency, port retry.

mod common;

use common::client;
use reposhim_core::server::PortAllocator;
use reposhim_core::resolver::{IdentityResolver, ListingResolver};
use reposhim_core::{ShimManager, ShimServer, ShimSettings, Upstream, UpstreamKind};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn ephemeral() -> ShimSettings {
    ShimSettings {
        base_port: 0,
        io_threads: 1,
        ..ShimSettings::default()
    }
}

// Listings are fetched lazily, so an unreachable upstream is fine here.
fn listing(url: &str) -> Upstream {
    Upstream::new(url, UpstreamKind::Listing).unwrap()
}

#[test]
fn same_url_returns_same_instance() {
    let manager = ShimManager::new(ephemeral());
    let a = manager.get(&listing("http://127.0.0.1:9/plugins.xml")).unwrap();
    let b = manager.get(&listing("http://127.0.0.1:9/plugins.xml")).unwrap();
    let c = manager.get(&listing("http://127.0.0.1:9/plugins.xml/")).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &c));
    assert_eq!(manager.len(), 1);

    let found = manager.find(&Url::parse("http://127.0.0.1:9/plugins.xml").unwrap());
    assert!(found.is_some_and(|f| Arc::ptr_eq(&f, &a)));
}

#[test]
fn different_urls_get_different_listeners() {
    let manager = ShimManager::new(ephemeral());
    let a = manager.get(&listing("http://127.0.0.1:9/a.xml")).unwrap();
    let b = manager.get(&listing("http://127.0.0.1:9/b.xml")).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.port(), b.port());
    assert_eq!(manager.len(), 2);
}

#[test]
fn stop_then_get_starts_a_new_instance() {
    let manager = ShimManager::new(ephemeral());
    let upstream = listing("http://127.0.0.1:9/plugins.xml");
    let first = manager.get(&upstream).unwrap();
    assert_eq!(client::get(first.url().join("/x").unwrap().as_str()).status, 404);

    manager.stop(&upstream.url);
    assert!(first.is_closed());
    assert!(manager.is_empty());

    let second = manager.get(&upstream).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!second.is_closed());
    assert_eq!(client::get(second.url().join("/x").unwrap().as_str()).status, 404);

    // Stopping twice is harmless.
    manager.stop(&upstream.url);
    manager.stop(&upstream.url);
    first.close();
}

#[test]
fn concurrent_gets_start_one_listener() {
    let manager = ShimManager::new(ephemeral());
    let upstream = listing("http://127.0.0.1:9/plugins.xml");
    let shims: Vec<Arc<ShimServer>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| manager.get(&upstream).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(shims.iter().all(|s| Arc::ptr_eq(s, &shims[0])));
    assert_eq!(manager.len(), 1);
}

#[test]
fn stop_during_get_never_leaves_an_untracked_shim() {
    let manager = ShimManager::new(ephemeral());
    let upstream = listing("http://127.0.0.1:9/plugins.xml");
    for _ in 0..50 {
        let shim = std::thread::scope(|scope| {
            let getter = scope.spawn(|| manager.get(&upstream).unwrap());
            std::thread::sleep(Duration::from_micros(200));
            manager.stop(&upstream.url);
            getter.join().unwrap()
        });
        let tracked = manager
            .find(&upstream.url)
            .is_some_and(|found| Arc::ptr_eq(&found, &shim));
        assert!(shim.is_closed() || tracked);

        manager.stop(&upstream.url);
        assert!(shim.is_closed());
        assert!(manager.is_empty());
    }
}

#[test]
fn busy_base_port_is_skipped() {
    let holder = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_port = holder.local_addr().unwrap().port();
    if base_port > u16::MAX - 64 {
        return;
    }
    let manager = ShimManager::new(ShimSettings {
        base_port,
        io_threads: 1,
        ..ShimSettings::default()
    });
    let shim = manager.get(&listing("http://127.0.0.1:9/plugins.xml")).unwrap();
    assert!(shim.port() > base_port);
    assert_eq!(shim.url().port(), Some(shim.port()));
    assert_eq!(client::get(shim.url().join("/x").unwrap().as_str()).status, 404);
}

#[test]
fn close_is_idempotent() {
    let resolver = IdentityResolver::from(ListingResolver::new(
        Url::parse("http://127.0.0.1:9/plugins.xml").unwrap(),
        None,
    ));
    let shim = ShimServer::start("test", resolver, &ephemeral(), &PortAllocator::new()).unwrap();
    assert!(!shim.is_closed());
    shim.close();
    shim.close();
    assert!(shim.is_closed());
}

#[test]
fn close_all_stops_everything() {
    let manager = ShimManager::new(ephemeral());
    let a = manager.get(&listing("http://127.0.0.1:9/a.xml")).unwrap();
    let b = manager.get(&listing("http://127.0.0.1:9/b.xml")).unwrap();
    manager.close_all();
    assert!(a.is_closed() && b.is_closed());
    assert!(manager.is_empty());
}
