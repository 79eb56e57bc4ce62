mod common;

use clashdock::config::{AppConfig, ControllerConfig, DiscoveryConfig, GeoipConfig, ProbeSite};
use clashdock::geoip::download_geoip;
use clashdock::probe::{
    probe_control_plane, ControlProbe, EgressProber, HttpControlProbe, ProbeError, PublicIpResolver, Verdict,
};
use clashdock::retry::RetryPolicy;
use clashdock::secret::ApiSecret;
use common::{closed_port, hang_up_listener, spawn_mock, temp_dir, CountingPause, GEOIP_BYTES};
use std::fs;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const TOKEN: &str = "integration-token";

fn controller_at(addr: SocketAddr) -> ControllerConfig {
    ControllerConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        max_attempts: 3,
        ..ControllerConfig::default()
    }
}

#[tokio::test]
async fn test_snapshot_from_live_controller() {
    let server = spawn_mock(TOKEN).await;
    let config = controller_at(server.addr);
    let probe = assert_ok!(HttpControlProbe::new(&config, ApiSecret::new(TOKEN)));
    let pause = CountingPause::default();

    let snapshot = probe_control_plane(&probe, RetryPolicy::from_controller(&config), &pause)
        .await
        .expect("controller answers");

    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["Proxy"].now.as_deref(), Some("HK 01"));
    assert_eq!(snapshot["Proxy"].all, vec!["HK 01", "JP 02"]);
    assert_eq!(snapshot["Streaming"].all, vec!["JP 02"]);
    assert_eq!(server.controller_hits(), 1);
    assert_eq!(pause.count(), 0);
}

#[tokio::test]
async fn test_wrong_token_is_not_retried() {
    let server = spawn_mock(TOKEN).await;
    let config = controller_at(server.addr);
    let probe = HttpControlProbe::new(&config, ApiSecret::new("stale-token")).unwrap();

    let response = assert_ok!(probe.get_proxies().await);
    assert_eq!(response.status, 401);

    let pause = CountingPause::default();
    let snapshot = probe_control_plane(&probe, RetryPolicy::from_controller(&config), &pause).await;
    assert!(snapshot.is_none());
    // one direct call above, one from the poller
    assert_eq!(server.controller_hits(), 2);
    assert_eq!(pause.count(), 0);
}

#[tokio::test]
async fn test_refused_connection_is_retried_until_exhausted() {
    let config = controller_at(closed_port().await);
    let probe = HttpControlProbe::new(&config, ApiSecret::new(TOKEN)).unwrap();

    let err = assert_err!(probe.get_proxies().await);
    assert!(matches!(err, ProbeError::Unreachable(_)));

    let pause = CountingPause::default();
    let policy = RetryPolicy::new(3, Duration::from_secs(2));
    assert!(probe_control_plane(&probe, policy, &pause).await.is_none());
    assert_eq!(
        pause.pauses.lock().unwrap().as_slice(),
        &[Duration::from_secs(2), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn test_dropped_connection_is_retried_until_exhausted() {
    let (addr, accepted) = hang_up_listener().await;
    let config = controller_at(addr);
    let probe = HttpControlProbe::new(&config, ApiSecret::new(TOKEN)).unwrap();

    let err = assert_err!(probe.get_proxies().await);
    assert!(matches!(err, ProbeError::Unreachable(_)), "got {:?}", err);

    let pause = CountingPause::default();
    let policy = RetryPolicy::new(3, Duration::from_secs(2));
    assert!(probe_control_plane(&probe, policy, &pause).await.is_none());
    assert_eq!(pause.count(), 2);
    // one direct call above, then every poller attempt reached the socket
    assert!(accepted.load(Ordering::SeqCst) >= 4);
}

#[tokio::test]
async fn test_egress_through_proxy_port() {
    // The mock doubles as the HTTP proxy: requests arrive in absolute form
    // and are routed by path.
    let server = spawn_mock(TOKEN).await;
    let mut config = AppConfig::default();
    config.proxy.host = server.addr.ip().to_string();
    config.proxy.port = server.addr.port();
    config.probe.direct_target = format!("http://{}/", closed_port().await);
    config.probe.direct_timeout_secs = 2;
    config.probe.site_timeout_secs = 5;

    let sites = vec![
        ProbeSite::new("Reachable", "http://probe.invalid/ok"),
        ProbeSite::new("Missing", "http://probe.invalid/missing"),
    ];
    let prober = EgressProber::new(&config).unwrap();
    let pause = CountingPause::default();
    let report = prober
        .probe_after(&sites, Duration::from_secs(config.probe.warmup_secs), &pause)
        .await;

    assert_eq!(report.success, 1);
    assert_eq!(report.total, 2);
    assert!(!report.direct_reachable);
    assert_eq!(report.verdict(), Verdict::Degraded);
    assert_eq!(pause.count(), 1);
}

#[tokio::test]
async fn test_public_ip_takes_first_usable_answer() {
    let server = spawn_mock(TOKEN).await;
    let config = DiscoveryConfig {
        ip_services: vec![
            format!("http://{}/", closed_port().await),
            server.url("/missing"),
            server.url("/blank"),
            server.url("/ip"),
        ],
        timeout_secs: 2,
    };

    let resolver = PublicIpResolver::new(&config).unwrap();
    assert_eq!(resolver.resolve().await.as_deref(), Some("203.0.113.9"));

    let none = PublicIpResolver::new(&DiscoveryConfig {
        ip_services: vec![server.url("/missing")],
        timeout_secs: 2,
    })
    .unwrap();
    assert_eq!(none.resolve().await, None);
}

#[tokio::test]
async fn test_geoip_download() {
    let server = spawn_mock(TOKEN).await;
    let dir = temp_dir("geoip");
    let dest = dir.join("Country.mmdb");

    let config = GeoipConfig {
        enabled: true,
        url: server.url("/Country.mmdb"),
        timeout_secs: 5,
    };
    let size = assert_ok!(download_geoip(&config, &dest).await);
    assert_eq!(size, GEOIP_BYTES.len() as u64);
    assert_eq!(fs::read(&dest).unwrap(), GEOIP_BYTES);

    let missing = GeoipConfig {
        url: server.url("/missing"),
        ..config
    };
    let other = dir.join("Other.mmdb");
    assert_err!(download_geoip(&missing, &other).await);
    assert!(!other.exists());

    let _ = fs::remove_dir_all(&dir);
}
