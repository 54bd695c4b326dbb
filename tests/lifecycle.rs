mod common;

use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use common::{
    get, read_one_response, send, send_raw, start, test_config, test_providers,
    write_keep_alive_get,
};
use lightweight_actuator::actuator::{Health, HealthIndicator, Providers};
use lightweight_actuator::{ActuatorServer, ProviderError, ServerError};
use serde_json::json;

/// Health indicator that reports when it is entered, then blocks for `delay`
fn slow_indicator(delay: Duration) -> (Arc<dyn HealthIndicator>, mpsc::Receiver<()>) {
    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let indicator: Arc<dyn HealthIndicator> = Arc::new(move || -> Result<Health, ProviderError> {
        let _ = entered_tx.try_send(());
        thread::sleep(delay);
        Ok(Health::up())
    });
    (indicator, entered_rx)
}

#[test]
fn disabled_toggle_does_not_start_a_server() {
    let mut config = test_config();
    config.actuator.enabled = false;

    let server = ActuatorServer::start_if_enabled(&config, Providers::default()).unwrap();
    assert!(server.is_none());
}

#[test]
fn enabled_toggle_starts_a_server() {
    let server = ActuatorServer::start_if_enabled(&test_config(), test_providers())
        .unwrap()
        .expect("server should be enabled");

    assert_eq!(get(server.local_addr(), "/actuator/health").status, 200);
}

#[test]
fn stop_is_idempotent() {
    let server = start(test_providers());
    assert!(!server.is_stopping());

    server.stop();
    assert!(server.is_stopping());
    // Second call is a no-op and must not block or panic
    server.stop();
    assert!(server.is_stopping());
}

#[test]
fn concurrent_stop_calls_are_safe() {
    let server = Arc::new(start(test_providers()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || server.stop())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(server.is_stopping());
}

#[test]
fn connections_are_refused_after_stop() {
    let server = start(test_providers());
    let addr = server.local_addr();
    assert_eq!(get(addr, "/actuator/metrics").status, 200);

    server.stop();

    let result = TcpStream::connect_timeout(&addr, Duration::from_secs(1));
    assert!(result.is_err(), "port {addr} still accepts connections");
}

#[test]
fn drop_stops_the_server() {
    let server = start(test_providers());
    let addr = server.local_addr();
    drop(server);

    assert!(TcpStream::connect_timeout(&addr, Duration::from_secs(1)).is_err());
}

#[test]
fn idle_keep_alive_connection_does_not_delay_stop() {
    let server = start(test_providers());
    // Open a connection and never send a request
    let _idle = TcpStream::connect(server.local_addr()).unwrap();
    thread::sleep(Duration::from_millis(50));

    let started = std::time::Instant::now();
    server.stop();
    // Grace period in the test config is one second
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn port_in_use_fails_startup() {
    let first = start(test_providers());

    let mut config = test_config();
    config.server.port = first.local_addr().port();

    match ActuatorServer::start(&config, test_providers()) {
        Err(ServerError::Bind { addr, .. }) => assert_eq!(addr, first.local_addr()),
        other => panic!("expected bind error, got {other:?}"),
    }
}

#[test]
fn invalid_host_fails_startup() {
    let mut config = test_config();
    config.server.host = "not-an-address".to_string();

    assert!(matches!(
        ActuatorServer::start(&config, test_providers()),
        Err(ServerError::InvalidAddress(_))
    ));
}

#[test]
fn zero_workers_fails_startup() {
    let mut config = test_config();
    config.server.workers = Some(0);

    assert!(matches!(
        ActuatorServer::start(&config, test_providers()),
        Err(ServerError::InvalidWorkers(0))
    ));
}

#[test]
fn in_flight_request_finishing_within_grace_gets_its_response() {
    let (indicator, entered) = slow_indicator(Duration::from_millis(300));
    let server = start(test_providers().with_health(indicator));
    let addr = server.local_addr();

    let client = thread::spawn(move || send(addr, "GET", "/actuator/health"));
    entered.recv_timeout(Duration::from_secs(5)).unwrap();
    server.stop();

    let resp = client.join().unwrap().unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!([{ "status": "UP" }]));
}

#[test]
fn stop_is_bounded_when_a_provider_outlives_the_grace_period() {
    let (indicator, entered) = slow_indicator(Duration::from_secs(4));
    let server = start(test_providers().with_health(indicator));
    let addr = server.local_addr();

    let client = thread::spawn(move || send_raw(addr, "GET", "/actuator/health"));
    entered.recv_timeout(Duration::from_secs(5)).unwrap();

    let started = Instant::now();
    server.stop();
    // One second of grace plus the force-close window
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "stop took {:?}",
        started.elapsed()
    );

    match client.join().unwrap() {
        Ok(raw) => assert!(raw.is_empty(), "got a response after stop: {raw:?}"),
        Err(e) => assert!(
            !matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
            "connection was left open: {e}"
        ),
    }
}

#[test]
fn idle_keep_alive_connection_closes_after_timeout() {
    let mut config = test_config();
    config.performance.keep_alive_timeout = 1;
    config.performance.read_timeout = 10;
    let server = ActuatorServer::start(&config, test_providers()).unwrap();

    let mut stream = TcpStream::connect(server.local_addr()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    write_keep_alive_get(&mut stream, "/actuator/metrics").unwrap();

    let started = Instant::now();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();

    assert!(raw.starts_with(b"HTTP/1.1 200"));
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "idle connection stayed open for {:?}",
        started.elapsed()
    );
}

#[test]
fn keep_alive_connection_is_not_capped_by_a_lifetime_limit() {
    let mut config = test_config();
    config.performance.keep_alive_timeout = 2;
    config.performance.read_timeout = 2;
    let server = ActuatorServer::start(&config, test_providers()).unwrap();

    let mut stream = TcpStream::connect(server.local_addr()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    // Four requests one second apart keep the connection busy past both timeouts
    for round in 0..4 {
        if round > 0 {
            thread::sleep(Duration::from_secs(1));
        }
        write_keep_alive_get(&mut stream, "/actuator/metrics").unwrap();
        let resp = read_one_response(&mut stream).unwrap();
        assert_eq!(resp.status, 200, "request {round} failed");
        assert_eq!(resp.json(), json!(["a.first", "b.second", "c.third"]));
    }
}
