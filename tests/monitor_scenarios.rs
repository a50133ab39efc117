//! End-to-end iteration scenarios over scripted probes and a fake broker

mod common;

use common::{minute, monitor, FakeBroker, ScriptedConnectivityProbe, ScriptedThroughputProbe, Step};
use linkwatch::config::Config;
use linkwatch::scheduler::{Monitor, SpeedTestStatus};
use serde_json::Value;

fn measurement(payload: &str) -> Value {
    serde_json::from_str(payload).expect("measurement payload should be JSON")
}

#[tokio::test]
async fn test_targets_rotate_round_robin() {
    let mut config = Config::default();
    config.probe.targets = ["A", "B", "C", "D"].iter().map(|t| t.to_string()).collect();

    let (broker, _state) = FakeBroker::new(true);
    let (probe, targets) = ScriptedConnectivityProbe::new(&[]);
    let (speed, _) = ScriptedThroughputProbe::new(false);
    let mut monitor = Monitor::new(&config, Box::new(probe), Box::new(speed), broker).unwrap();

    for m in 0..5 {
        monitor.run_iteration(minute(m)).await;
    }

    assert_eq!(*targets.lock().unwrap(), vec!["A", "B", "C", "D", "A"]);
}

#[tokio::test]
async fn test_outage_resolution_alert_and_drain() {
    let (broker, state) = FakeBroker::new(true);
    let mut monitor = monitor(
        &Config::default(),
        &[Step::Up, Step::Down, Step::Down, Step::Up],
        false,
        broker,
    );

    let first = monitor.run_iteration(minute(0)).await;
    assert_eq!(first.success, Some(true));
    assert!(first.published);
    assert!(!monitor.outage().is_outage());

    // Broker unreachable while the link is down
    state.set_up(false);
    monitor.run_iteration(minute(1)).await;
    assert!(monitor.outage().is_outage());
    assert_eq!(monitor.outage().state().started_at, Some(minute(1)));

    let second_failure = monitor.run_iteration(minute(2)).await;
    assert_eq!(second_failure.drain, None);
    assert_eq!(second_failure.alert, None);
    assert_eq!(monitor.outage().state().started_at, Some(minute(1)));
    assert_eq!(monitor.pending().len(), 2);

    state.set_up(true);
    let recovered = monitor.run_iteration(minute(3)).await;

    assert_eq!(
        recovered.alert.as_deref(),
        Some("Internet outage resolved. Outage duration: 0:02:00")
    );
    assert_eq!(recovered.drain.map(|d| d.delivered), Some(2));
    assert_eq!(recovered.pending, 0);
    assert!(!monitor.outage().is_outage());

    let published = state.published();
    let topics: Vec<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "/home/net-monitor",
            "/home/net-monitor",
            "/home/net-monitor",
            "/home/net-monitor",
            "/alerts/info",
        ]
    );

    // Fresh result first, then the two buffered failures in order
    let order: Vec<f64> = published[1..4]
        .iter()
        .map(|(_, p)| measurement(p)["response_time_ms"].as_f64().unwrap())
        .collect();
    assert_eq!(order, vec![3.0, 1.0, 2.0]);
    assert_eq!(published[4].1, "Internet outage resolved. Outage duration: 0:02:00");
}

#[tokio::test]
async fn test_broker_outage_replays_in_order() {
    let (broker, state) = FakeBroker::new(false);
    let mut monitor = monitor(
        &Config::default(),
        &[Step::Down, Step::Down, Step::Down, Step::Up],
        false,
        broker,
    );

    for m in 0..3 {
        let report = monitor.run_iteration(minute(m)).await;
        assert!(!report.published);
        assert_eq!(report.pending, m as usize + 1);
    }

    assert!(monitor
        .pending()
        .iter()
        .all(|item| item.topic == "/home/net-monitor"));
    assert!(state.published().is_empty());

    state.set_up(true);
    let report = monitor.run_iteration(minute(3)).await;
    assert!(report.published);
    assert_eq!(report.pending, 0);
    assert!(report.alert.is_some());

    let published = state.published();
    // fresh result, three replays, alert
    assert_eq!(published.len(), 5);

    let replayed: Vec<(f64, bool)> = published[1..4]
        .iter()
        .map(|(_, p)| {
            let value = measurement(p);
            (
                value["response_time_ms"].as_f64().unwrap(),
                value["success"].as_bool().unwrap(),
            )
        })
        .collect();
    assert_eq!(replayed, vec![(0.0, false), (1.0, false), (2.0, false)]);

    // Every successful connect was paired with a disconnect
    assert_eq!(state.disconnects(), 5);
}

#[tokio::test]
async fn test_probe_fault_is_not_published_or_tracked() {
    let (broker, state) = FakeBroker::new(true);
    let mut monitor = monitor(
        &Config::default(),
        &[Step::Down, Step::Fault, Step::Up],
        false,
        broker,
    );

    monitor.run_iteration(minute(0)).await;
    assert!(monitor.outage().is_outage());
    let connects_before = state.connects();

    let fault = monitor.run_iteration(minute(1)).await;
    assert_eq!(fault.success, None);
    assert!(!fault.published);
    assert_eq!(fault.drain, None);
    assert_eq!(state.connects(), connects_before);
    // Still down: the fault did not count as recovery
    assert!(monitor.outage().is_outage());

    let recovered = monitor.run_iteration(minute(2)).await;
    assert_eq!(
        recovered.alert.as_deref(),
        Some("Internet outage resolved. Outage duration: 0:02:00")
    );
}

#[tokio::test]
async fn test_failed_speed_test_is_dropped() {
    let (broker, state) = FakeBroker::new(false);
    let mut monitor = monitor(&Config::default(), &[Step::Fault], false, broker);

    let report = monitor.run_iteration(minute(0)).await;

    assert_eq!(report.speed_test, SpeedTestStatus::Failed);
    assert_eq!(report.pending, 0);
    assert_eq!(state.connects(), 0);
}

#[tokio::test]
async fn test_speed_result_published_as_measurement() {
    let (broker, state) = FakeBroker::new(true);
    let mut monitor = monitor(&Config::default(), &[], true, broker);

    let report = monitor.run_iteration(minute(15)).await;
    assert_eq!(report.speed_test, SpeedTestStatus::Measured { published: true });

    let published = state.published();
    let speed = published
        .iter()
        .map(|(_, p)| measurement(p))
        .find(|v| v["type"] == 2)
        .expect("speed measurement published");

    assert_eq!(speed["download_speed"], 94.5);
    assert_eq!(speed["upload_speed"], 18.25);
    assert_eq!(speed["ping"], 11.0);
    assert!(speed.get("success").is_none());

    // Next minute is not the trigger minute
    let next = monitor.run_iteration(minute(16)).await;
    assert_eq!(next.speed_test, SpeedTestStatus::NotDue);
}
