//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use linkwatch::config::Config;
use linkwatch::models::{ConnectivityResult, SpeedResult};
use linkwatch::probe::{ConnectivityProbe, ProbeOutcome, ThroughputProbe};
use linkwatch::publish::{Broker, BrokerError, BrokerResult, BrokerSession};
use linkwatch::scheduler::Monitor;
use linkwatch::utils::error::ProbeError;

/// Shared state behind [`FakeBroker`], kept by the test for inspection
#[derive(Default)]
pub struct BrokerState {
    up: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    published: Mutex<Vec<(String, String)>>,
}

impl BrokerState {
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// `(topic, payload)` pairs in delivery order
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

/// In-memory broker that is either reachable or not
pub struct FakeBroker {
    state: Arc<BrokerState>,
}

impl FakeBroker {
    pub fn new(up: bool) -> (Arc<Self>, Arc<BrokerState>) {
        let state = Arc::new(BrokerState::default());
        state.set_up(up);
        (
            Arc::new(Self {
                state: Arc::clone(&state),
            }),
            state,
        )
    }
}

struct FakeSession {
    state: Arc<BrokerState>,
}

#[async_trait]
impl Broker for FakeBroker {
    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self) -> BrokerResult<Box<dyn BrokerSession>> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        if !self.state.up.load(Ordering::SeqCst) {
            return Err(BrokerError::Connect("connection refused".to_string()));
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl BrokerSession for FakeSession {
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> BrokerResult<()> {
        let text = String::from_utf8(payload).unwrap();
        self.state
            .published
            .lock()
            .unwrap()
            .push((topic.to_string(), text));
        Ok(())
    }

    async fn disconnect(self: Box<Self>) {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// One scripted connectivity outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
    Fault,
}

/// Connectivity probe replaying a script; `Up` once the script runs out
///
/// Each result carries its call index in `response_time_ms` so tests can
/// tell replayed messages apart.
pub struct ScriptedConnectivityProbe {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    targets: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnectivityProbe {
    pub fn new(script: &[Step]) -> (Self, Arc<Mutex<Vec<String>>>) {
        let targets = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                calls: AtomicUsize::new(0),
                targets: Arc::clone(&targets),
            },
            targets,
        )
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedConnectivityProbe {
    async fn check(&self, target: &str) -> ProbeOutcome {
        self.targets.lock().unwrap().push(target.to_string());
        let index = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Up);

        match step {
            Step::Up => ProbeOutcome::Reachable(ConnectivityResult::reachable(Utc::now(), 200, index)),
            Step::Down => ProbeOutcome::Unreachable(ConnectivityResult::unreachable(
                Utc::now(),
                None,
                index,
                "request timed out after 5s",
            )),
            Step::Fault => ProbeOutcome::Fault(ProbeError::Other("resolver crashed".to_string())),
        }
    }
}

/// Throughput probe that always succeeds or always fails
pub struct ScriptedThroughputProbe {
    succeed: bool,
    calls: Arc<AtomicUsize>,
}

impl ScriptedThroughputProbe {
    pub fn new(succeed: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                succeed,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl ThroughputProbe for ScriptedThroughputProbe {
    async fn measure(&self) -> Result<SpeedResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(SpeedResult::new(Utc::now(), 94.5, 18.25, 11.0))
        } else {
            Err(ProbeError::Timeout(45))
        }
    }
}

/// Wall-clock minute `n` of a fixed test hour
pub fn minute(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, n, 0).unwrap()
}

/// Monitor over scripted probes and a fake broker
pub fn monitor(
    config: &Config,
    script: &[Step],
    speed_succeeds: bool,
    broker: Arc<FakeBroker>,
) -> Monitor {
    let (connectivity, _) = ScriptedConnectivityProbe::new(script);
    let (throughput, _) = ScriptedThroughputProbe::new(speed_succeeds);
    Monitor::new(config, Box::new(connectivity), Box::new(throughput), broker).unwrap()
}
