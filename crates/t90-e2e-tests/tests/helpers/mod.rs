//! Shared test harness for scenario tests.
//!
//! Drives the agent's dispatcher (decoder + change-aware store) the same
//! way the binary does, with a synthetic clock.

#![allow(dead_code)]

use t90_agent::dispatch::{DispatchStats, Dispatcher};
use t90_agent::source::{BusEvent, CandumpSource};
use t90_decoder::{CanFrame, DecoderConfig, MetricSink, PollReply};
use t90_protocol::{Metric, MetricValue, MetricWrite, PollState};

/// Capture start used for all synthetic timestamps.
pub const T0: f64 = 1_700_000_000.0;

/// One vehicle: dispatcher plus every metric write it emitted.
pub struct VehicleHarness {
    pub dispatcher: Dispatcher,
    pub writes: Vec<MetricWrite>,
    pub transitions: Vec<PollState>,
    now: f64,
}

impl VehicleHarness {
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        let mut dispatcher = Dispatcher::new(&config);
        let writes = dispatcher.take_writes();
        Self {
            dispatcher,
            writes,
            transitions: Vec::new(),
            now: T0,
        }
    }

    /// Advance the synthetic clock.
    pub fn wait(&mut self, secs: f64) {
        self.now += secs;
    }

    /// Feed a native frame on the vehicle bus.
    pub fn frame(&mut self, id: u32, data: &[u8]) {
        self.frame_on(1, id, data);
    }

    pub fn frame_on(&mut self, bus: u8, id: u32, data: &[u8]) {
        let event = BusEvent::Frame {
            timestamp: self.now,
            frame: CanFrame::new(bus, id, data.to_vec()),
        };
        self.feed(event);
    }

    /// Feed an unwrapped poll reply.
    pub fn poll(&mut self, pid: u16, data: &[u8]) {
        let before = self.dispatcher.decoder().poll_state();
        let event = BusEvent::PollReply {
            timestamp: self.now,
            reply: PollReply::new(pid, data.to_vec()),
        };
        self.feed(event);
        let after = self.dispatcher.decoder().poll_state();
        if after != before {
            self.transitions.push(after);
        }
    }

    pub fn poll_u16(&mut self, pid: u16, raw: u16) {
        self.poll(pid, &raw.to_be_bytes());
    }

    /// READY reply with both ready bits set or clear.
    pub fn ready(&mut self, on: bool) {
        self.poll_u16(0xE004, if on { 0x000C } else { 0x0000 });
    }

    fn feed(&mut self, event: BusEvent) {
        let writes = self.dispatcher.handle(&event);
        self.writes.extend(writes);
    }

    pub fn value(&self, metric: Metric) -> Option<MetricValue> {
        self.dispatcher.store().get(metric)
    }

    pub fn float(&self, metric: Metric) -> Option<f64> {
        self.dispatcher.store().float(metric)
    }

    pub fn flag(&self, metric: Metric) -> bool {
        self.dispatcher.store().flag(metric)
    }

    pub fn poll_state(&self) -> PollState {
        self.dispatcher.decoder().poll_state()
    }

    /// Emitted writes for one metric, oldest first.
    pub fn writes_to(&self, metric: Metric) -> Vec<&MetricWrite> {
        self.writes.iter().filter(|w| w.metric == metric).collect()
    }

    pub fn stats(&self) -> &DispatchStats {
        self.dispatcher.stats()
    }
}

/// Replay a candump capture through the full agent pipeline, returning
/// run stats and the parsed JSON output.
pub async fn replay(capture: &'static str) -> (DispatchStats, Vec<MetricWrite>) {
    let source = CandumpSource::new(capture.as_bytes(), "can0", 1, false);
    let mut out = Vec::new();
    let stats = t90_agent::dispatch::run(source, &DecoderConfig::default(), &mut out)
        .await
        .unwrap();
    let writes = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    (stats, writes)
}
