//! Bus event sources: candump replays, mocks, or other backends.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use t90_decoder::types::POLL_RESPONSE_ID;
use t90_decoder::{CanFrame, PollReply};

use crate::candump::{self, BusMap};
use crate::error::AgentResult;
use crate::isotp::{self, IsoTpAssembler};

/// Longest pause honoured between two replayed frames.
const MAX_REPLAY_GAP: Duration = Duration::from_secs(5);

/// One unit of work for the decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// Native broadcast frame.
    Frame { timestamp: f64, frame: CanFrame },
    /// Reassembled and unwrapped poll reply.
    PollReply { timestamp: f64, reply: PollReply },
}

impl BusEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            Self::Frame { timestamp, .. } | Self::PollReply { timestamp, .. } => *timestamp,
        }
    }
}

/// Abstraction over where bus events come from.
///
/// Enables mocking for tests and swappable backends (capture replay,
/// live socket).
#[async_trait]
pub trait FrameSource: Send {
    /// Next event, or `None` once the source is exhausted.
    async fn next_event(&mut self) -> AgentResult<Option<BusEvent>>;
}

/// Replays a `candump -l` capture.
///
/// Only the configured interface is replayed. Frames on the diagnostic
/// response id are reassembled and surface as [`BusEvent::PollReply`];
/// everything else passes through as frames.
pub struct CandumpSource<R> {
    lines: Lines<R>,
    line_number: usize,
    buses: BusMap,
    realtime: bool,
    last_timestamp: Option<f64>,
    isotp: IsoTpAssembler,
    skipped: usize,
}

impl CandumpSource<BufReader<tokio::fs::File>> {
    /// Open a capture file.
    pub async fn open(path: &str, interface: &str, vehicle_bus: u8, realtime: bool) -> AgentResult<Self> {
        let file = tokio::fs::File::open(path).await?;
        tracing::info!(path, interface, realtime, "replaying candump capture");
        Ok(Self::new(BufReader::new(file), interface, vehicle_bus, realtime))
    }
}

impl<R: AsyncBufRead + Unpin + Send> CandumpSource<R> {
    pub fn new(reader: R, interface: &str, vehicle_bus: u8, realtime: bool) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            buses: BusMap::new(interface, vehicle_bus),
            realtime,
            last_timestamp: None,
            isotp: IsoTpAssembler::new(),
            skipped: 0,
        }
    }

    /// Lines that failed to parse so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    async fn pace(&mut self, timestamp: f64) {
        if let (true, Some(last)) = (self.realtime, self.last_timestamp) {
            let gap = Duration::from_secs_f64((timestamp - last).max(0.0));
            tokio::time::sleep(gap.min(MAX_REPLAY_GAP)).await;
        }
        self.last_timestamp = Some(timestamp);
    }

    fn poll_reply(&mut self, frame: &CanFrame) -> Option<PollReply> {
        match self.isotp.push(&frame.data) {
            Ok(Some(payload)) => isotp::parse_poll_response(&payload),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(line = self.line_number, error = %e, "poll response dropped");
                None
            }
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for CandumpSource<R> {
    async fn next_event(&mut self) -> AgentResult<Option<BusEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            let record = match candump::parse_line(&line, self.line_number, &self.buses) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(error = %e, "skipping capture line");
                    continue;
                }
            };

            self.pace(record.timestamp).await;

            let frame = record.frame;
            if frame.id == POLL_RESPONSE_ID {
                if let Some(reply) = self.poll_reply(&frame) {
                    return Ok(Some(BusEvent::PollReply {
                        timestamp: record.timestamp,
                        reply,
                    }));
                }
                continue;
            }
            return Ok(Some(BusEvent::Frame {
                timestamp: record.timestamp,
                frame,
            }));
        }
        if self.isotp.in_progress() {
            tracing::debug!("capture ended inside a multi-frame poll response");
        }
        tracing::info!(lines = self.line_number, skipped = self.skipped, "capture exhausted");
        Ok(None)
    }
}

/// Mock source that hands out a fixed list of events.
#[derive(Debug, Default)]
pub struct MockFrameSource {
    events: VecDeque<BusEvent>,
}

impl MockFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source pre-loaded with events.
    pub fn with_events(events: Vec<BusEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl FrameSource for MockFrameSource {
    async fn next_event(&mut self) -> AgentResult<Option<BusEvent>> {
        Ok(self.events.pop_front())
    }
}
