//! Single-task dispatch: one reader feeds events over a channel to the
//! task that owns the decoder and the metric store.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use t90_decoder::poll::{self, PollEntry};
use t90_decoder::{DecoderConfig, Maxt90Decoder};
use t90_protocol::{MetricWrite, PollState};

use crate::error::{AgentError, AgentResult};
use crate::source::{BusEvent, FrameSource};
use crate::store::{self, MetricStore};

/// Bounded queue depth between the reader and the dispatcher.
pub const CHANNEL_CAPACITY: usize = 256;

/// Counters reported when a run finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchStats {
    pub frames: u64,
    pub poll_replies: u64,
    pub metric_writes: u64,
    pub poll_transitions: u64,
    pub polls_due: u64,
    pub final_state: PollState,
}

/// Works out which PIDs the external poller would request as capture
/// time advances.
///
/// Intervals count from the second the current poll state was entered.
/// Every whole second up to the latest timestamp is evaluated exactly once,
/// including seconds in which no event arrived.
#[derive(Debug, Default)]
pub struct PollScheduler {
    state: PollState,
    state_since: Option<u64>,
    next_tick: Option<u64>,
}

fn whole_second(timestamp: f64) -> u64 {
    timestamp.max(0.0) as u64
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Entries due in every not yet evaluated second up to and including
    /// the one containing `timestamp`, oldest first.
    pub fn advance(&mut self, timestamp: f64) -> Vec<&'static PollEntry> {
        let tick = whole_second(timestamp);
        let since = *self.state_since.get_or_insert(tick);
        let from = self.next_tick.unwrap_or(tick);
        if from > tick {
            return Vec::new();
        }
        self.next_tick = Some(tick + 1);

        let state = self.state;
        (from..=tick)
            .flat_map(|t| poll::due(state, t.saturating_sub(since)))
            .collect()
    }

    /// Enter `state` at `timestamp`. The second containing `timestamp` is
    /// evaluated again under the new state by the next [`advance`](Self::advance).
    pub fn restart(&mut self, state: PollState, timestamp: f64) {
        let tick = whole_second(timestamp);
        self.state = state;
        self.state_since = Some(tick);
        self.next_tick = Some(tick);
    }
}

/// Owns all decode state. Exactly one exists per vehicle.
pub struct Dispatcher {
    decoder: Maxt90Decoder,
    store: MetricStore,
    scheduler: PollScheduler,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Build the decoder and publish its initial metrics.
    pub fn new(config: &DecoderConfig) -> Self {
        let decoder = Maxt90Decoder::new(config);
        let mut store = MetricStore::new();
        decoder.init_metrics(&mut store);
        Self {
            decoder,
            store,
            scheduler: PollScheduler::new(),
            stats: DispatchStats::default(),
        }
    }

    pub fn decoder(&self) -> &Maxt90Decoder {
        &self.decoder
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Metric writes queued before any event arrived.
    pub fn take_writes(&mut self) -> Vec<MetricWrite> {
        let writes = self.store.drain();
        self.stats.metric_writes += writes.len() as u64;
        writes
    }

    /// Decode one event and return the metric writes it produced.
    pub fn handle(&mut self, event: &BusEvent) -> Vec<MetricWrite> {
        let timestamp = event.timestamp();
        if let Some(time) = store::capture_time(timestamp) {
            self.store.set_clock(time);
        }

        self.schedule(timestamp);
        match event {
            BusEvent::Frame { frame, .. } => {
                self.stats.frames += 1;
                self.decoder.handle_frame(frame, &mut self.store);
            }
            BusEvent::PollReply { reply, .. } => {
                self.stats.poll_replies += 1;
                if let Some(state) = self.decoder.handle_poll_reply(reply, &mut self.store) {
                    self.stats.poll_transitions += 1;
                    tracing::info!(state = %state, pid = format_args!("0x{:04X}", reply.pid), "poll state changed");
                    self.scheduler.restart(state, timestamp);
                    self.schedule(timestamp);
                }
            }
        }

        self.take_writes()
    }

    fn schedule(&mut self, timestamp: f64) {
        let state = self.scheduler.state();
        for entry in self.scheduler.advance(timestamp) {
            self.stats.polls_due += 1;
            let request = poll::build_poll_request(entry.pid.pid());
            tracing::trace!(
                pid = entry.pid.name(),
                state = %state,
                id = format_args!("0x{:03X}", request.id),
                data = ?request.data,
                "poll due"
            );
        }
    }

    pub fn finish(mut self) -> DispatchStats {
        self.stats.final_state = self.decoder.poll_state();
        self.stats
    }
}

/// Read events from `source` until it is exhausted, then close the channel.
async fn read_events<S: FrameSource>(mut source: S, tx: mpsc::Sender<BusEvent>) -> AgentResult<()> {
    while let Some(event) = source.next_event().await? {
        if tx.send(event).await.is_err() {
            tracing::debug!("dispatcher gone, stopping reader");
            break;
        }
    }
    Ok(())
}

async fn emit<W: AsyncWrite + Unpin>(out: &mut W, writes: &[MetricWrite]) -> AgentResult<()> {
    for write in writes {
        tracing::debug!(
            metric = %write.metric,
            value = %write.value,
            unit = write.unit.map(|u| u.symbol()),
            "metric update"
        );
        let mut line = serde_json::to_string(write)?;
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
    }
    Ok(())
}

/// Run the pipeline to completion, writing each metric update to `out`
/// as a JSON line.
pub async fn run<S, W>(source: S, config: &DecoderConfig, mut out: W) -> AgentResult<DispatchStats>
where
    S: FrameSource + 'static,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let reader = tokio::spawn(read_events(source, tx));

    let mut dispatcher = Dispatcher::new(config);
    let initial = dispatcher.take_writes();
    emit(&mut out, &initial).await?;

    while let Some(event) = rx.recv().await {
        let writes = dispatcher.handle(&event);
        emit(&mut out, &writes).await?;
    }
    out.flush().await?;

    reader
        .await
        .map_err(|e| AgentError::Other(format!("reader task failed: {e}")))??;

    let stats = dispatcher.finish();
    tracing::info!(
        frames = stats.frames,
        poll_replies = stats.poll_replies,
        metric_writes = stats.metric_writes,
        poll_transitions = stats.poll_transitions,
        final_state = %stats.final_state,
        "replay finished"
    );
    Ok(stats)
}
