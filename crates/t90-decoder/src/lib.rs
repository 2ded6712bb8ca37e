//! Maxus T90 EV telemetry decoder.
//!
//! Turns native CAN frames and extended OBD-II poll replies into
//! range-checked metric writes:
//! - `registry` maps message ids / PIDs to decode rules
//! - `filters` holds the per-signal scaling and plausibility checks
//! - `derived` combines independently arriving inputs (AC power, capacity)
//! - `poll` owns the poll list and the poll-rate state machine
//! - `Maxt90Decoder` dispatches frames and replies to the above

pub mod bytes;
pub mod can;
pub mod decoder;
pub mod derived;
pub mod error;
pub mod filters;
pub mod mock;
pub mod obd;
pub mod poll;
pub mod registry;
pub mod sink;
pub mod types;

pub use decoder::{DecoderConfig, Maxt90Decoder};
pub use error::{DecodeResult, Rejection};
pub use mock::MockMetricSink;
pub use sink::MetricSink;
pub use types::{CanFrame, DecodedSignal, PollReply, SignalId};
