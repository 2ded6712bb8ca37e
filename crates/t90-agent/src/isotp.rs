//! ISO-TP reassembly for poll responses and payload unwrapping.
//!
//! Frames arrive one at a time from a capture, so reassembly is a small
//! state machine fed frame by frame rather than a blocking receive loop.
//! Flow control is the requester's business; the assembler only listens.

use t90_decoder::PollReply;
use t90_decoder::types::{NEGATIVE_RESPONSE_SID, RESPONSE_SID_OFFSET, SERVICE_READ_DATA_BY_ID};

use crate::error::{AgentError, AgentResult};

// ISO-TP protocol control information, high nibble of byte 0.
const ISOTP_SF: u8 = 0x0;
const ISOTP_FF: u8 = 0x1;
const ISOTP_CF: u8 = 0x2;
const ISOTP_FC: u8 = 0x3;

/// Positive response SID for ReadDataByIdentifier.
pub const READ_DATA_BY_ID_RESPONSE: u8 = SERVICE_READ_DATA_BY_ID + RESPONSE_SID_OFFSET;

#[derive(Debug)]
struct Pending {
    total_len: usize,
    payload: Vec<u8>,
    next_seq: u8,
}

/// Reassembles ISO-TP messages from a single response id.
#[derive(Debug, Default)]
pub struct IsoTpAssembler {
    pending: Option<Pending>,
}

impl IsoTpAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a multi-frame message is partially received.
    pub fn in_progress(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one frame's data. Returns the complete message payload when
    /// the frame finishes one.
    ///
    /// Any error discards the message in progress.
    pub fn push(&mut self, data: &[u8]) -> AgentResult<Option<Vec<u8>>> {
        let Some(&pci) = data.first() else {
            return Err(AgentError::IsoTp("empty frame".into()));
        };

        match (pci >> 4) & 0x0F {
            ISOTP_SF => {
                self.pending = None;
                let len = (pci & 0x0F) as usize;
                if len == 0 || len + 1 > data.len() {
                    return Err(AgentError::IsoTp("invalid SF length".into()));
                }
                Ok(Some(data[1..1 + len].to_vec()))
            }
            ISOTP_FF => {
                self.pending = None;
                if data.len() < 2 {
                    return Err(AgentError::IsoTp("truncated FF".into()));
                }
                let total_len = (((pci & 0x0F) as usize) << 8) | (data[1] as usize);
                let mut payload = Vec::with_capacity(total_len);
                payload.extend_from_slice(&data[2..]);
                if payload.len() >= total_len {
                    payload.truncate(total_len);
                    return Ok(Some(payload));
                }
                self.pending = Some(Pending {
                    total_len,
                    payload,
                    next_seq: 1,
                });
                Ok(None)
            }
            ISOTP_CF => {
                let Some(mut pending) = self.pending.take() else {
                    return Err(AgentError::IsoTp("CF without FF".into()));
                };
                let seq = pci & 0x0F;
                if seq != pending.next_seq {
                    return Err(AgentError::IsoTp(format!(
                        "sequence mismatch: expected {}, got {seq}",
                        pending.next_seq
                    )));
                }

                let remaining = pending.total_len - pending.payload.len();
                let end = data.len().min(1 + remaining);
                pending.payload.extend_from_slice(&data[1..end]);

                if pending.payload.len() >= pending.total_len {
                    return Ok(Some(pending.payload));
                }
                pending.next_seq = (pending.next_seq + 1) & 0x0F;
                self.pending = Some(pending);
                Ok(None)
            }
            ISOTP_FC => Ok(None),
            other => {
                self.pending = None;
                Err(AgentError::IsoTp(format!("unexpected frame type 0x{other:X}")))
            }
        }
    }
}

/// Unwrap a reassembled ReadDataByIdentifier response into a poll reply.
///
/// Negative responses and anything that is not a `0x62` reply are dropped.
pub fn parse_poll_response(payload: &[u8]) -> Option<PollReply> {
    match payload {
        [READ_DATA_BY_ID_RESPONSE, hi, lo, rest @ ..] => {
            Some(PollReply::new(u16::from_be_bytes([*hi, *lo]), rest.to_vec()))
        }
        [NEGATIVE_RESPONSE_SID, service, nrc, ..] => {
            tracing::debug!(
                service = format_args!("0x{service:02X}"),
                nrc = format_args!("0x{nrc:02X}"),
                "negative poll response"
            );
            None
        }
        _ => {
            tracing::trace!(len = payload.len(), "unrecognised poll response");
            None
        }
    }
}
