//! Request/response correlation.
//!
//! The wire protocol has no correlation id, so matching a response to its
//! request relies entirely on admission control: the connection's send lock
//! admits at most one response-expecting command at a time, and this module
//! holds the single pending-request slot for it.
//!
//! Each registered request is tagged with a generation number. The timeout
//! path only evicts the slot if the generation still matches, so a frame
//! that races the deadline resolves exactly one waiter and a frame arriving
//! after eviction finds no slot instead of waking the wrong caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use sparklink_protocol::ResponseFrame;
use tokio::sync::oneshot;

use crate::error::ClientError;

/// The single in-flight request awaiting a response frame.
struct PendingRequest {
    /// Opcode the response frame must echo.
    expected_opcode: u8,
    /// Generation tag for timeout eviction.
    generation: u64,
    /// Completes the caller's wait. Consumed exactly once.
    reply: oneshot::Sender<Result<ResponseFrame, ClientError>>,
}

/// Owns the pending-request slot and resolves it against inbound frames.
///
/// `register` runs on the caller's task (under the send lock); `deliver` and
/// `close` run on the reader task and shutdown path. The slot mutex is only
/// held for slot manipulation, never across a wait.
pub(crate) struct Correlator {
    slot: Mutex<Option<PendingRequest>>,
    next_generation: AtomicU64,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Correlator {
            slot: Mutex::new(None),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Register a pending request for `expected_opcode`.
    ///
    /// Returns the generation tag and the receiver the caller awaits.
    /// The send lock guarantees the slot is empty here; if a stale entry is
    /// somehow present its waiter is woken with `Closed` by the drop of its
    /// sender.
    pub(crate) fn register(
        &self,
        expected_opcode: u8,
    ) -> (u64, oneshot::Receiver<Result<ResponseFrame, ClientError>>) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (reply, rx) = oneshot::channel();

        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        debug_assert!(slot.is_none(), "send lock admitted a second request");
        *slot = Some(PendingRequest {
            expected_opcode,
            generation,
            reply,
        });

        (generation, rx)
    }

    /// Resolve the pending request against an inbound frame.
    ///
    /// A matching opcode completes the waiter with the frame; a mismatch
    /// completes it with `UnexpectedResponse`. If no request is registered
    /// the frame is handed back to the caller for telemetry routing.
    pub(crate) fn deliver(&self, frame: ResponseFrame) -> Option<ResponseFrame> {
        let pending = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };

        match pending {
            Some(request) => {
                let result = if frame.opcode == request.expected_opcode {
                    Ok(frame)
                } else {
                    Err(ClientError::UnexpectedResponse {
                        expected: request.expected_opcode,
                        actual: frame.opcode,
                    })
                };
                if request.reply.send(result).is_err() {
                    // The waiter's deadline fired between eviction and here.
                    log::warn!(
                        "discarding response 0x{:02X} for request (generation {}) that already timed out",
                        frame.opcode,
                        request.generation
                    );
                }
                None
            }
            None => Some(frame),
        }
    }

    /// Evict the pending request after its deadline elapsed.
    ///
    /// Only removes the slot if `generation` still matches; returns whether
    /// an eviction happened. A false return means a frame won the race and
    /// the slot now belongs to nobody (or a later request).
    pub(crate) fn evict(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(request) if request.generation == generation => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    /// Wake any pending waiter with `Closed` and discard the slot.
    pub(crate) fn close(&self) {
        let pending = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(request) = pending {
            let _ = request.reply.send(Err(ClientError::Closed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparklink_protocol::{CMD_ANALOG_READ, CMD_DIGITAL_READ};

    fn frame(opcode: u8) -> ResponseFrame {
        ResponseFrame {
            opcode,
            pin_or_port: 5,
            lsb: 1,
            msb: 0,
        }
    }

    #[test]
    fn test_matching_frame_resolves_waiter() {
        let correlator = Correlator::new();
        let (_generation, mut rx) = correlator.register(CMD_DIGITAL_READ);

        assert!(correlator.deliver(frame(CMD_DIGITAL_READ)).is_none());

        let result = rx.try_recv().expect("waiter should be resolved");
        assert_eq!(result.unwrap().opcode, CMD_DIGITAL_READ);
    }

    #[test]
    fn test_mismatched_opcode_fails_waiter() {
        let correlator = Correlator::new();
        let (_generation, mut rx) = correlator.register(CMD_DIGITAL_READ);

        assert!(correlator.deliver(frame(CMD_ANALOG_READ)).is_none());

        let result = rx.try_recv().expect("waiter should be resolved");
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedResponse {
                expected: CMD_DIGITAL_READ,
                actual: CMD_ANALOG_READ,
            })
        ));
    }

    #[test]
    fn test_frame_without_pending_request_is_handed_back() {
        let correlator = Correlator::new();
        let unmatched = correlator.deliver(frame(CMD_DIGITAL_READ));
        assert_eq!(unmatched, Some(frame(CMD_DIGITAL_READ)));
    }

    #[test]
    fn test_eviction_is_generation_checked() {
        let correlator = Correlator::new();

        let (first_generation, _rx) = correlator.register(CMD_DIGITAL_READ);
        assert!(correlator.evict(first_generation));
        // Slot is already empty; a second eviction is a no-op.
        assert!(!correlator.evict(first_generation));

        // A stale generation must not evict a newer request.
        let (second_generation, mut rx) = correlator.register(CMD_ANALOG_READ);
        assert!(!correlator.evict(first_generation));
        assert!(correlator.deliver(frame(CMD_ANALOG_READ)).is_none());
        assert!(rx.try_recv().expect("resolved").is_ok());
        assert!(!correlator.evict(second_generation));
    }

    #[test]
    fn test_close_wakes_waiter_with_closed() {
        let correlator = Correlator::new();
        let (_generation, mut rx) = correlator.register(CMD_DIGITAL_READ);

        correlator.close();

        let result = rx.try_recv().expect("waiter should be resolved");
        assert!(matches!(result, Err(ClientError::Closed)));
    }
}
