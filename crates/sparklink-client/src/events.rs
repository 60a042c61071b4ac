//! Unsolicited telemetry dispatch.
//!
//! Frames carrying the reporting opcode (and solicited-looking frames that
//! arrive with no request outstanding) are published here instead of
//! resolving a request. Dispatch goes through a bounded broadcast channel:
//! publishing never blocks the reader task, and a subscriber that falls
//! behind lags (sees `RecvError::Lagged`) rather than stalling I/O.

use sparklink_protocol::ResponseFrame;
use tokio::sync::broadcast;

/// A pin value update from the controller.
///
/// The wire does not say whether a report is digital or analog; the
/// subscriber knows which reporting kind it enabled for the pin, so both
/// interpretations are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// GPIO pin (or port) the update is for.
    pub gpio: u8,
    /// Raw value, joined from the frame's 7-bit bytes.
    pub value: u16,
}

impl PinEvent {
    /// The update as a digital level (non-zero means high).
    pub fn digital(&self) -> bool {
        self.value != 0
    }

    /// The update as an analog reading.
    pub fn analog(&self) -> u16 {
        self.value
    }
}

/// Fans telemetry frames out to subscribers.
pub(crate) struct EventDispatcher {
    tx: broadcast::Sender<PinEvent>,
}

impl EventDispatcher {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        EventDispatcher { tx }
    }

    /// Subscribe to pin updates. Dropping the receiver unsubscribes.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<PinEvent> {
        self.tx.subscribe()
    }

    /// Publish a telemetry frame to all current subscribers.
    pub(crate) fn publish(&self, frame: &ResponseFrame) {
        let event = PinEvent {
            gpio: frame.pin_or_port,
            value: frame.analog_value(),
        };
        // Telemetry is best-effort; with no subscribers the send fails and
        // the update is dropped.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparklink_protocol::CMD_REPORTING;

    #[test]
    fn test_publish_reaches_subscriber() {
        let dispatcher = EventDispatcher::new(8);
        let mut rx = dispatcher.subscribe();

        dispatcher.publish(&ResponseFrame {
            opcode: CMD_REPORTING,
            pin_or_port: 7,
            lsb: 0x68,
            msb: 0x07,
        });

        let event = rx.try_recv().expect("subscriber should see the update");
        assert_eq!(event.gpio, 7);
        assert_eq!(event.analog(), 1000);
        assert!(event.digital());
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let dispatcher = EventDispatcher::new(8);
        // Must not panic or block.
        dispatcher.publish(&ResponseFrame {
            opcode: CMD_REPORTING,
            pin_or_port: 3,
            lsb: 0,
            msb: 0,
        });
    }

    #[test]
    fn test_slow_subscriber_lags_instead_of_blocking() {
        let dispatcher = EventDispatcher::new(2);
        let mut rx = dispatcher.subscribe();

        for lsb in 0..5u8 {
            dispatcher.publish(&ResponseFrame {
                opcode: CMD_REPORTING,
                pin_or_port: 1,
                lsb,
                msb: 0,
            });
        }

        // The oldest updates were overwritten; the receiver observes a lag,
        // then the most recent values.
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(_))
        ));
        let event = rx.try_recv().expect("recent update available");
        assert_eq!(event.value, 3);
    }
}
