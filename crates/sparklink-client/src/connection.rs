//! The TCP session with the controller.
//!
//! One connection owns the socket, a reader task that turns inbound bytes
//! into classified frames, and a writer task that performs outbound writes
//! in submission order. The public `send` API is a bounded wait from the
//! caller's perspective; the reader task resolves it through the
//! correlator's pending-request slot.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sparklink_protocol::{Command, FrameCodec, PinMode, ReportKind, ResponseFrame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::correlator::Correlator;
use crate::error::ClientError;
use crate::events::{EventDispatcher, PinEvent};

/// Tuning knobs for a connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long to wait for the TCP connection to establish.
    pub connect_timeout: Duration,
    /// Deadline for a response-expecting command.
    pub response_timeout: Duration,
    /// How long `close` waits for outstanding writes to drain.
    pub close_timeout: Duration,
    /// Capacity of the telemetry broadcast channel. Subscribers that fall
    /// further behind than this lag instead of stalling the reader.
    pub event_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            connect_timeout: Duration::from_millis(10_000),
            response_timeout: Duration::from_millis(2_000),
            close_timeout: Duration::from_millis(1_000),
            event_capacity: 64,
        }
    }
}

/// Lifecycle of a connection. Transitions are one-directional; there is no
/// reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket yet.
    Disconnected,
    /// TCP dial in progress.
    Connecting,
    /// Live session; commands are admitted.
    Connected,
    /// Shutdown started; new sends are refused.
    Closing,
    /// Terminal.
    Closed,
}

/// An outbound write handed to the writer task. `done` is the completion
/// handle for the write.
enum WriteOp {
    /// Write these bytes, then report the result.
    Data {
        bytes: Vec<u8>,
        done: oneshot::Sender<io::Result<()>>,
    },
    /// Half-close the socket for writing after all prior ops drained.
    Shutdown { done: oneshot::Sender<io::Result<()>> },
}

/// State shared between the connection handle and its reader task.
struct Inner {
    state: Mutex<ConnectionState>,
    correlator: Correlator,
    events: EventDispatcher,
    write_tx: mpsc::Sender<WriteOp>,
    config: ConnectionConfig,
}

impl Inner {
    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Move to Closing unless shutdown already started. Returns whether this
    /// call made the transition.
    fn begin_close(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            ConnectionState::Closing | ConnectionState::Closed => false,
            _ => {
                *state = ConnectionState::Closing;
                true
            }
        }
    }

    /// Route one inbound frame. Returns false if the stream is malformed
    /// and the session must terminate.
    fn classify(&self, frame: ResponseFrame) -> bool {
        if let Err(e) = frame.check_opcode() {
            log::error!("malformed inbound stream ({}); closing connection", e);
            return false;
        }

        if frame.is_reporting() {
            // Reporting frames are always telemetry, even with a request
            // outstanding.
            log::trace!(
                "report: pin {} value {}",
                frame.pin_or_port,
                frame.analog_value()
            );
            self.events.publish(&frame);
        } else if let Some(unmatched) = self.correlator.deliver(frame) {
            log::warn!(
                "response frame 0x{:02X} with no request outstanding (stale or unsolicited); forwarding as telemetry",
                unmatched.opcode
            );
            self.events.publish(&unmatched);
        }

        true
    }
}

/// A live session with a VoodooSpark controller.
///
/// The wire protocol has no correlation id, so at most one
/// response-expecting command may be outstanding at a time. All sends pass
/// through a single admission lock; concurrent callers are serialized in
/// lock-acquisition order and their bytes never interleave on the wire.
///
/// Cloning is not supported; share a connection with `Arc`.
pub struct SparkConnection {
    inner: Arc<Inner>,
    /// Admission lock: held for the full encode → write → await-response
    /// span of each send.
    send_lock: tokio::sync::Mutex<()>,
    reader: JoinHandle<()>,
}

impl SparkConnection {
    /// Connect to a controller with default configuration.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        Self::connect_with_config(addr, ConnectionConfig::default()).await
    }

    /// Connect to a controller.
    ///
    /// The address comes from an external discovery step; this crate does
    /// not resolve device identifiers.
    pub async fn connect_with_config(
        addr: impl ToSocketAddrs,
        config: ConnectionConfig,
    ) -> Result<Self, ClientError> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Connect(io::Error::from(io::ErrorKind::TimedOut)))?
            .map_err(ClientError::Connect)?;
        let _ = stream.set_nodelay(true);

        let (read_half, write_half) = stream.into_split();
        let (write_tx, write_rx) = mpsc::channel(32);

        let inner = Arc::new(Inner {
            state: Mutex::new(ConnectionState::Connecting),
            correlator: Correlator::new(),
            events: EventDispatcher::new(config.event_capacity),
            write_tx,
            config,
        });

        // Mark Connected before the reader starts so an immediate EOF cannot
        // be overwritten by a stale transition.
        inner.set_state(ConnectionState::Connected);

        tokio::spawn(writer_task(write_half, write_rx));
        let reader = tokio::spawn(reader_task(read_half, inner.clone()));

        Ok(SparkConnection {
            inner,
            send_lock: tokio::sync::Mutex::new(()),
            reader,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Subscribe to unsolicited pin telemetry. Dropping the receiver
    /// unsubscribes.
    pub fn events(&self) -> broadcast::Receiver<PinEvent> {
        self.inner.events.subscribe()
    }

    /// Send a command.
    ///
    /// Fire-and-forget commands return `Ok(None)` once the write completes.
    /// Response-expecting commands wait (up to the configured deadline) for
    /// the frame echoing their opcode and return it as `Ok(Some(frame))`.
    ///
    /// A timed-out command may still have executed on the controller; if its
    /// response arrives after the deadline it is logged and discarded rather
    /// than delivered to a later request, but the command's outcome remains
    /// unknown to the caller.
    pub async fn send(&self, command: Command) -> Result<Option<ResponseFrame>, ClientError> {
        if command.response_expected() {
            self.request(command).await.map(Some)
        } else {
            self.submit(command).await.map(|()| None)
        }
    }

    // ------------------------------------------------------------------
    // Typed command surface
    // ------------------------------------------------------------------

    /// Configure the mode of a pin.
    pub async fn pin_mode(&self, gpio: u8, mode: PinMode) -> Result<(), ClientError> {
        self.submit(Command::PinMode { gpio, mode }).await
    }

    /// Set a digital output pin.
    pub async fn digital_write(&self, gpio: u8, value: bool) -> Result<(), ClientError> {
        self.submit(Command::DigitalWrite { gpio, value }).await
    }

    /// Write an analog/PWM value to a pin.
    pub async fn analog_write(&self, gpio: u8, value: u16) -> Result<(), ClientError> {
        self.submit(Command::AnalogWrite { gpio, value }).await
    }

    /// Read a digital input pin.
    pub async fn digital_read(&self, gpio: u8) -> Result<bool, ClientError> {
        let frame = self.request(Command::DigitalRead { gpio }).await?;
        Ok(frame.digital_value())
    }

    /// Read an analog input pin.
    pub async fn analog_read(&self, gpio: u8) -> Result<u16, ClientError> {
        let frame = self.request(Command::AnalogRead { gpio }).await?;
        Ok(frame.analog_value())
    }

    /// Enable unsolicited reporting for a pin. Reports arrive on
    /// [`events`](SparkConnection::events).
    pub async fn set_reporting(&self, gpio: u8, kind: ReportKind) -> Result<(), ClientError> {
        self.submit(Command::Reporting { gpio, kind }).await
    }

    /// Set the telemetry sampling interval.
    pub async fn set_sample_interval(&self, interval_ms: u16) -> Result<(), ClientError> {
        self.submit(Command::SetSampleInterval { interval_ms }).await
    }

    /// Write a servo angle to a servo-mode pin.
    pub async fn servo_write(&self, gpio: u8, angle: u8) -> Result<(), ClientError> {
        self.submit(Command::ServoWrite { gpio, angle }).await
    }

    /// Set the controller's onboard RGB LED.
    pub async fn internal_rgb(&self, red: u8, green: u8, blue: u8) -> Result<(), ClientError> {
        self.submit(Command::InternalRgb { red, green, blue }).await
    }

    /// Close the connection.
    ///
    /// Refuses new sends, wakes any blocked sender with
    /// [`ClientError::Closed`], drains outstanding writes (bounded by the
    /// configured close timeout; drain errors are logged, never raised), and
    /// releases the socket. Idempotent.
    pub async fn close(&self) {
        if !self.inner.begin_close() {
            return;
        }

        // Wake a blocked sender before discarding anything so a close racing
        // an in-flight wait cannot leave it hanging.
        self.inner.correlator.close();

        let (done, done_rx) = oneshot::channel();
        if self
            .inner
            .write_tx
            .send(WriteOp::Shutdown { done })
            .await
            .is_ok()
        {
            match tokio::time::timeout(self.inner.config.close_timeout, done_rx).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => log::warn!("error draining writes during close: {}", e),
                Ok(Err(_)) => {}
                Err(_) => log::warn!("timed out draining writes during close"),
            }
        }

        self.reader.abort();
        self.inner.set_state(ConnectionState::Closed);
    }

    // ------------------------------------------------------------------
    // Send paths
    // ------------------------------------------------------------------

    /// Fire-and-forget send: encode, write, done.
    async fn submit(&self, command: Command) -> Result<(), ClientError> {
        let _admission = self.send_lock.lock().await;
        self.ensure_connected()?;

        let bytes = command.encode()?;
        self.write(bytes).await
    }

    /// Correlated send: register the pending request, write, then wait
    /// (bounded) for the reader task to resolve it.
    async fn request(&self, command: Command) -> Result<ResponseFrame, ClientError> {
        let _admission = self.send_lock.lock().await;
        self.ensure_connected()?;

        let bytes = command.encode()?;
        let opcode = command.opcode();

        // Register before writing so the response cannot slip past an empty
        // slot, however fast the controller answers.
        let (generation, reply) = self.inner.correlator.register(opcode);

        if let Err(e) = self.write(bytes).await {
            self.inner.correlator.evict(generation);
            return Err(e);
        }

        match tokio::time::timeout(self.inner.config.response_timeout, reply).await {
            Ok(Ok(result)) => result,
            // Reply sender dropped without resolving: the session went away.
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                if !self.inner.correlator.evict(generation) {
                    // A frame won the race against the deadline and was
                    // consumed; the caller still observes a timeout.
                    log::debug!(
                        "response to command 0x{:02X} arrived at the deadline and was discarded",
                        opcode
                    );
                }
                Err(ClientError::Timeout { opcode })
            }
        }
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        match self.inner.state() {
            ConnectionState::Connected => Ok(()),
            _ => Err(ClientError::Closed),
        }
    }

    /// Hand bytes to the writer task and wait for its completion handle.
    /// Write failures are fatal to the session.
    async fn write(&self, bytes: Vec<u8>) -> Result<(), ClientError> {
        let (done, done_rx) = oneshot::channel();
        self.inner
            .write_tx
            .send(WriteOp::Data { bytes, done })
            .await
            .map_err(|_| ClientError::Closed)?;

        match done_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                self.inner.begin_close();
                self.inner.correlator.close();
                Err(ClientError::Write(e))
            }
            Err(_) => Err(ClientError::Closed),
        }
    }
}

impl Drop for SparkConnection {
    fn drop(&mut self) {
        // Releases the socket and wakes any straggling waiter if the caller
        // never ran `close`.
        self.reader.abort();
        self.inner.correlator.close();
    }
}

/// Performs outbound writes in submission order and reports each result
/// through its completion handle. Exits on shutdown, write failure, or when
/// the connection handle goes away.
async fn writer_task(mut write_half: OwnedWriteHalf, mut write_rx: mpsc::Receiver<WriteOp>) {
    while let Some(op) = write_rx.recv().await {
        match op {
            WriteOp::Data { bytes, done } => {
                let result = match write_half.write_all(&bytes).await {
                    Ok(()) => write_half.flush().await,
                    Err(e) => Err(e),
                };
                let failed = result.is_err();
                if let Err(e) = &result {
                    log::warn!("write to controller failed: {}", e);
                }
                let _ = done.send(result);
                if failed {
                    // Queued completion handles drop, failing their callers.
                    break;
                }
            }
            WriteOp::Shutdown { done } => {
                let _ = done.send(write_half.shutdown().await);
                break;
            }
        }
    }
}

/// Reads inbound bytes, decodes frames, and classifies each one: telemetry
/// to the event dispatcher, everything else to the correlator. Runs until
/// EOF, a read error, a malformed stream, or abort by `close`.
async fn reader_task(mut read_half: OwnedReadHalf, inner: Arc<Inner>) {
    let mut codec = FrameCodec::new();
    let mut buf = [0u8; 256];

    'io: loop {
        match read_half.read(&mut buf).await {
            Ok(0) => {
                log::debug!("controller closed the connection");
                break 'io;
            }
            Ok(n) => {
                codec.push(&buf[..n]);
                while let Some(frame) = codec.decode() {
                    if !inner.classify(frame) {
                        break 'io;
                    }
                }
            }
            Err(e) => {
                log::warn!("read error on controller connection: {}", e);
                break 'io;
            }
        }
    }

    inner.begin_close();
    inner.correlator.close();
    inner.set_state(ConnectionState::Closed);
}
