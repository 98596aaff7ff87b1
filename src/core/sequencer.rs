//! Command sequencing
//!
//! Sends a fixed, ordered list of newline-terminated commands with a uniform
//! pause between consecutive sends. Fire-and-forget: nothing is read back and
//! the peer's state transitions are not checked.

use crate::core::clock::Clock;
use crate::core::codec::LineCodec;
use crate::core::transport::{Transport, TransportError};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio_util::codec::Encoder;
use tokio_util::sync::CancellationToken;

/// An immutable, newline-terminated command line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(Bytes);

impl Command {
    /// Build from text, appending `\n` when it is missing
    pub fn new(text: &str) -> Self {
        let mut bytes = BytesMut::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        if !text.ends_with('\n') {
            bytes.extend_from_slice(b"\n");
        }
        Self(bytes.freeze())
    }

    /// Wire bytes, terminator included
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Command text without the terminator
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.0.strip_suffix(b"\n").unwrap_or(&self.0)).into_owned()
    }
}

impl From<WireCommand> for Command {
    fn from(command: WireCommand) -> Self {
        Self::new(&command.to_string())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Commands understood by the simulator bridge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WireCommand {
    /// Start telemetry streaming
    Start,
    /// Arm the balance controller
    Arm,
    /// Select a controller mode; the number is opaque to the harness
    Mode(i64),
    /// Safe shutdown: arm down, then balance off
    Disarm,
    /// Stop telemetry streaming
    Stop,
    /// Toggle the status LED
    Led,
    /// Drive command
    Motor {
        /// Forward/backward demand
        throttle: f32,
        /// Turn demand
        turn: f32,
    },
}

impl fmt::Display for WireCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Arm => write!(f, "ARM"),
            Self::Mode(mode) => write!(f, "MODE:{mode}"),
            Self::Disarm => write!(f, "DISARM"),
            Self::Stop => write!(f, "STOP"),
            Self::Led => write!(f, "LED"),
            Self::Motor { throttle, turn } => write!(f, "M:{throttle:.1},{turn:.1}"),
        }
    }
}

/// Ordered commands plus the pause applied between consecutive sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSequence {
    commands: Vec<Command>,
    delay: Duration,
}

impl CommandSequence {
    /// Create a sequence
    pub fn new(commands: Vec<Command>, delay: Duration) -> Self {
        Self { commands, delay }
    }

    /// Build from command text lines
    pub fn from_lines<S: AsRef<str>>(lines: &[S], delay: Duration) -> Self {
        Self::new(lines.iter().map(|l| Command::new(l.as_ref())).collect(), delay)
    }

    /// Commands in send order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Pause between consecutive sends
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Total pacing time: `(count - 1) * delay`
    pub fn pacing(&self) -> Duration {
        let gaps = u32::try_from(self.commands.len().saturating_sub(1)).unwrap_or(u32::MAX);
        self.delay.saturating_mul(gaps)
    }
}

impl Default for CommandSequence {
    /// `START`, `ARM`, `MODE:9`, `DISARM`, `STOP` paced at 200 ms
    fn default() -> Self {
        Self::new(
            [
                WireCommand::Start,
                WireCommand::Arm,
                WireCommand::Mode(9),
                WireCommand::Disarm,
                WireCommand::Stop,
            ]
            .into_iter()
            .map(Command::from)
            .collect(),
            Duration::from_millis(200),
        )
    }
}

/// What the sequencer put on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendLog {
    /// Commands sent
    pub commands: usize,
    /// Bytes written
    pub bytes: usize,
}

/// Transmits a [`CommandSequence`] over a transport
pub struct CommandSequencer<'a> {
    clock: &'a dyn Clock,
    cancel: &'a CancellationToken,
}

impl<'a> CommandSequencer<'a> {
    /// Create a sequencer pacing with `clock`
    pub fn new(clock: &'a dyn Clock, cancel: &'a CancellationToken) -> Self {
        Self { clock, cancel }
    }

    /// Send every command in order, pausing between sends.
    ///
    /// Send errors are fatal and returned as-is. Cancellation during a pause
    /// returns [`TransportError::Cancelled`].
    pub async fn run<T>(&self, transport: &mut T, sequence: &CommandSequence) -> Result<SendLog, TransportError>
    where
        T: Transport + ?Sized,
    {
        let mut codec = LineCodec::new();
        let mut frame = BytesMut::new();
        let mut log = SendLog::default();

        for (index, command) in sequence.commands().iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {
                        tracing::warn!(sent = log.commands, "command sequence cancelled");
                        return Err(TransportError::Cancelled);
                    }
                    () = self.clock.sleep(sequence.delay()) => {}
                }
            }
            if self.cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            frame.clear();
            codec.encode(command.clone(), &mut frame)?;
            let written = transport.send(&frame).await?;

            log.commands += 1;
            log.bytes += written;
            tracing::debug!(command = %command, bytes = written, "sent");
        }

        tracing::info!(commands = log.commands, bytes = log.bytes, "command sequence sent");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::transport::FakeTransport;
    use std::sync::Arc;

    #[test]
    fn test_wire_encoding() {
        assert_eq!(WireCommand::Mode(9).to_string(), "MODE:9");
        assert_eq!(WireCommand::Motor { throttle: 0.5, turn: -1.0 }.to_string(), "M:0.5,-1.0");
        assert_eq!(Command::from(WireCommand::Start).as_bytes(), b"START\n");
    }

    #[test]
    fn test_command_keeps_existing_terminator() {
        assert_eq!(Command::new("ARM\n").as_bytes(), b"ARM\n");
        assert_eq!(Command::new("ARM").text(), "ARM");
    }

    #[test]
    fn test_default_sequence() {
        let sequence = CommandSequence::default();
        let texts: Vec<String> = sequence.commands().iter().map(Command::text).collect();
        assert_eq!(texts, ["START", "ARM", "MODE:9", "DISARM", "STOP"]);
        assert_eq!(sequence.pacing(), Duration::from_millis(800));
        assert_eq!(CommandSequence::new(Vec::new(), Duration::from_secs(1)).pacing(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_sends_in_order_with_pacing() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        let mut fake = FakeTransport::new(Arc::clone(&clock), Vec::new());
        let handle = fake.handle();

        let sequence = CommandSequence::default();
        let log = CommandSequencer::new(clock.as_ref(), &cancel)
            .run(&mut fake, &sequence)
            .await
            .unwrap();

        assert_eq!(log.commands, 5);
        assert_eq!(handle.written(), b"START\nARM\nMODE:9\nDISARM\nSTOP\n");

        let sent = handle.sent();
        for pair in sent.windows(2) {
            assert!(pair[1].at - pair[0].at >= sequence.delay());
        }
        // No pause after the last command
        assert_eq!(clock.now(), Duration::from_millis(800));
        assert_eq!(clock.sleeps().len(), 4);
    }

    #[tokio::test]
    async fn test_send_error_is_fatal() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        let mut fake = FakeTransport::new(Arc::clone(&clock), Vec::new()).fail_send_after(2);
        let handle = fake.handle();

        let err = CommandSequencer::new(clock.as_ref(), &cancel)
            .run(&mut fake, &CommandSequence::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::IoError(_)));
        assert_eq!(handle.written(), b"START\nARM\n");
    }

    #[tokio::test]
    async fn test_cancelled_before_next_send() {
        let clock = ManualClock::shared();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut fake = FakeTransport::new(Arc::clone(&clock), Vec::new());
        let handle = fake.handle();

        let err = CommandSequencer::new(clock.as_ref(), &cancel)
            .run(&mut fake, &CommandSequence::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Cancelled));
        assert!(handle.sent().is_empty());
    }
}
