//! The receive half: a byte-at-a-time decoder for raw, undelimited MIDI
//! streams, and its coupling to an input transport.
//!
//! Raw MIDI is just bytes that may arrive at any rate, with two quirks that
//! make decoding stateful. *Running status* lets a sender omit the status
//! byte when repeating the same channel message, so a lone data byte can be
//! the start of a perfectly valid message. *System Realtime* bytes are
//! single-byte messages allowed to appear anywhere, including between the
//! status and data bytes of another message, and must be surfaced without
//! disturbing the message they interrupted.
//!
//! [`Parser`] handles both quirks and nothing else; it can be fed from any
//! byte source. [`MidiIn`] binds a parser to a [`ByteTransport`] and adds
//! the polling loop, input-channel filtering and overflow recovery.

use heapless::Vec;
use midithru_core::{Message, MessageKind, CHANNEL_OFF, MIDI_BAUD};

use crate::transport::ByteTransport;

/// The outcome of feeding one byte to a [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The byte was absorbed; more bytes are needed.
    Pending,
    /// A message completed and can be read through [`Parser::message`].
    Complete,
    /// The byte could not extend a message; whatever was pending was
    /// dropped.
    Dropped,
}

/// A streaming decoder for raw MIDI bytes.
///
/// The decoder assembles at most one message at a time in a bounded pending
/// buffer and overwrites its cached [`Message`] on every completion; it
/// never allocates. `CAP` bounds the pending buffer and therefore the
/// longest SysEx frame that can be captured (framing bytes included), and
/// must be in `3..=255`.
///
/// ```
/// use midithru::{Feed, Parser};
///
/// let mut parser: Parser = Parser::new();
/// assert_eq!(parser.feed(0x92), Feed::Pending);
/// assert_eq!(parser.feed(0x3C), Feed::Pending);
/// assert_eq!(parser.feed(0x64), Feed::Complete);
/// assert_eq!(parser.message().channel, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Parser<const CAP: usize = 255> {
    /// Bytes of the message under assembly; the first is always a status
    /// byte.
    pending: Vec<u8, CAP>,
    /// Total length (status + data) the pending message will reach, or
    /// `CAP` for SysEx.
    expected: usize,
    /// The status of the last completed channel message, for running-status
    /// expansion. Never holds a system status.
    running_status: Option<u8>,
    message: Message<CAP>,
}

impl<const CAP: usize> Parser<CAP> {
    /// Create a fresh decoder.
    pub const fn new() -> Parser<CAP> {
        Parser {
            pending: Vec::new(),
            expected: 0,
            running_status: None,
            message: Message::invalid(),
        }
    }

    /// The most recently completed message.
    ///
    /// Holds [`Message::invalid`] until the first completion, and is
    /// overwritten in place by every later one.
    #[inline]
    pub fn message(&self) -> &Message<CAP> {
        &self.message
    }

    /// Forget the message under assembly, keeping the running status.
    pub(crate) fn drop_pending(&mut self) {
        self.pending.clear();
        self.expected = 0;
    }

    /// Forget the message under assembly *and* the running status. Used
    /// when the stream can no longer be trusted.
    fn desync(&mut self) {
        self.drop_pending();
        self.running_status = None;
    }

    /// Consume one byte of the stream.
    pub fn feed(&mut self, byte: u8) -> Feed {
        if self.pending.is_empty() {
            self.feed_idle(byte)
        } else {
            self.feed_pending(byte)
        }
    }

    /// No message in flight: `byte` opens one (or is one).
    fn feed_idle(&mut self, byte: u8) -> Feed {
        if byte < 0x80 {
            // A data byte with no message in flight reuses the previous
            // channel status, as if the sender had repeated it.
            match self.running_status {
                Some(status) => {
                    let _ = self.pending.push(status);
                    let _ = self.pending.push(byte);
                    let data_len = MessageKind::from_status(status)
                        .fixed_data_len()
                        .unwrap_or(0);
                    self.expected = 1 + data_len as usize;
                    // One-data-byte kinds are already complete here.
                    return self.try_complete();
                }
                None => return Feed::Dropped,
            }
        }

        let kind = MessageKind::from_status(byte);
        match kind.fixed_data_len() {
            Some(0) => {
                // Single-byte message, surfaced on the spot. Arriving
                // *between* messages (as opposed to inside one) it also
                // terminates any running status.
                self.running_status = None;
                self.complete_system(kind);
                Feed::Complete
            }
            Some(data_len) => {
                let _ = self.pending.push(byte);
                self.expected = 1 + data_len as usize;
                Feed::Pending
            }
            None if kind == MessageKind::SystemExclusive => {
                let _ = self.pending.push(byte);
                self.expected = CAP;
                Feed::Pending
            }
            None => {
                // An undefined status byte. Nothing that follows it can be
                // trusted, running status included.
                #[cfg(feature = "log")]
                log::warn!("undefined midi status byte 0x{:02X}, discarding", byte);
                self.desync();
                Feed::Dropped
            }
        }
    }

    /// A message is in flight: `byte` extends, completes or interrupts it.
    fn feed_pending(&mut self, byte: u8) -> Feed {
        if byte >= 0x80 {
            let kind = MessageKind::from_status(byte);
            if kind.is_system_realtime() {
                // Interleaved realtime message. Surface it as a standalone
                // message while leaving the pending buffer, the expected
                // length and the running status exactly as they are: the
                // interrupted message resumes with the next byte.
                self.complete_system(kind);
                return Feed::Complete;
            }
            if byte == 0xF7 {
                if self.pending[0] == 0xF0 {
                    return self.complete_sysex();
                }
                // End-of-exclusive with no SysEx in flight.
                self.desync();
                return Feed::Dropped;
            }
            // Any other status byte interrupting a message is a protocol
            // error: drop what we had and restart on the interrupting byte
            // so it is not lost.
            #[cfg(feature = "log")]
            log::warn!(
                "unexpected status byte 0x{:02X} inside a message, resyncing",
                byte
            );
            self.desync();
            return match self.feed_idle(byte) {
                // A single-byte message still counts as a completion.
                Feed::Complete => Feed::Complete,
                _ => Feed::Dropped,
            };
        }

        if self.pending.push(byte).is_err() {
            // Pending buffer exhausted; only reachable when `CAP` is smaller
            // than a fixed message. Treat like any other desync.
            self.desync();
            return Feed::Dropped;
        }
        if self.pending.len() == self.expected && self.pending[0] == 0xF0 {
            // The SysEx frame filled the whole capture buffer without its
            // closing byte; it cannot be represented, so it is dropped.
            #[cfg(feature = "log")]
            log::error!("sysex frame exceeded {} bytes, dropping", CAP);
            self.desync();
            return Feed::Dropped;
        }
        self.try_complete()
    }

    /// Complete the pending fixed-length message once all its bytes are in.
    fn try_complete(&mut self) -> Feed {
        if self.pending.len() < self.expected {
            return Feed::Pending;
        }

        let status = self.pending[0];
        let kind = MessageKind::from_status(status);
        self.message.kind = kind;
        self.message.channel = if kind.is_channel() {
            (status & 0x0F) + 1
        } else {
            0
        };
        self.message.data1 = self.pending.get(1).copied().unwrap_or(0);
        self.message.data2 = self.pending.get(2).copied().unwrap_or(0);
        self.message.sysex.clear();
        self.message.valid = true;

        // Channel messages open (or continue) a run; anything else ends it.
        self.running_status = if kind.is_channel() { Some(status) } else { None };
        self.drop_pending();
        Feed::Complete
    }

    /// Complete the pending SysEx frame upon its closing `0xF7`.
    fn complete_sysex(&mut self) -> Feed {
        self.message.kind = MessageKind::SystemExclusive;
        self.message.channel = 0;
        self.message.sysex.clear();
        let _ = self.message.sysex.extend_from_slice(&self.pending);
        let _ = self.message.sysex.push(0xF7);
        // The whole frame length, framing bytes included, travels in data1.
        self.message.data1 = self.message.sysex.len() as u8;
        self.message.data2 = 0;
        self.message.valid = true;

        self.running_status = None;
        self.drop_pending();
        Feed::Complete
    }

    /// Surface a single-byte system message without touching the pending
    /// state.
    fn complete_system(&mut self, kind: MessageKind) {
        self.message.kind = kind;
        self.message.channel = 0;
        self.message.data1 = 0;
        self.message.data2 = 0;
        self.message.sysex.clear();
        self.message.valid = true;
    }
}

impl<const CAP: usize> Default for Parser<CAP> {
    #[inline]
    fn default() -> Parser<CAP> {
        Parser::new()
    }
}

/// The receiving half of the engine: a [`Parser`] bound to an input
/// transport, plus the input-channel filter.
///
/// The input channel selects which channel messages [`read`](MidiIn::read)
/// surfaces: a channel in `1..=16` surfaces exactly that channel,
/// [`CHANNEL_OMNI`](midithru_core::CHANNEL_OMNI) surfaces all of them, and
/// [`CHANNEL_OFF`] (or anything above it) disables reception entirely.
/// System messages are always surfaced.
#[derive(Debug, Clone)]
pub struct MidiIn<T: ByteTransport, const CAP: usize = 255> {
    transport: T,
    parser: Parser<CAP>,
    input_channel: u8,
}

impl<T: ByteTransport, const CAP: usize> MidiIn<T, CAP> {
    /// Create a receiver over the given transport, listening on channel 1.
    pub fn new(transport: T) -> MidiIn<T, CAP> {
        MidiIn {
            transport,
            parser: Parser::new(),
            input_channel: 1,
        }
    }

    /// Initialise the transport at the MIDI baud rate and reset the decoder,
    /// listening on channel 1.
    pub fn begin(&mut self) {
        self.begin_on(1);
    }

    /// Initialise the transport at the MIDI baud rate and reset the decoder,
    /// listening on the given input channel.
    pub fn begin_on(&mut self, input_channel: u8) {
        self.transport.begin(MIDI_BAUD);
        self.parser = Parser::new();
        self.input_channel = input_channel;
    }

    /// The channel this receiver listens on.
    #[inline]
    pub fn input_channel(&self) -> u8 {
        self.input_channel
    }

    /// Change the channel this receiver listens on.
    #[inline]
    pub fn set_input_channel(&mut self, channel: u8) {
        self.input_channel = channel;
    }

    /// The most recently completed message.
    #[inline]
    pub fn message(&self) -> &Message<CAP> {
        self.parser.message()
    }

    /// Access the underlying transport.
    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the receiver and recover the transport.
    #[inline]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Drive the decoder with whatever the transport has queued.
    ///
    /// Returns `true` when a message completed, regardless of its channel;
    /// the message is then readable through [`message`](MidiIn::message).
    /// At most one message completes per call, so interleaved realtime
    /// bytes come out on calls of their own. Returns `false` when the
    /// queued bytes ran out, or when they had to be discarded.
    ///
    /// Never blocks: with nothing queued it returns immediately.
    pub fn poll(&mut self) -> bool {
        if self.input_channel >= CHANNEL_OFF {
            return false;
        }
        self.drain()
    }

    pub(crate) fn drain(&mut self) -> bool {
        if self.transport.is_saturated() {
            // The receiver fell behind and bytes are being lost; whatever is
            // queued or half-assembled is unreliable. Drop it all and
            // resynchronise on the next status byte.
            #[cfg(feature = "log")]
            log::warn!(
                "input transport saturated ({} bytes), flushing",
                self.transport.available()
            );
            self.transport.flush();
            self.parser.drop_pending();
        }
        while self.transport.available() > 0 {
            let byte = self.transport.read();
            match self.parser.feed(byte) {
                Feed::Complete => return true,
                Feed::Dropped => return false,
                Feed::Pending => {}
            }
        }
        false
    }

    /// Like [`poll`](MidiIn::poll), but additionally applies the
    /// input-channel filter: returns `true` only for messages this receiver
    /// listens to.
    pub fn read(&mut self) -> bool {
        let channel = self.input_channel;
        self.read_on(channel)
    }

    /// Like [`read`](MidiIn::read) with a one-off input channel.
    pub fn read_on(&mut self, input_channel: u8) -> bool {
        if input_channel >= CHANNEL_OFF {
            return false;
        }
        self.drain() && self.parser.message().matches_input(input_channel)
    }
}
