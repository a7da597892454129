//! A MIDI 1.0 byte-stream codec and soft-thru engine for byte-oriented
//! serial links (the classic 31 250 baud, 8-N-1 current loop).
//!
//! The engine is split in two halves that can be used together or alone:
//!
//! - [`MidiIn`] pulls raw bytes out of a [`ByteTransport`] and assembles
//!   them into [`Message`]s, handling the two quirks that make raw MIDI
//!   non-trivial: running status (a repeated channel status byte may be
//!   omitted) and interleaved System Realtime bytes (single-byte messages
//!   allowed *inside* any other message).
//! - [`MidiOut`] turns typed send calls into wire bytes, compressing
//!   consecutive same-status channel messages with running status.
//!
//! [`Midi`] combines both halves and adds soft thru: every received message
//! can be mirrored to the output under a configurable [`ThruMode`] filter,
//! before the message is surfaced to the caller.
//!
//! ```
//! use midithru::{ByteTransport, FifoTransport, Midi, MessageKind};
//!
//! // Queue the bytes of a NoteOn on channel 3, as a keyboard would send.
//! let mut keyboard = FifoTransport::<64>::new();
//! for byte in [0x92, 0x3C, 0x64] {
//!     keyboard.write(byte);
//! }
//!
//! let mut midi: Midi<_, _> = Midi::new(keyboard, FifoTransport::<64>::new());
//! midi.begin_on(3);
//!
//! while midi.read() {
//!     assert_eq!(midi.kind(), MessageKind::NoteOn);
//!     assert_eq!(midi.channel(), 3);
//! }
//! ```
//!
//! # Execution model
//!
//! Everything is single-threaded, cooperative and non-blocking: the engine
//! runs only inside `read`/`poll`/`send*` calls, never sleeps, and performs
//! no dynamic allocation. Drive it from a main loop or a timer tick; if the
//! input transport ever fills up completely, the engine discards the
//! backlog and resynchronises on the next status byte rather than fall
//! further behind.
//!
//! # `no_std` support
//!
//! The crate is `no_std` whenever the default `std` feature is disabled.
//! The SysEx capture buffer is a const generic parameter (`CAP`, default
//! 255 bytes, valid in `3..=255`) on [`Parser`], [`MidiIn`], [`Midi`] and
//! [`Message`].
//!
//! # Cargo features
//!
//! - `std` (default): implements nothing extra yet, but keeps the crate
//!   out of `no_std` mode.
//! - `log`: diagnostic warnings through the `log` facade when the engine
//!   discards data (overflow, desync, oversized SysEx).
//! - `serde`: `Serialize`/`Deserialize` for the data model and `ThruMode`.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod input;
mod output;
mod thru;
mod transport;

pub use midithru_core;
pub use midithru_core::{
    Message, MessageKind, PitchBend, CHANNEL_OFF, CHANNEL_OMNI, MIDI_BAUD,
};

pub use crate::{
    input::{Feed, MidiIn, Parser},
    output::MidiOut,
    thru::{Midi, ThruMode},
    transport::{ByteTransport, FifoTransport},
};
