//! Defines the wire-level MIDI 1.0 types shared by the `midithru` engine:
//! message kinds, the decoded message record and the 14-bit pitch-bend value.
//!
//! This crate is pure data: it knows how status bytes classify and how many
//! data bytes follow them, but performs no I/O and keeps no decoder state.
//! The stateful byte-stream machinery lives in the `midithru` crate.
//!
//! # Classifying a status byte
//!
//! ```
//! use midithru_core::MessageKind;
//!
//! assert_eq!(MessageKind::from_status(0x92), MessageKind::NoteOn);
//! assert_eq!(MessageKind::from_status(0xF8), MessageKind::Clock);
//! assert_eq!(MessageKind::from_status(0xF4), MessageKind::Invalid);
//! ```
//!
//! # `no_std` support
//!
//! The crate is `no_std` whenever the `std` feature is disabled; it never
//! allocates. The SysEx payload of [`Message`] is a `heapless` vector whose
//! capacity is a const generic parameter.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

mod message;

pub use crate::message::{Message, MessageKind, PitchBend};

/// Input channel value that listens on every channel.
pub const CHANNEL_OMNI: u8 = 0;
/// Input channel value (and anything above it) that disables reception.
pub const CHANNEL_OFF: u8 = 17;
/// The baud rate of a standard MIDI 1.0 serial link (8-N-1).
pub const MIDI_BAUD: u32 = 31_250;
