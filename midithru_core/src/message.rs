//! Midi message definitions.

use heapless::Vec;

use crate::CHANNEL_OMNI;

/// The kind of a MIDI message, as identified by its status byte.
///
/// Channel kinds carry their channel in the low nibble of the status byte on
/// the wire, so a single kind covers all sixteen channels. System kinds use
/// the full status byte.
///
/// `Invalid` stands in for the undefined status bytes (`0xF4`, `0xF5`,
/// `0xF9`, `0xFD`), for `0xF7` outside of a SysEx frame, and for data bytes
/// found where a status byte was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// Indicates that the given key should stop playing.
    NoteOff,
    /// Indicates that the given key should start playing with the given
    /// velocity.
    NoteOn,
    /// Indicates that the playing pressure of a given key has changed.
    AfterTouchPoly,
    /// Changes the value of a particular MIDI controller.
    ControlChange,
    /// Indicates that the channel should change program.
    ProgramChange,
    /// Indicates that the playing pressure of the entire channel has changed.
    AfterTouchChannel,
    /// Indicates a new pitch bend for the entire channel.
    PitchBend,
    /// A variable-length frame of arbitrary bytes, bracketed by `0xF0` and
    /// `0xF7` on the wire.
    ///
    /// This is a System Common message.
    SystemExclusive,
    /// A single nibble of a MIDI Time Code, carrying a tag type and 4 bits
    /// of tag value.
    ///
    /// This is a System Common message.
    TimeCodeQuarterFrame,
    /// The number of MIDI beats (6 x MIDI clocks) elapsed since the start of
    /// the sequence.
    ///
    /// This is a System Common message.
    SongPosition,
    /// Select a given song index.
    ///
    /// This is a System Common message.
    SongSelect,
    /// Request the device to tune its oscillators.
    ///
    /// This is a System Common message, and the only single-byte one.
    TuneRequest,
    /// Used to synchronize MIDI devices. If sent, these should be sent 24
    /// times per quarter note.
    ///
    /// This is a System Realtime message.
    Clock,
    /// Request the device to start playing from the beginning.
    ///
    /// This is a System Realtime message.
    Start,
    /// Request the device to continue playing from the current position.
    ///
    /// This is a System Realtime message.
    Continue,
    /// Request the device to stop playing, keeping track of the position.
    ///
    /// This is a System Realtime message.
    Stop,
    /// Used to make sure that a connection is still alive.
    ///
    /// This is a System Realtime message.
    ActiveSensing,
    /// Request the device to reset to its power-up condition.
    ///
    /// This is a System Realtime message.
    SystemReset,
    /// Not a recognizable MIDI message.
    Invalid,
}
impl MessageKind {
    /// Classify a status byte.
    ///
    /// Data bytes (`< 0x80`) and the status bytes left undefined by MIDI 1.0
    /// classify to `Invalid`.
    pub fn from_status(status: u8) -> MessageKind {
        use self::MessageKind::*;
        match status >> 4 {
            0x0..=0x7 => Invalid,
            0x8 => NoteOff,
            0x9 => NoteOn,
            0xA => AfterTouchPoly,
            0xB => ControlChange,
            0xC => ProgramChange,
            0xD => AfterTouchChannel,
            0xE => PitchBend,
            _ => match status {
                0xF0 => SystemExclusive,
                0xF1 => TimeCodeQuarterFrame,
                0xF2 => SongPosition,
                0xF3 => SongSelect,
                0xF6 => TuneRequest,
                0xF8 => Clock,
                0xFA => Start,
                0xFB => Continue,
                0xFC => Stop,
                0xFE => ActiveSensing,
                0xFF => SystemReset,
                // 0xF4, 0xF5, 0xF9 and 0xFD are undefined, and 0xF7 is only
                // meaningful as the closing byte of a SysEx frame.
                _ => Invalid,
            },
        }
    }

    /// The status byte of this kind.
    ///
    /// For channel kinds this is the status with a zero channel nibble; see
    /// [`with_channel`](MessageKind::with_channel) for the on-wire byte.
    /// `Invalid` maps to `0x00`.
    pub const fn status(self) -> u8 {
        use self::MessageKind::*;
        match self {
            NoteOff => 0x80,
            NoteOn => 0x90,
            AfterTouchPoly => 0xA0,
            ControlChange => 0xB0,
            ProgramChange => 0xC0,
            AfterTouchChannel => 0xD0,
            PitchBend => 0xE0,
            SystemExclusive => 0xF0,
            TimeCodeQuarterFrame => 0xF1,
            SongPosition => 0xF2,
            SongSelect => 0xF3,
            TuneRequest => 0xF6,
            Clock => 0xF8,
            Start => 0xFA,
            Continue => 0xFB,
            Stop => 0xFC,
            ActiveSensing => 0xFE,
            SystemReset => 0xFF,
            Invalid => 0x00,
        }
    }

    /// Compose the on-wire status byte for a channel kind and a channel in
    /// the `1..=16` range.
    #[inline]
    pub const fn with_channel(self, channel: u8) -> u8 {
        self.status() | (channel.wrapping_sub(1) & 0x0F)
    }

    /// The number of data bytes following the status byte, or `None` for
    /// variable-length (SysEx) and unclassifiable kinds.
    pub const fn fixed_data_len(self) -> Option<u8> {
        use self::MessageKind::*;
        match self {
            TuneRequest | Clock | Start | Continue | Stop | ActiveSensing | SystemReset => Some(0),
            ProgramChange | AfterTouchChannel | TimeCodeQuarterFrame | SongSelect => Some(1),
            NoteOff | NoteOn | AfterTouchPoly | ControlChange | PitchBend | SongPosition => Some(2),
            SystemExclusive | Invalid => None,
        }
    }

    /// Returns `true` if this kind is associated to a particular channel.
    #[inline]
    pub const fn is_channel(self) -> bool {
        use self::MessageKind::*;
        matches!(
            self,
            NoteOff
                | NoteOn
                | AfterTouchPoly
                | ControlChange
                | ProgramChange
                | AfterTouchChannel
                | PitchBend
        )
    }

    /// Returns `true` for the single-byte System Realtime kinds, which may
    /// appear anywhere in a stream, including inside another message.
    #[inline]
    pub const fn is_system_realtime(self) -> bool {
        use self::MessageKind::*;
        matches!(
            self,
            Clock | Start | Continue | Stop | ActiveSensing | SystemReset
        )
    }

    /// Returns `true` for the System Common kinds.
    #[inline]
    pub const fn is_system_common(self) -> bool {
        use self::MessageKind::*;
        matches!(
            self,
            SystemExclusive | TimeCodeQuarterFrame | SongPosition | SongSelect | TuneRequest
        )
    }

    /// Returns `true` for any system kind, common or realtime.
    #[inline]
    pub const fn is_system(self) -> bool {
        self.is_system_common() || self.is_system_realtime()
    }
}

/// A decoded MIDI message.
///
/// The record is flat so a single instance can be kept alive and overwritten
/// in place by the decoder: `kind` selects which of the remaining fields are
/// meaningful.
///
/// For SysEx messages `sysex` holds the verbatim frame *including* the
/// leading `0xF0` and trailing `0xF7`, and `data1` holds the whole frame
/// length. `CAP` bounds the frame and must be in `3..=255` (one status byte
/// plus two data bytes at least, and small enough for the length to fit in
/// `data1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message<const CAP: usize = 255> {
    /// The kind of the message.
    pub kind: MessageKind,
    /// The channel the message was addressed to, in `1..=16`.
    /// Zero for system messages.
    pub channel: u8,
    /// The first data byte (`0..=127`), or the frame length for SysEx.
    pub data1: u8,
    /// The second data byte (`0..=127`); zero when the kind carries only one.
    pub data2: u8,
    /// The captured SysEx frame, framing bytes included.
    pub sysex: Vec<u8, CAP>,
    /// Whether the record holds a completely assembled message.
    pub valid: bool,
}
impl<const CAP: usize> Message<CAP> {
    /// An empty, invalid message, as held by a decoder before the first
    /// completion.
    pub const fn invalid() -> Message<CAP> {
        Message {
            kind: MessageKind::Invalid,
            channel: 0,
            data1: 0,
            data2: 0,
            sysex: Vec::new(),
            valid: false,
        }
    }

    /// The captured SysEx frame as a byte slice, framing bytes included.
    #[inline]
    pub fn sysex(&self) -> &[u8] {
        &self.sysex
    }

    /// Returns `true` for a NoteOn with non-zero velocity.
    ///
    /// A NoteOn with zero velocity is a note release in disguise; see
    /// [`is_note_off`](Message::is_note_off).
    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.kind == MessageKind::NoteOn && self.data2 > 0
    }

    /// Returns `true` for a NoteOff, or for the zero-velocity NoteOn that
    /// many devices send in its place.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        match self.kind {
            MessageKind::NoteOff => true,
            MessageKind::NoteOn => self.data2 == 0,
            _ => false,
        }
    }

    /// The assembled pitch-bend value, if this is a PitchBend message.
    #[inline]
    pub fn pitch_bend(&self) -> Option<PitchBend> {
        match self.kind {
            MessageKind::PitchBend => Some(PitchBend::from_parts(self.data1, self.data2)),
            _ => None,
        }
    }

    /// The assembled 14-bit beat count, if this is a SongPosition message.
    #[inline]
    pub fn song_position(&self) -> Option<u16> {
        match self.kind {
            MessageKind::SongPosition => {
                Some((self.data1 as u16 & 0x7F) | ((self.data2 as u16 & 0x7F) << 7))
            }
            _ => None,
        }
    }

    /// Whether a receiver listening on `input_channel` should surface this
    /// message.
    ///
    /// Channel messages match their own channel or an OMNI receiver; system
    /// messages are always heard.
    #[inline]
    pub fn matches_input(&self, input_channel: u8) -> bool {
        if self.kind.is_channel() {
            input_channel == CHANNEL_OMNI || self.channel == input_channel
        } else {
            true
        }
    }
}
impl<const CAP: usize> Default for Message<CAP> {
    #[inline]
    fn default() -> Message<CAP> {
        Message::invalid()
    }
}

/// A pitch-bend amount, stored as the unsigned 14-bit wire value in
/// `0..=0x3FFF`, where [`PitchBend::CENTER`] means no bend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PitchBend(u16);
impl PitchBend {
    /// The middle value, indicating no bend.
    pub const CENTER: u16 = 0x2000;
    /// The maximum value, indicating full bend upwards.
    pub const MAX: u16 = 0x3FFF;

    /// Build from the unsigned 14-bit wire value.
    #[inline]
    pub const fn from_u14(value: u16) -> PitchBend {
        PitchBend(value & Self::MAX)
    }

    /// Build from the two 7-bit data bytes as they appear on the wire.
    #[inline]
    pub const fn from_parts(lsb: u8, msb: u8) -> PitchBend {
        PitchBend(((msb as u16 & 0x7F) << 7) | (lsb as u16 & 0x7F))
    }

    /// Build from a floating-point amount in `-1.0..=1.0`, where `0.0` means
    /// no bend. The value is rounded to the nearest step and saturates at
    /// the ends of the range.
    #[inline]
    pub fn from_f32(value: f32) -> PitchBend {
        // Round to nearest without `f32::round`, which is not in `core`.
        // The float-to-int cast saturates at zero for inputs below -1.0.
        let raw = ((value + 1.0) * 8192.0 + 0.5) as u16;
        PitchBend(if raw > Self::MAX { Self::MAX } else { raw })
    }

    /// The unsigned 14-bit wire value.
    #[inline]
    pub const fn as_u14(&self) -> u16 {
        self.0
    }

    /// Cast as a floating-point amount in `-1.0..=1.0`.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        self.0 as f32 / 8192.0 - 1.0
    }

    /// The low 7 bits, sent first on the wire.
    #[inline]
    pub const fn lsb(&self) -> u8 {
        (self.0 & 0x7F) as u8
    }

    /// The high 7 bits, sent second on the wire.
    #[inline]
    pub const fn msb(&self) -> u8 {
        ((self.0 >> 7) & 0x7F) as u8
    }
}
