//! Soft thru: software re-emission of received messages on the output port,
//! and the combined interface owning both halves of the engine.

use midithru_core::{Message, MessageKind, CHANNEL_OFF};

use crate::input::MidiIn;
use crate::output::MidiOut;
use crate::transport::ByteTransport;

/// Which received messages are mirrored to the output.
///
/// System messages (common and realtime) are mirrored in every mode except
/// `Off`; the mode selects among *channel* messages, relative to the input
/// channel. With an OMNI input channel no channel message compares equal,
/// so `SameChannel` mirrors none of them and `DifferentChannel` mirrors all
/// of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThruMode {
    /// Mirror nothing.
    Off,
    /// Mirror every message.
    Full,
    /// Mirror only channel messages on the input channel.
    SameChannel,
    /// Mirror only channel messages *not* on the input channel.
    DifferentChannel,
}

/// A full MIDI interface: decoder, encoder and the soft-thru coupling
/// between them.
///
/// The interface owns both transports. Each [`read`](Midi::read) drives the
/// decoder; when a message completes it is first mirrored to the output
/// according to the thru mode (before `read` returns, so callers observing
/// a message know its thru copy is already on the wire), then surfaced if
/// it passes the input-channel filter.
///
/// Thru re-enters the encoder, so mirrored channel messages take part in
/// the same running-status run as messages sent by the application.
///
/// ```
/// use midithru::{ByteTransport, FifoTransport, Midi, MessageKind};
///
/// let mut keyboard = FifoTransport::<64>::new();
/// for byte in [0x92, 0x3C, 0x64] {
///     keyboard.write(byte);
/// }
///
/// let mut midi: Midi<_, _> = Midi::new(keyboard, FifoTransport::<64>::new());
/// midi.begin_on(3);
/// assert!(midi.read());
/// assert_eq!(midi.kind(), MessageKind::NoteOn);
/// assert_eq!((midi.channel(), midi.data1(), midi.data2()), (3, 60, 100));
/// ```
pub struct Midi<I: ByteTransport, O: ByteTransport, const CAP: usize = 255> {
    input: MidiIn<I, CAP>,
    output: MidiOut<O>,
    thru_mode: ThruMode,
}

impl<I: ByteTransport, O: ByteTransport, const CAP: usize> Midi<I, O, CAP> {
    /// Create an interface over an input and an output transport.
    ///
    /// The interface starts listening on channel 1 with thru in `Full`
    /// mode; call [`begin`](Midi::begin) (or [`begin_on`](Midi::begin_on))
    /// to initialise the transports.
    pub fn new(input: I, output: O) -> Midi<I, O, CAP> {
        Midi {
            input: MidiIn::new(input),
            output: MidiOut::new(output),
            thru_mode: ThruMode::Full,
        }
    }

    /// Initialise both transports at the MIDI baud rate with the default
    /// settings: input channel 1, thru mirroring everything.
    pub fn begin(&mut self) {
        self.begin_on(1);
    }

    /// Like [`begin`](Midi::begin) with an explicit input channel.
    pub fn begin_on(&mut self, input_channel: u8) {
        self.input.begin_on(input_channel);
        self.output.begin();
        self.thru_mode = ThruMode::Full;
    }

    /// Drive the decoder and surface the next message addressed to this
    /// interface.
    ///
    /// Returns `true` when a message completed *and* passes the
    /// input-channel filter; the message is then readable through the
    /// getters. Messages that fail the filter still go through thru, so a
    /// `false` does not mean the wire was idle.
    pub fn read(&mut self) -> bool {
        let channel = self.input.input_channel();
        self.read_on(channel)
    }

    /// Like [`read`](Midi::read) with a one-off input channel, used for
    /// both filtering and thru comparison.
    pub fn read_on(&mut self, input_channel: u8) -> bool {
        if input_channel >= CHANNEL_OFF {
            // Input disabled: nothing is surfaced and nothing is mirrored.
            return false;
        }
        if !self.input.drain() {
            return false;
        }
        let message = self.input.message();
        forward(&mut self.output, self.thru_mode, input_channel, message);
        message.matches_input(input_channel)
    }

    /// The most recently completed message.
    #[inline]
    pub fn message(&self) -> &Message<CAP> {
        self.input.message()
    }

    /// The kind of the most recently completed message.
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.input.message().kind
    }

    /// The channel of the most recently completed message (`1..=16`, or 0
    /// for system messages).
    #[inline]
    pub fn channel(&self) -> u8 {
        self.input.message().channel
    }

    /// The first data byte of the most recently completed message. For
    /// SysEx this is the captured frame length.
    #[inline]
    pub fn data1(&self) -> u8 {
        self.input.message().data1
    }

    /// The second data byte of the most recently completed message.
    #[inline]
    pub fn data2(&self) -> u8 {
        self.input.message().data2
    }

    /// The captured SysEx frame, framing bytes included.
    #[inline]
    pub fn sysex(&self) -> &[u8] {
        self.input.message().sysex()
    }

    /// Whether a completely assembled message is available.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.input.message().valid
    }

    /// The channel this interface listens on.
    #[inline]
    pub fn input_channel(&self) -> u8 {
        self.input.input_channel()
    }

    /// Change the channel this interface listens on.
    #[inline]
    pub fn set_input_channel(&mut self, channel: u8) {
        self.input.set_input_channel(channel);
    }

    /// Select which received messages are mirrored to the output.
    #[inline]
    pub fn set_thru_mode(&mut self, mode: ThruMode) {
        self.thru_mode = mode;
    }

    /// The current thru mode.
    #[inline]
    pub fn thru_mode(&self) -> ThruMode {
        self.thru_mode
    }

    /// Turn mirroring on in the given mode. `thru_on(ThruMode::Full)`
    /// restores the `begin` default.
    #[inline]
    pub fn thru_on(&mut self, mode: ThruMode) {
        self.thru_mode = mode;
    }

    /// Turn mirroring off entirely.
    #[inline]
    pub fn thru_off(&mut self) {
        self.thru_mode = ThruMode::Off;
    }

    /// Whether any mirroring is active.
    #[inline]
    pub fn is_thru_enabled(&self) -> bool {
        self.thru_mode != ThruMode::Off
    }

    /// The receiving half.
    #[inline]
    pub fn input(&self) -> &MidiIn<I, CAP> {
        &self.input
    }

    /// Mutable access to the receiving half (and through it, the input
    /// transport).
    #[inline]
    pub fn input_mut(&mut self) -> &mut MidiIn<I, CAP> {
        &mut self.input
    }

    /// The sending half.
    #[inline]
    pub fn output(&self) -> &MidiOut<O> {
        &self.output
    }

    /// Mutable access to the sending half (and through it, the output
    /// transport).
    #[inline]
    pub fn output_mut(&mut self) -> &mut MidiOut<O> {
        &mut self.output
    }

    /// Enable or disable transmit-side running-status compression.
    #[inline]
    pub fn set_running_status(&mut self, enabled: bool) {
        self.output.set_running_status(enabled);
    }

    /// Send a Note On message.
    pub fn send_note_on(&mut self, note: u8, velocity: u8, channel: u8) {
        self.output.send_note_on(note, velocity, channel);
    }

    /// Send a Note Off message.
    pub fn send_note_off(&mut self, note: u8, velocity: u8, channel: u8) {
        self.output.send_note_off(note, velocity, channel);
    }

    /// Send a Control Change message.
    pub fn send_control_change(&mut self, control: u8, value: u8, channel: u8) {
        self.output.send_control_change(control, value, channel);
    }

    /// Send a Program Change message.
    pub fn send_program_change(&mut self, program: u8, channel: u8) {
        self.output.send_program_change(program, channel);
    }

    /// Send a Polyphonic AfterTouch message.
    pub fn send_after_touch_poly(&mut self, note: u8, pressure: u8, channel: u8) {
        self.output.send_after_touch_poly(note, pressure, channel);
    }

    /// Send a Channel AfterTouch message.
    pub fn send_after_touch(&mut self, pressure: u8, channel: u8) {
        self.output.send_after_touch(pressure, channel);
    }

    /// Send a Pitch Bend message from the unsigned 14-bit wire value.
    pub fn send_pitch_bend(&mut self, bend: u16, channel: u8) {
        self.output.send_pitch_bend(bend, channel);
    }

    /// Send a Pitch Bend message from a floating-point amount in
    /// `-1.0..=1.0`.
    pub fn send_pitch_bend_f32(&mut self, bend: f32, channel: u8) {
        self.output.send_pitch_bend_f32(bend, channel);
    }

    /// Send a System Exclusive frame.
    pub fn send_sys_ex(&mut self, data: &[u8], contains_boundaries: bool) {
        self.output.send_sys_ex(data, contains_boundaries);
    }

    /// Send a Song Position Pointer message.
    pub fn send_song_position(&mut self, beats: u16) {
        self.output.send_song_position(beats);
    }

    /// Send a Song Select message.
    pub fn send_song_select(&mut self, song: u8) {
        self.output.send_song_select(song);
    }

    /// Send a Tune Request message.
    pub fn send_tune_request(&mut self) {
        self.output.send_tune_request();
    }

    /// Send a MIDI Time Code Quarter Frame from its tag type and tag value.
    pub fn send_time_code_quarter_frame(&mut self, tag_type: u8, tag_value: u8) {
        self.output.send_time_code_quarter_frame(tag_type, tag_value);
    }

    /// Send a MIDI Time Code Quarter Frame from the already-composed data
    /// byte.
    pub fn send_time_code_quarter_frame_byte(&mut self, data: u8) {
        self.output.send_time_code_quarter_frame_byte(data);
    }

    /// Send a single-byte System message.
    pub fn send_real_time(&mut self, kind: MessageKind) {
        self.output.send_real_time(kind);
    }
}

/// Mirror one received message to the output according to the thru mode.
fn forward<T: ByteTransport, const CAP: usize>(
    output: &mut MidiOut<T>,
    mode: ThruMode,
    input_channel: u8,
    message: &Message<CAP>,
) {
    if message.kind.is_channel() {
        // OMNI (0) compares equal to no channel here: with an OMNI input,
        // SameChannel mirrors nothing and DifferentChannel everything.
        let same = message.channel == input_channel;
        let mirror = match mode {
            ThruMode::Off => false,
            ThruMode::Full => true,
            ThruMode::SameChannel => same,
            ThruMode::DifferentChannel => !same,
        };
        if mirror {
            output.send_channel(message.kind, message.data1, message.data2, message.channel);
        }
    } else if mode != ThruMode::Off {
        // System messages are mirrored verbatim through their matching
        // encoders.
        match message.kind {
            MessageKind::SystemExclusive => output.send_sys_ex(message.sysex(), true),
            MessageKind::TimeCodeQuarterFrame => {
                output.send_time_code_quarter_frame_byte(message.data1)
            }
            MessageKind::SongPosition => {
                output.send_song_position(message.song_position().unwrap_or(0))
            }
            MessageKind::SongSelect => output.send_song_select(message.data1),
            kind => output.send_real_time(kind),
        }
    }
}
