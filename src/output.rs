//! The transmit half: structured messages out, raw bytes in the wire order.

use midithru_core::{MessageKind, PitchBend, CHANNEL_OFF, CHANNEL_OMNI, MIDI_BAUD};

use crate::transport::ByteTransport;

/// The encoding half of the engine.
///
/// Owns the output transport and the transmit-side running status: when
/// consecutive channel messages share a status byte, the repeats omit it.
/// System messages are written as-is and deliberately leave the running
/// status register alone, so a realtime byte can be dropped into the middle
/// of a compressed run without forcing the next message to repeat its
/// status.
///
/// Malformed requests (a channel of 0 or above 16, an unknown realtime kind)
/// are silently discarded; the engine never emits a partial channel message.
#[derive(Debug, Clone)]
pub struct MidiOut<T: ByteTransport> {
    transport: T,
    running_status: Option<u8>,
    use_running_status: bool,
}

impl<T: ByteTransport> MidiOut<T> {
    /// Create an encoder over the given transport. Running-status
    /// compression starts enabled.
    pub fn new(transport: T) -> MidiOut<T> {
        MidiOut {
            transport,
            running_status: None,
            use_running_status: true,
        }
    }

    /// Initialise the transport at the MIDI baud rate and clear the running
    /// status.
    pub fn begin(&mut self) {
        self.transport.begin(MIDI_BAUD);
        self.running_status = None;
    }

    /// Enable or disable transmit-side running-status compression.
    ///
    /// Disabling also forgets the current run, so the next channel message
    /// carries an explicit status byte.
    pub fn set_running_status(&mut self, enabled: bool) {
        self.use_running_status = enabled;
        if !enabled {
            self.running_status = None;
        }
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

    /// Tear down the encoder and recover the transport.
    #[inline]
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// The funnel for every channel message.
    ///
    /// Channel 0 is OMNI and cannot be sent *to*; anything at or above
    /// [`CHANNEL_OFF`] is equally meaningless. Either aborts the send and
    /// forgets the running status, so the stream stays parseable on the far
    /// end even after a caller slip-up mid-run.
    pub(crate) fn send_channel(&mut self, kind: MessageKind, data1: u8, data2: u8, channel: u8) {
        if channel == CHANNEL_OMNI || channel >= CHANNEL_OFF {
            self.running_status = None;
            return;
        }

        let data1 = data1 & 0x7F;
        let data2 = data2 & 0x7F;
        let status = kind.with_channel(channel);

        if self.use_running_status {
            if self.running_status != Some(status) {
                // New run: remember and emit the header.
                self.running_status = Some(status);
                self.transport.write(status);
            }
        } else {
            self.transport.write(status);
        }

        self.transport.write(data1);
        if kind.fixed_data_len() == Some(2) {
            self.transport.write(data2);
        }
    }

    /// Send a Note On message.
    pub fn send_note_on(&mut self, note: u8, velocity: u8, channel: u8) {
        self.send_channel(MessageKind::NoteOn, note, velocity, channel);
    }

    /// Send a Note Off message (an actual Note Off, not a zero-velocity
    /// Note On).
    pub fn send_note_off(&mut self, note: u8, velocity: u8, channel: u8) {
        self.send_channel(MessageKind::NoteOff, note, velocity, channel);
    }

    /// Send a Control Change message.
    pub fn send_control_change(&mut self, control: u8, value: u8, channel: u8) {
        self.send_channel(MessageKind::ControlChange, control, value, channel);
    }

    /// Send a Program Change message.
    pub fn send_program_change(&mut self, program: u8, channel: u8) {
        self.send_channel(MessageKind::ProgramChange, program, 0, channel);
    }

    /// Send a Polyphonic AfterTouch message, applying to a single key.
    pub fn send_after_touch_poly(&mut self, note: u8, pressure: u8, channel: u8) {
        self.send_channel(MessageKind::AfterTouchPoly, note, pressure, channel);
    }

    /// Send a Channel AfterTouch message, applying to all playing keys.
    pub fn send_after_touch(&mut self, pressure: u8, channel: u8) {
        self.send_channel(MessageKind::AfterTouchChannel, pressure, 0, channel);
    }

    /// Send a Pitch Bend message from the unsigned 14-bit wire value
    /// (`0..=16383`, centre at 8192).
    pub fn send_pitch_bend(&mut self, bend: u16, channel: u8) {
        self.send_channel(
            MessageKind::PitchBend,
            (bend & 0x7F) as u8,
            ((bend >> 7) & 0x7F) as u8,
            channel,
        );
    }

    /// Send a Pitch Bend message from a floating-point amount in
    /// `-1.0..=1.0`, where `0.0` means no bend.
    pub fn send_pitch_bend_f32(&mut self, bend: f32, channel: u8) {
        self.send_pitch_bend(PitchBend::from_f32(bend).as_u14(), channel);
    }

    /// Send a System Exclusive frame.
    ///
    /// With `contains_boundaries` the slice is emitted verbatim and must
    /// already carry its `0xF0`/`0xF7` framing; otherwise the framing bytes
    /// are added around it.
    pub fn send_sys_ex(&mut self, data: &[u8], contains_boundaries: bool) {
        if !contains_boundaries {
            self.transport.write(0xF0);
        }
        for &byte in data {
            self.transport.write(byte);
        }
        if !contains_boundaries {
            self.transport.write(0xF7);
        }
    }

    /// Send a Song Position Pointer message carrying a 14-bit beat count.
    pub fn send_song_position(&mut self, beats: u16) {
        self.transport.write(MessageKind::SongPosition.status());
        self.transport.write((beats & 0x7F) as u8);
        self.transport.write(((beats >> 7) & 0x7F) as u8);
    }

    /// Send a Song Select message.
    pub fn send_song_select(&mut self, song: u8) {
        self.transport.write(MessageKind::SongSelect.status());
        self.transport.write(song & 0x7F);
    }

    /// Send a Tune Request message.
    pub fn send_tune_request(&mut self) {
        self.send_real_time(MessageKind::TuneRequest);
    }

    /// Send a MIDI Time Code Quarter Frame from its tag type (3 bits) and
    /// tag value (4 bits).
    pub fn send_time_code_quarter_frame(&mut self, tag_type: u8, tag_value: u8) {
        self.send_time_code_quarter_frame_byte(((tag_type & 0x07) << 4) | (tag_value & 0x0F));
    }

    /// Send a MIDI Time Code Quarter Frame from the already-composed data
    /// byte.
    pub fn send_time_code_quarter_frame_byte(&mut self, data: u8) {
        self.transport.write(MessageKind::TimeCodeQuarterFrame.status());
        self.transport.write(data & 0x7F);
    }

    /// Send a single-byte System message: any realtime kind, or Tune
    /// Request (not realtime, but one byte anyway). Other kinds are
    /// discarded.
    pub fn send_real_time(&mut self, kind: MessageKind) {
        if kind.is_system_realtime() || kind == MessageKind::TuneRequest {
            self.transport.write(kind.status());
        }
    }
}
