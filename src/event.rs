//! All sort of events and the XMI event decoder.

use crate::{
    gm,
    prelude::*,
    primitive::{Cursor, VarLen},
};

/// An event at an absolute time, in ticks from the start of the sequence.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Event<'a> {
    /// Absolute time of the event.
    pub time: u32,
    /// The type of event along with event-specific data.
    pub kind: EventKind<'a>,
}

/// Represents the different kinds of events and their associated data.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind<'a> {
    /// A message associated to a MIDI channel carrying musical data.
    Midi {
        /// The MIDI channel that this event is associated with.
        channel: u4,
        /// The MIDI message type and associated data.
        message: MidiMessage,
    },
    /// A meta-message other than end of track, such as a tempo change.
    ///
    /// Meta-messages decoded from XMI data carry at most 255 payload bytes, since their length
    /// is stored in a single byte.
    Meta {
        /// The raw meta-message type byte.
        kind: u8,
        /// The meta-message payload.
        data: &'a [u8],
    },
    /// Obligatory at track end.
    EndOfTrack,
}
impl EventKind<'_> {
    /// The status byte of a channel message, or the `0xFF` marker of a meta-message.
    pub fn status(&self) -> u8 {
        match self {
            EventKind::Midi { channel, message } => message.status_nibble() << 4 | channel.as_int(),
            EventKind::Meta { .. } | EventKind::EndOfTrack => 0xFF,
        }
    }

    /// Amount of bytes this event takes up in a MIDI track, not including its delta time.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            EventKind::Midi { message, .. } => message.data_len(),
            EventKind::Meta { data, .. } => 2 + data.len(),
            EventKind::EndOfTrack => 2,
        }
    }

    /// Write the status byte and the data of this event.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(self.status());
        match self {
            EventKind::Midi { message, .. } => message.write(out),
            EventKind::Meta { kind, data } => {
                out.push(*kind);
                out.push(data.len() as u8);
                out.extend_from_slice(data);
            }
            EventKind::EndOfTrack => out.extend_from_slice(&[0x2F, 0x00]),
        }
    }
}

/// Represents a MIDI message, usually associated to a MIDI channel.
///
/// Data bytes are kept exactly as they appear in the XMI data.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MidiMessage {
    /// Stop playing a note.
    ///
    /// XMI data never contains these; they are synthesized from note durations.
    NoteOff {
        /// The MIDI key to stop playing.
        key: u8,
        /// The velocity with which to stop playing it.
        vel: u8,
    },
    /// Start playing a note.
    NoteOn {
        /// The key to start playing.
        key: u8,
        /// The velocity (strength) with which to press it.
        vel: u8,
    },
    /// Modify the velocity of a note after it has been played.
    Aftertouch {
        /// The key for which to modify its velocity.
        key: u8,
        /// The new velocity for the key.
        vel: u8,
    },
    /// Modify the value of a MIDI controller.
    Controller {
        /// The controller to modify.
        controller: u8,
        /// The value to set it to.
        value: u8,
    },
    /// Change the program (also known as instrument) for a channel.
    ProgramChange {
        /// The new program (instrument) to use for the channel.
        program: u8,
    },
    /// Change the note velocity of a whole channel at once, without starting new notes.
    ChannelAftertouch {
        /// The new velocity for all notes currently playing in the channel.
        vel: u8,
    },
    /// Set the pitch bend value for the entire channel.
    PitchBend {
        /// Low 7 bits of the bend, sent first.
        lsb: u8,
        /// High 7 bits of the bend.
        msb: u8,
    },
}
impl MidiMessage {
    /// Midi messages have a known length.
    pub(crate) fn msg_length(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 1, 1, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// Receives the status byte and the `msg_length(status)` data bytes separately.
    ///
    /// Panics if the `status` is not a MIDI message status (0x80..=0xEF).
    pub(crate) fn read(status: u8, data: &[u8]) -> (u4, MidiMessage) {
        let channel = u4::from(status);
        let msg = match status >> 4 {
            0x8 => MidiMessage::NoteOff {
                key: data[0],
                vel: data[1],
            },
            0x9 => MidiMessage::NoteOn {
                key: data[0],
                vel: data[1],
            },
            0xA => MidiMessage::Aftertouch {
                key: data[0],
                vel: data[1],
            },
            0xB => MidiMessage::Controller {
                controller: data[0],
                value: data[1],
            },
            0xC => MidiMessage::ProgramChange { program: data[0] },
            0xD => MidiMessage::ChannelAftertouch { vel: data[0] },
            0xE => MidiMessage::PitchBend {
                lsb: data[0],
                msb: data[1],
            },
            _ => panic!("parsed midi message before checking that status is in range"),
        };
        (channel, msg)
    }

    /// Get the raw status nibble for this MIDI message type.
    pub(crate) fn status_nibble(&self) -> u8 {
        match self {
            MidiMessage::NoteOff { .. } => 0x8,
            MidiMessage::NoteOn { .. } => 0x9,
            MidiMessage::Aftertouch { .. } => 0xA,
            MidiMessage::Controller { .. } => 0xB,
            MidiMessage::ProgramChange { .. } => 0xC,
            MidiMessage::ChannelAftertouch { .. } => 0xD,
            MidiMessage::PitchBend { .. } => 0xE,
        }
    }

    fn data_len(&self) -> usize {
        Self::msg_length(self.status_nibble() << 4)
    }

    /// Write the data part of this message, not including the status.
    fn write(&self, out: &mut Vec<u8>) {
        match *self {
            MidiMessage::NoteOff { key, vel } => out.extend_from_slice(&[key, vel]),
            MidiMessage::NoteOn { key, vel } => out.extend_from_slice(&[key, vel]),
            MidiMessage::Aftertouch { key, vel } => out.extend_from_slice(&[key, vel]),
            MidiMessage::Controller { controller, value } => {
                out.extend_from_slice(&[controller, value])
            }
            MidiMessage::ProgramChange { program } => out.push(program),
            MidiMessage::ChannelAftertouch { vel } => out.push(vel),
            MidiMessage::PitchBend { lsb, msb } => out.extend_from_slice(&[lsb, msb]),
        }
    }
}

/// Why the decoder stopped reading event data.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TrackEnd {
    /// An explicit end of track marker was found.
    Marker,
    /// The event data ran out without an end of track marker.
    Exhausted,
    /// The event starting at `offset` needed more bytes than were left.
    Truncated { offset: usize },
    /// The byte at `offset` is not a command XMI data can contain.
    UnknownCommand { status: u8, offset: usize },
}
impl TrackEnd {
    /// Whether the whole event data was decoded.
    ///
    /// When it was not, a synthetic end of track has been appended at time 0.
    pub fn is_complete(&self) -> bool {
        match self {
            TrackEnd::Marker | TrackEnd::Exhausted => true,
            TrackEnd::Truncated { .. } | TrackEnd::UnknownCommand { .. } => false,
        }
    }
}

/// Events decoded from XMI event data, in the order they were decoded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Decoded<'a> {
    /// Events in decode order. Note off events are pushed right after their note on, so this
    /// list is generally not sorted by time.
    pub events: Vec<Event<'a>>,
    /// Microseconds per quarter note, from the last tempo meta-event.
    ///
    /// Zero if there was no tempo meta-event.
    pub tempo: u24,
    pub end: TrackEnd,
}

/// Decode the contents of an `EVNT` chunk.
///
/// Damaged event data is handled by cutting the track short: everything decoded up to the
/// damage is kept and a synthetic end of track is appended at time 0.
/// If the `strict` feature is enabled, damaged data is an `ErrorKind::Malformed` error instead.
pub fn decode(raw: &[u8]) -> Result<Decoded<'_>> {
    let mut decoder = Decoder {
        raw: Cursor::new(raw),
        time: 0,
        tempo: u24::new(0),
        events: Vec::with_capacity(raw.len() / 2),
        bad_marker: false,
        bad_duration: None,
    };
    let end = loop {
        if let Err(end) = decoder.step() {
            break end;
        }
    };
    if cfg!(feature = "strict") {
        ensure!(
            !decoder.bad_marker,
            err_malformed!("end of track marker is not followed by 0x00")
        );
        if let Some(err) = decoder.bad_duration {
            bail!(err);
        }
        match end {
            TrackEnd::Truncated { .. } => bail!(err_malformed!("event data is truncated")),
            TrackEnd::UnknownCommand { .. } => bail!(err_malformed!("unknown xmi command")),
            TrackEnd::Marker | TrackEnd::Exhausted => {}
        }
    }
    match end {
        TrackEnd::Truncated { offset } => {
            warn!("event data is truncated at byte {}, ending the track there", offset)
        }
        TrackEnd::UnknownCommand { status, offset } => warn!(
            "unknown command 0x{:02X} at byte {}, ending the track there",
            status, offset
        ),
        TrackEnd::Marker | TrackEnd::Exhausted => {}
    }
    if !end.is_complete() {
        decoder.push(0, EventKind::EndOfTrack);
    }
    Ok(Decoded {
        events: decoder.events,
        tempo: decoder.tempo,
        end,
    })
}

struct Decoder<'a> {
    raw: Cursor<'a>,
    /// Absolute time of the next event.
    time: u32,
    tempo: u24,
    events: Vec<Event<'a>>,
    bad_marker: bool,
    /// Why the duration of the last note on could not be read.
    bad_duration: Option<&'static ErrorKind>,
}
impl<'a> Decoder<'a> {
    fn push(&mut self, time: u32, kind: EventKind<'a>) {
        trace!("{:>8}: {:?}", time, kind);
        self.events.push(Event { time, kind });
    }

    /// Consume a delay byte or a whole event.
    ///
    /// Returns `Err` with the reason once no more events can be decoded.
    fn step(&mut self) -> StdResult<(), TrackEnd> {
        let offset = self.raw.position();
        let truncated = TrackEnd::Truncated { offset };
        let status = self.raw.peek().ok_or(TrackEnd::Exhausted)?;

        if status < 0x80 {
            //XMI delays are 7-bit values summed together, not a varlen int
            self.time = self.time.wrapping_add(status as u32);
            self.raw.split_checked(1);
            return Ok(());
        }

        if status == 0xFF {
            let head = self.raw.split_checked(3).ok_or(truncated)?;
            let (kind, len) = (head[1], head[2]);
            if kind == 0x2F {
                if len != 0x00 {
                    warn!(
                        "end of track marker at byte {} is followed by 0x{:02X} instead of 0x00",
                        offset, len
                    );
                    self.bad_marker = true;
                }
                self.push(self.time, EventKind::EndOfTrack);
                return Err(TrackEnd::Marker);
            }
            let data = self.raw.split_checked(len as usize).ok_or(truncated)?;
            if kind == 0x51 && len == 3 {
                self.tempo = u24::read(&mut Cursor::new(data)).map_err(|_| truncated)?;
                debug!("tempo: {} microseconds per quarter note", self.tempo);
            }
            self.push(self.time, EventKind::Meta { kind, data });
            return Ok(());
        }

        match status >> 4 {
            0x9 => {
                //Note on, followed by the note duration as a varlen int
                ensure_left(&self.raw, 4, truncated)?;
                let bytes = self.raw.split_checked(3).ok_or(truncated)?;
                let (channel, message) = MidiMessage::read(status, &bytes[1..]);
                self.push(self.time, EventKind::Midi { channel, message });

                let duration = match VarLen::decode(self.raw.unread()) {
                    Ok(duration) => duration,
                    Err(err) => {
                        warn!("invalid note duration at byte {}: {}", offset + 3, err);
                        self.bad_duration = Some(err);
                        return Err(truncated);
                    }
                };
                self.raw.split_checked(duration.len);
                let note_off = MidiMessage::NoteOff {
                    key: bytes[1],
                    vel: 0x7F,
                };
                self.push(
                    self.time.wrapping_add(duration.value.as_int()),
                    EventKind::Midi {
                        channel,
                        message: note_off,
                    },
                );
            }
            0xA | 0xB | 0xC | 0xD | 0xE => {
                let len = 1 + MidiMessage::msg_length(status);
                let bytes = self.raw.split_checked(len).ok_or(truncated)?;
                let (channel, message) = MidiMessage::read(status, &bytes[1..]);
                if let MidiMessage::ProgramChange { program } = message {
                    describe_program(channel, program);
                }
                self.push(self.time, EventKind::Midi { channel, message });
            }
            _ => return Err(TrackEnd::UnknownCommand { status, offset }),
        }
        Ok(())
    }
}

fn ensure_left(raw: &Cursor, len: usize, end: TrackEnd) -> StdResult<(), TrackEnd> {
    if raw.remaining() < len {
        Err(end)
    } else {
        Ok(())
    }
}

fn describe_program(channel: u4, program: u8) {
    if channel == gm::DRUM_CHANNEL {
        match gm::drum_kit_name(program) {
            Some(name) => debug!("midi channel {}, drum kit {}: {}", channel, program, name),
            None => debug!("midi channel {}: unknown drum kit {}", channel, program),
        }
    } else {
        match gm::instrument_name(program) {
            Some(name) => debug!("midi channel {}, instrument {}: {}", channel, program, name),
            None => warn!("midi channel {}: program {} is out of range", channel, program),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn midi(time: u32, status: u8, data: &[u8]) -> Event<'static> {
        let (channel, message) = MidiMessage::read(status, data);
        Event {
            time,
            kind: EventKind::Midi { channel, message },
        }
    }

    fn eot(time: u32) -> Event<'static> {
        Event {
            time,
            kind: EventKind::EndOfTrack,
        }
    }

    #[test]
    fn note_on_synthesizes_note_off() {
        let decoded = decode(&[0x90, 60, 100, 96]).unwrap();
        assert_eq!(
            decoded.events,
            vec![midi(0, 0x90, &[60, 100]), midi(96, 0x80, &[60, 127])]
        );
        assert_eq!(decoded.end, TrackEnd::Exhausted);
        assert_eq!(decoded.tempo, u24::new(0));
    }

    #[test]
    fn long_note_duration() {
        let decoded = decode(&[0x10, 0x93, 64, 80, 0x81, 0x00, 0xFF, 0x2F, 0x00]).unwrap();
        assert_eq!(
            decoded.events,
            vec![
                midi(16, 0x93, &[64, 80]),
                midi(16 + 128, 0x83, &[64, 127]),
                eot(16),
            ]
        );
        assert_eq!(decoded.end, TrackEnd::Marker);
    }

    #[test]
    fn delays_are_summed() {
        let decoded = decode(&[0x7F, 0x7F, 0x02, 0xB1, 7, 100, 0x05, 0xC1, 40]).unwrap();
        assert_eq!(
            decoded.events,
            vec![midi(256, 0xB1, &[7, 100]), midi(261, 0xC1, &[40])]
        );
    }

    #[test]
    fn every_channel_message() {
        let decoded = decode(&[
            0xA2, 60, 10, 0xB2, 7, 90, 0xC2, 5, 0xD2, 33, 0xE2, 0x00, 0x40,
        ])
        .unwrap();
        let messages: Vec<_> = decoded.events.iter().map(|ev| ev.kind).collect();
        let channel = u4::new(2);
        assert_eq!(
            messages,
            vec![
                EventKind::Midi {
                    channel,
                    message: MidiMessage::Aftertouch { key: 60, vel: 10 }
                },
                EventKind::Midi {
                    channel,
                    message: MidiMessage::Controller {
                        controller: 7,
                        value: 90
                    }
                },
                EventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange { program: 5 }
                },
                EventKind::Midi {
                    channel,
                    message: MidiMessage::ChannelAftertouch { vel: 33 }
                },
                EventKind::Midi {
                    channel,
                    message: MidiMessage::PitchBend {
                        lsb: 0x00,
                        msb: 0x40
                    }
                },
            ]
        );
        assert!(decoded.events.iter().all(|ev| ev.time == 0));
    }

    #[test]
    fn tempo_meta_event() {
        let decoded = decode(&[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0xFF, 0x2F, 0x00]).unwrap();
        assert_eq!(decoded.tempo, u24::new(500_000));
        assert_eq!(
            decoded.events,
            vec![
                Event {
                    time: 0,
                    kind: EventKind::Meta {
                        kind: 0x51,
                        data: &[0x07, 0xA1, 0x20],
                    },
                },
                eot(0),
            ]
        );
    }

    #[test]
    fn last_tempo_wins() {
        let decoded = decode(&[
            0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x10, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40,
        ])
        .unwrap();
        assert_eq!(decoded.tempo, u24::new(1_000_000));
        assert_eq!(decoded.events[1].time, 16);
    }

    #[test]
    fn odd_tempo_length_is_not_a_tempo() {
        let decoded = decode(&[0xFF, 0x51, 0x02, 0x07, 0xA1]).unwrap();
        assert_eq!(decoded.tempo, u24::new(0));
        assert_eq!(decoded.events.len(), 1);
    }

    #[test]
    fn marker_stops_decoding() {
        let decoded = decode(&[0x90, 60, 100, 0x10, 0x20, 0xFF, 0x2F, 0x00, 0xB0, 7, 100]).unwrap();
        assert_eq!(decoded.end, TrackEnd::Marker);
        assert_eq!(decoded.events.last(), Some(&eot(0x20)));
        assert_eq!(decoded.events.len(), 3);
    }

    #[test]
    fn encoded_lengths() {
        assert_eq!(midi(0, 0x90, &[60, 100]).kind.encoded_len(), 3);
        assert_eq!(midi(0, 0xC0, &[1]).kind.encoded_len(), 2);
        assert_eq!(eot(0).kind.encoded_len(), 3);
        let meta = EventKind::Meta {
            kind: 0x51,
            data: &[0x07, 0xA1, 0x20],
        };
        assert_eq!(meta.encoded_len(), 6);

        let mut out = Vec::new();
        meta.write(&mut out);
        midi(0, 0xE5, &[0x10, 0x40]).kind.write(&mut out);
        eot(0).kind.write(&mut out);
        assert_eq!(
            out,
            vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0xE5, 0x10, 0x40, 0xFF, 0x2F, 0x00]
        );
    }

    #[cfg(not(feature = "strict"))]
    mod recovery {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn truncated_controller() {
            let decoded = decode(&[0xC0, 5, 0xB0, 7]).unwrap();
            assert_eq!(decoded.end, TrackEnd::Truncated { offset: 2 });
            assert_eq!(decoded.events, vec![midi(0, 0xC0, &[5]), eot(0)]);
        }

        #[test]
        fn truncated_meta() {
            let decoded = decode(&[0x10, 0xFF, 0x01, 0x05, b'a', b'b']).unwrap();
            assert_eq!(decoded.end, TrackEnd::Truncated { offset: 1 });
            assert_eq!(decoded.events, vec![eot(0)]);

            let decoded = decode(&[0xFF, 0x2F]).unwrap();
            assert_eq!(decoded.end, TrackEnd::Truncated { offset: 0 });
        }

        #[test]
        fn note_on_needs_four_bytes() {
            let decoded = decode(&[0x90, 60, 100]).unwrap();
            assert_eq!(decoded.end, TrackEnd::Truncated { offset: 0 });
            assert_eq!(decoded.events, vec![eot(0)]);
        }

        #[test]
        fn broken_duration_keeps_note_on() {
            let decoded = decode(&[0x90, 60, 100, 0x81]).unwrap();
            assert_eq!(decoded.end, TrackEnd::Truncated { offset: 0 });
            assert_eq!(decoded.events, vec![midi(0, 0x90, &[60, 100]), eot(0)]);

            let decoded = decode(&[0x90, 60, 100, 0x80, 0x80, 0x80, 0x80, 0x00]).unwrap();
            assert_eq!(decoded.events, vec![midi(0, 0x90, &[60, 100]), eot(0)]);
        }

        #[test]
        fn unknown_command() {
            let decoded = decode(&[0x20, 0xC0, 5, 0x80, 60, 0, 0xC0, 6]).unwrap();
            assert_eq!(
                decoded.end,
                TrackEnd::UnknownCommand {
                    status: 0x80,
                    offset: 3
                }
            );
            assert_eq!(decoded.events, vec![midi(32, 0xC0, &[5]), eot(0)]);

            let decoded = decode(&[0xF0, 0x00]).unwrap();
            assert_eq!(
                decoded.end,
                TrackEnd::UnknownCommand {
                    status: 0xF0,
                    offset: 0
                }
            );
        }

        #[test]
        fn sloppy_end_of_track_is_accepted() {
            let decoded = decode(&[0x05, 0xFF, 0x2F, 0x01]).unwrap();
            assert_eq!(decoded.end, TrackEnd::Marker);
            assert_eq!(decoded.events, vec![eot(5)]);
        }
    }

    #[cfg(feature = "strict")]
    mod strict {
        use super::*;
        use pretty_assertions::assert_eq;

        fn malformed(raw: &[u8]) -> &'static str {
            match decode(raw) {
                Ok(decoded) => panic!("expected an error, decoded {:?}", decoded),
                Err(err) => match err.kind() {
                    ErrorKind::Malformed(msg) => msg,
                    ErrorKind::Invalid(msg) => panic!("unexpected invalid error: {}", msg),
                },
            }
        }

        #[test]
        fn damaged_data_is_rejected() {
            assert_eq!(malformed(&[0xC0, 5, 0xB0, 7]), "event data is truncated");
            assert_eq!(malformed(&[0x90, 60, 100]), "event data is truncated");
            assert_eq!(
                malformed(&[0x90, 60, 100, 0x81]),
                "unexpected eof while reading varlen int"
            );
            assert_eq!(
                malformed(&[0x90, 60, 100, 0x80, 0x80, 0x80, 0x80, 0x00]),
                "varlen integer larger than 4 bytes"
            );
            assert_eq!(malformed(&[0x80, 60, 0]), "unknown xmi command");
            assert_eq!(
                malformed(&[0xFF, 0x2F, 0x01]),
                "end of track marker is not followed by 0x00"
            );
        }
    }
}
