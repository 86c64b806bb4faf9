//! Reorder decoded events into a playable MIDI track.

use crate::{
    event::{Decoded, Event, EventKind},
    prelude::*,
    primitive::EncodedVarLen,
};

/// An event placed in a MIDI track, along with its encoded delta time.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackEvent<'a> {
    /// Absolute time of the event, in ticks.
    pub time: u32,
    /// Ticks since the previous event in the track, ready to be written.
    pub delta: EncodedVarLen,
    pub kind: EventKind<'a>,
}
impl TrackEvent<'_> {
    /// Amount of bytes this event takes up in the track, including its delta time.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        self.delta.len() + self.kind.encoded_len()
    }
}

/// A sequence of events sorted by time, as they will be laid out in the `MTrk` chunk.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Track<'a> {
    events: Vec<TrackEvent<'a>>,
    tempo: u24,
}
impl<'a> Track<'a> {
    /// Sort events by time and compute their delta times.
    ///
    /// The sort is stable: events sharing a timestamp keep the order in which they were
    /// decoded.
    pub fn new(mut events: Vec<Event<'a>>, tempo: u24) -> Track<'a> {
        events.sort_by_key(|ev| ev.time);
        let mut last = 0;
        let events = events
            .into_iter()
            .map(|ev| {
                let delta = EncodedVarLen::new(ev.time - last);
                last = ev.time;
                TrackEvent {
                    time: ev.time,
                    delta,
                    kind: ev.kind,
                }
            })
            .collect();
        Track { events, tempo }
    }

    /// The events of this track, in playback order.
    #[inline]
    pub fn events(&self) -> &[TrackEvent<'a>] {
        &self.events
    }

    /// Microseconds per quarter note, or zero if the sequence never set a tempo.
    #[inline]
    pub fn tempo(&self) -> u24 {
        self.tempo
    }

    /// Exact size of the track payload, not including the `MTrk` chunk header.
    pub fn encoded_len(&self) -> usize {
        self.events.iter().map(TrackEvent::encoded_len).sum()
    }

    /// Write every event, delta time first.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        for ev in self.events.iter() {
            out.extend_from_slice(&ev.delta);
            ev.kind.write(out);
        }
    }
}
impl<'a> From<Decoded<'a>> for Track<'a> {
    fn from(decoded: Decoded<'a>) -> Track<'a> {
        Track::new(decoded.events, decoded.tempo)
    }
}
