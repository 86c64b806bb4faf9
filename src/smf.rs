//! Specific to the SMF packaging of a converted sequence.

use crate::{
    event::{self, EventKind},
    iff::{ChunkHeader, Tag},
    prelude::*,
    primitive::{Format, Timing},
    track::Track,
    xmi::Xmi,
};

/// A Standard MIDI File holding a single converted XMI sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Smf<'a> {
    pub header: Header,
    pub track: Track<'a>,
}
impl<'a> Smf<'a> {
    pub fn new(header: Header, track: Track<'a>) -> Smf<'a> {
        Smf { header, track }
    }

    /// Convert a complete XMI file.
    ///
    /// The resulting events borrow their meta-event payloads from `raw`.
    pub fn from_xmi(raw: &'a [u8]) -> Result<Smf<'a>> {
        let xmi = Xmi::parse(raw)?;
        let decoded = event::decode(xmi.events)?;
        let header = Header::from_tempo(decoded.tempo);
        Ok(Smf::new(header, Track::from(decoded)))
    }

    /// Exact size of the encoded file, header chunk included.
    pub fn encoded_len(&self) -> usize {
        ChunkHeader::SIZE + Header::SIZE + ChunkHeader::SIZE + self.track.encoded_len()
    }

    /// Serialize into a freshly allocated buffer of exactly `encoded_len()` bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let track_len = u32::try_from(self.track.encoded_len())
            .map_err(|_| err_invalid!("midi track size exceeds 32 bit range"))?;
        ensure!(
            self.track.events().iter().all(|ev| match ev.kind {
                EventKind::Meta { data, .. } => data.len() <= 0xFF,
                _ => true,
            }),
            err_invalid!("meta event payload exceeds 255 bytes")
        );

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&ChunkHeader::new(Tag::MThd, Header::SIZE as u32).encode());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&ChunkHeader::new(Tag::MTrk, track_len).encode());
        self.track.write(&mut out);
        debug!(
            "encoded midi file: {} ticks per beat, {} events, {} bytes",
            self.header.ticks_per_beat(),
            self.track.events().len(),
            out.len()
        );
        Ok(out)
    }

    /// Encode and write the whole file into a writer.
    #[cfg(feature = "std")]
    pub fn write<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let bytes = self
            .encode()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        out.write_all(&bytes)
    }

    /// Encode and write the whole file to the given path, replacing any existing file.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fn save_impl(smf: &Smf, path: &Path) -> io::Result<()> {
            smf.write(&mut File::create(path)?)
        }
        save_impl(self, path.as_ref())
    }
}

/// A MIDI file header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub format: Format,
    pub timing: Timing,
}
impl Header {
    /// Size of the `MThd` payload.
    pub const SIZE: usize = 6;

    /// Ticks per beat used when the sequence never sets a tempo.
    pub const DEFAULT_TICKS_PER_BEAT: u16 = 60;

    pub fn new(format: Format, timing: Timing) -> Header {
        Header { format, timing }
    }

    /// Derive the header of a single-track file from a tempo in microseconds per beat.
    ///
    /// XMI ticks run at a fixed 120Hz, so a beat lasts `tempo * 120 / 1_000_000` ticks.
    /// A zero tempo falls back to `DEFAULT_TICKS_PER_BEAT`.
    pub fn from_tempo(tempo: u24) -> Header {
        let ticks = if tempo > 0 {
            //At most 0xFFFFFF * 3 / 25000, well within 15 bits
            (tempo.as_int() * 3 / 25000) as u16
        } else {
            Self::DEFAULT_TICKS_PER_BEAT
        };
        Header::new(Format::SingleTrack, Timing::Metrical(u15::new(ticks)))
    }

    /// The resolution of the file in ticks per beat.
    pub fn ticks_per_beat(&self) -> u15 {
        match self.timing {
            Timing::Metrical(ticks) => ticks,
        }
    }

    /// Encode the header payload, for a file with exactly one track.
    fn encode(&self) -> [u8; 6] {
        let mut bytes = [0; 6];
        bytes[0..2].copy_from_slice(&self.format.encode()[..]);
        bytes[2..4].copy_from_slice(&1u16.to_be_bytes()[..]);
        bytes[4..6].copy_from_slice(&self.timing.encode()[..]);
        bytes
    }
}
