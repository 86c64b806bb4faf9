//! The XMI container skeleton.
//!
//! A single-sequence XMI file is laid out as:
//!
//! ```text
//! FORM:XDIR
//!   INFO        sequence count, little-endian u16, must be 1
//! CAT :XMID
//!   FORM:XMID
//!     [TIMB]    timbre list, unused by the converter
//!     [RBRN]    branch offsets, unused by the converter
//!     EVNT      event data, runs up to the end of the file
//! ```

use crate::{
    iff::{ChunkHeader, GroupHeader, Tag},
    prelude::*,
    primitive::{read_le_u16, Cursor},
};

/// The chunks of a validated single-sequence XMI file.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Xmi<'a> {
    /// Payload of the optional `TIMB` chunk.
    pub timbres: Option<&'a [u8]>,
    /// Payload of the optional `RBRN` chunk.
    pub branches: Option<&'a [u8]>,
    /// Payload of the `EVNT` chunk, never empty.
    pub events: &'a [u8],
}
impl<'a> Xmi<'a> {
    /// Validate the container skeleton and locate the event data.
    ///
    /// Any deviation from the expected layout is an `ErrorKind::Invalid` error.
    pub fn parse(raw: &'a [u8]) -> Result<Xmi<'a>> {
        let mut raw = Cursor::new(raw);

        let group = GroupHeader::read(&mut raw).context(err_invalid!("no form:xdir chunk"))?;
        ensure!(
            group.is(Tag::Form, Tag::Xdir),
            err_invalid!("invalid root chunk, expected form:xdir")
        );

        let info = ChunkHeader::read(&mut raw).context(err_invalid!("no info chunk"))?;
        ensure!(
            info.id == Tag::Info && info.length == 2,
            err_invalid!("invalid info chunk")
        );
        let sequences = read_le_u16(&mut raw).context(err_invalid!("no sequence count"))?;
        ensure!(
            sequences == 1,
            err_invalid!("the number of sequences must be 1 to convert to midi format 0")
        );

        let group = GroupHeader::read(&mut raw).context(err_invalid!("no cat:xmid chunk"))?;
        ensure!(
            group.is(Tag::Cat, Tag::Xmid),
            err_invalid!("invalid catalog chunk, expected cat:xmid")
        );

        let group = GroupHeader::read(&mut raw).context(err_invalid!("no form:xmid chunk"))?;
        ensure!(
            group.is(Tag::Form, Tag::Xmid),
            err_invalid!("invalid sequence chunk, expected form:xmid")
        );

        let mut chunk = ChunkHeader::read(&mut raw).context(err_invalid!("no sequence data"))?;

        let mut timbres = None;
        if chunk.id == Tag::Timb {
            timbres = Some(
                raw.split_checked(chunk.length as usize)
                    .ok_or(err_invalid!("timb chunk is out of range"))?,
            );
            debug!("skipping {} bytes of timbre data", chunk.length);
            chunk = ChunkHeader::read(&mut raw).context(err_invalid!("no chunk after timb"))?;
        }

        let mut branches = None;
        if chunk.id == Tag::Rbrn {
            branches = Some(
                raw.split_checked(chunk.length as usize)
                    .ok_or(err_invalid!("rbrn chunk is out of range"))?,
            );
            debug!("skipping {} bytes of branch data", chunk.length);
            chunk = ChunkHeader::read(&mut raw).context(err_invalid!("no chunk after rbrn"))?;
        }

        ensure!(chunk.id == Tag::Evnt, err_invalid!("expected evnt chunk"));
        //A single-sequence file has nothing after the event data
        ensure!(
            raw.remaining() == chunk.length as usize,
            err_invalid!("evnt chunk length does not match the remaining data")
        );
        let events = raw.unread();
        ensure!(!events.is_empty(), err_invalid!("evnt chunk is empty"));

        Ok(Xmi {
            timbres,
            branches,
            events,
        })
    }
}
