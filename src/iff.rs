//! XMI files are IFF containers: big-endian tagged, length-prefixed chunks, some of which
//! (`FORM`, `CAT `) nest further chunks behind a 4-byte type tag.
//! MIDI files reuse the same plain chunk header for `MThd` and `MTrk`.

use crate::{prelude::*, primitive::Cursor};

/// The closed set of chunk identifiers this crate reads or writes.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Tag {
    /// `FORM`, a group chunk.
    Form,
    /// `XDIR`, the type of the outer `FORM` group.
    Xdir,
    /// `INFO`, holds the sequence count.
    Info,
    /// `CAT `, a group chunk (note the trailing space).
    Cat,
    /// `XMID`, the type of the `CAT ` group and of each sequence `FORM`.
    Xmid,
    /// `TIMB`, the timbre list of a sequence.
    Timb,
    /// `EVNT`, the event data of a sequence.
    Evnt,
    /// `RBRN`, the branch offsets of a sequence.
    Rbrn,
    /// `MThd`, the MIDI header chunk.
    MThd,
    /// `MTrk`, a MIDI track chunk.
    MTrk,
}
impl Tag {
    /// The raw 4 bytes identifying this tag.
    pub const fn id(self) -> [u8; 4] {
        match self {
            Tag::Form => *b"FORM",
            Tag::Xdir => *b"XDIR",
            Tag::Info => *b"INFO",
            Tag::Cat => *b"CAT ",
            Tag::Xmid => *b"XMID",
            Tag::Timb => *b"TIMB",
            Tag::Evnt => *b"EVNT",
            Tag::Rbrn => *b"RBRN",
            Tag::MThd => *b"MThd",
            Tag::MTrk => *b"MTrk",
        }
    }

    /// Look up a tag by its raw bytes. Identifiers are compared exactly, so `mthd` is not
    /// `MThd`.
    pub fn from_id(id: [u8; 4]) -> Option<Tag> {
        Some(match &id {
            b"FORM" => Tag::Form,
            b"XDIR" => Tag::Xdir,
            b"INFO" => Tag::Info,
            b"CAT " => Tag::Cat,
            b"XMID" => Tag::Xmid,
            b"TIMB" => Tag::Timb,
            b"EVNT" => Tag::Evnt,
            b"RBRN" => Tag::Rbrn,
            b"MThd" => Tag::MThd,
            b"MTrk" => Tag::MTrk,
            _ => return None,
        })
    }

    fn read(raw: &mut Cursor) -> StdResult<Tag, &'static ErrorKind> {
        let id = raw
            .split_checked(4)
            .ok_or(err_invalid!("failed to read chunk id"))?;
        Tag::from_id([id[0], id[1], id[2], id[3]]).ok_or(err_invalid!("unknown chunk id"))
    }
}
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id = self.id();
        for &byte in id.iter() {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

/// A plain chunk header: a tag followed by the length of the payload after the header.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct ChunkHeader {
    pub id: Tag,
    /// Byte count of the payload, not including the header itself.
    pub length: u32,
}
impl ChunkHeader {
    /// Serialized size of a chunk header.
    pub const SIZE: usize = 8;

    pub fn new(id: Tag, length: u32) -> ChunkHeader {
        ChunkHeader { id, length }
    }

    /// Consumes exactly 8 bytes. Consumes nothing if fewer than 8 bytes remain.
    pub(crate) fn read(raw: &mut Cursor) -> StdResult<ChunkHeader, &'static ErrorKind> {
        ensure_remaining(raw, Self::SIZE)?;
        let id = Tag::read(raw)?;
        let length = u32::read(raw)?;
        Ok(ChunkHeader { id, length })
    }

    pub fn encode(&self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0..4].copy_from_slice(&self.id.id()[..]);
        bytes[4..8].copy_from_slice(&self.length.to_be_bytes()[..]);
        bytes
    }
}

/// A group chunk header, whose payload starts with a type tag and continues with nested chunks.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct GroupHeader {
    /// Either `Tag::Form` or `Tag::Cat`.
    pub id: Tag,
    pub length: u32,
    pub kind: Tag,
}
impl GroupHeader {
    /// Serialized size of a group chunk header.
    pub const SIZE: usize = 12;

    /// Consumes exactly 12 bytes. Consumes nothing if fewer than 12 bytes remain.
    pub(crate) fn read(raw: &mut Cursor) -> StdResult<GroupHeader, &'static ErrorKind> {
        ensure_remaining(raw, Self::SIZE)?;
        let id = Tag::read(raw)?;
        let length = u32::read(raw)?;
        let kind = Tag::read(raw)?;
        Ok(GroupHeader { id, length, kind })
    }

    /// Whether this is the group `id:kind` that the grammar expects at this point.
    pub fn is(&self, id: Tag, kind: Tag) -> bool {
        self.id == id && self.kind == kind
    }
}

fn ensure_remaining(raw: &Cursor, len: usize) -> StdResult<(), &'static ErrorKind> {
    if raw.remaining() < len {
        Err(err_invalid!("reached eof while reading chunk header"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_round_trip() {
        let all = [
            Tag::Form,
            Tag::Xdir,
            Tag::Info,
            Tag::Cat,
            Tag::Xmid,
            Tag::Timb,
            Tag::Evnt,
            Tag::Rbrn,
            Tag::MThd,
            Tag::MTrk,
        ];
        for &tag in all.iter() {
            assert_eq!(Tag::from_id(tag.id()), Some(tag));
        }
        assert_eq!(Tag::from_id(*b"CAT0"), None);
        assert_eq!(Tag::from_id(*b"MTHD"), None);
        assert_eq!(Tag::Cat.to_string(), "CAT ");
    }

    #[test]
    fn chunk_header() {
        let mut cursor = Cursor::new(b"INFO\x00\x00\x00\x02\x01\x00");
        let header = ChunkHeader::read(&mut cursor).unwrap();
        assert_eq!(header, ChunkHeader::new(Tag::Info, 2));
        assert_eq!(cursor.position(), ChunkHeader::SIZE);
        assert_eq!(&header.encode()[..], b"INFO\x00\x00\x00\x02");
    }

    #[test]
    fn group_header() {
        let mut cursor = Cursor::new(b"FORM\x00\x00\x01\x00XDIR");
        let group = GroupHeader::read(&mut cursor).unwrap();
        assert_eq!(group.length, 256);
        assert!(group.is(Tag::Form, Tag::Xdir));
        assert!(!group.is(Tag::Form, Tag::Xmid));
    }

    #[test]
    fn short_header_consumes_nothing() {
        let mut cursor = Cursor::new(b"FORM\x00\x00\x01\x00XDI");
        assert_eq!(
            GroupHeader::read(&mut cursor),
            Err(err_invalid!("reached eof while reading chunk header"))
        );
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut cursor = Cursor::new(b"LIST\x00\x00\x00\x00");
        assert_eq!(
            ChunkHeader::read(&mut cursor),
            Err(err_invalid!("unknown chunk id"))
        );
    }
}
