//! Simple building-block data that can be read in one go.
//! All primitives except variable-length quantities have a known, fixed size.
//! Also, primitives advance the cursor when read.

use crate::prelude::*;

/// A read position over an immutable byte slice.
///
/// Every read is bounds-checked, and a failed read leaves the position untouched.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Cursor<'a> {
    raw: &'a [u8],
    pos: usize,
}
impl<'a> Cursor<'a> {
    #[inline]
    pub(crate) fn new(raw: &'a [u8]) -> Cursor<'a> {
        Cursor { raw, pos: 0 }
    }

    /// Offset of the next unread byte from the start of the slice.
    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.raw.len() - self.pos
    }

    /// Get the remaining unread bytes.
    #[inline]
    pub(crate) fn unread(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    /// Consume exactly `len` bytes, or nothing at all if there are not enough left.
    #[inline]
    pub(crate) fn split_checked(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.raw.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }
}

/// Implemented on integer types for reading as big-endian.
pub(crate) trait IntRead: Sized {
    /// Reads a big-endian integer.
    fn read(raw: &mut Cursor) -> StdResult<Self, &'static ErrorKind>;
}

/// Implement simple big endian integer reads.
macro_rules! impl_read_int {
    {$( $int:ty ),*} => {
        $(
            impl IntRead for $int {
                #[inline]
                fn read(raw: &mut Cursor) -> StdResult<$int, &'static ErrorKind> {
                    let bytes = raw.split_checked(mem::size_of::<$int>())
                        .ok_or(err_invalid!("failed to read the expected integer"))?;
                    Ok(bytes.iter().fold(0, |mut acc, byte| {
                        acc = acc.checked_shl(8).unwrap_or(0);
                        acc |= *byte as $int;
                        acc
                    }))
                }
            }
        )*
    }
}
impl_read_int! {u8,u16,u32}

/// The XMI sequence count is the one little-endian field of the container.
pub(crate) fn read_le_u16(raw: &mut Cursor) -> StdResult<u16, &'static ErrorKind> {
    let bytes = raw
        .split_checked(2)
        .ok_or(err_invalid!("failed to read little-endian u16"))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, loses the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::from_int_lossy(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name (Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn from_int_lossy(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                } else {
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            /// The inner integer is guaranteed to be in range of the restricted wrapper.
            #[inline]
            pub fn as_int(self) -> $inner {
                Into::into(self)
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
        impl PartialOrd<$inner> for $name {
            fn partial_cmp(&self, rhs: &$inner) -> Option<core::cmp::Ordering> {
                Some(self.as_int().cmp(rhs))
            }
        }
    };
}
restricted_int! {
    /// A 15-bit integer type.
    ///
    /// Wraps the `u16` type and ensures that the top bit is always zero.
    u15: u16 => 15
}
restricted_int! {
    /// A 4-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 24-bit integer type.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}
impl IntRead for u24 {
    fn read(raw: &mut Cursor) -> StdResult<u24, &'static ErrorKind> {
        let bytes = raw
            .split_checked(3)
            .ok_or(err_invalid!("failed to read u24 bytes"))?;
        //Using lossy `from` because value is guaranteed to be 24 bits (3 bytes)
        Ok(u24::from(bytes.iter().fold(0, |mut acc, byte| {
            acc <<= 8;
            acc |= *byte as u32;
            acc
        })))
    }
}

restricted_int! {
    /// Referred to in the MIDI standard as "variable length int".
    ///
    /// Four 7-bit groups can hold at most 28 bits.
    u28: u32 => 28
}
impl u28 {
    /// Encode this integer as a MIDI variable-length quantity.
    ///
    /// Leading zero groups are skipped, so `0` takes up a single byte.
    pub fn encode_varlen(self) -> EncodedVarLen {
        let int = self.as_int();
        let mut out = EncodedVarLen::default();
        let mut skipping = true;
        for i in (0..4).rev() {
            let byte = ((int >> (i * 7)) & 0x7F) as u8;
            if skipping && byte == 0 && i != 0 {
                //Skip these leading zeros
            } else {
                //Write down this u7
                skipping = false;
                let byte = if i == 0 {
                    //Last byte
                    byte
                } else {
                    //Leading byte
                    byte | 0x80
                };
                out.buf[out.len as usize] = byte;
                out.len += 1;
            }
        }
        out
    }
}

/// A variable-length quantity read from raw bytes, along with the amount of bytes it occupied.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct VarLen {
    /// The decoded integer.
    pub value: u28,
    /// How many source bytes were consumed, between 1 and 4.
    pub len: usize,
}
impl VarLen {
    /// Decode a variable-length quantity from the start of `raw`.
    ///
    /// Fails if the data ends while the continuation bit is still set, or if the continuation
    /// bit is still set on the fourth byte.
    pub fn decode(raw: &[u8]) -> StdResult<VarLen, &'static ErrorKind> {
        let mut int: u32 = 0;
        for i in 0..4 {
            let byte = *raw
                .get(i)
                .ok_or(err_malformed!("unexpected eof while reading varlen int"))?;
            int <<= 7;
            int |= (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                //Since we did at max 4 reads of 7 bits each, there MUST be at max 28 bits in this int
                return Ok(VarLen {
                    value: u28::from(int),
                    len: i + 1,
                });
            }
        }
        Err(err_malformed!("varlen integer larger than 4 bytes"))
    }
}

/// The up to 4 bytes of an encoded variable-length quantity.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct EncodedVarLen {
    buf: [u8; 4],
    len: u8,
}
impl EncodedVarLen {
    /// Encode a plain integer. Bits above the 28th are dropped.
    #[inline]
    pub fn new(int: u32) -> EncodedVarLen {
        u28::from(int).encode_varlen()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
impl ops::Deref for EncodedVarLen {
    type Target = [u8];
    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// The order in which tracks should be laid out when playing back an SMF file.
///
/// An XMI sequence always becomes a single MIDI track.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// This file should have a single track only.
    SingleTrack,
}
impl Format {
    pub(crate) fn encode(&self) -> [u8; 2] {
        let code: u16 = match self {
            Format::SingleTrack => 0,
        };
        code.to_be_bytes()
    }
}

/// The timing for an SMF file.
///
/// XMI playback runs off a fixed 120 Hz clock, so converted files always use metrical timing.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Specifies ticks/beat as a 15-bit integer.
    ///
    /// The length of a beat is not standard, so in order to fully describe the length of a MIDI
    /// tick the tempo meta-event should be present.
    Metrical(u15),
}
impl Timing {
    pub(crate) fn encode(&self) -> [u8; 2] {
        match self {
            Timing::Metrical(ticksperbeat) => ticksperbeat.as_int().to_be_bytes(),
        }
    }
}
