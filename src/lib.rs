//! # Overview
//!
//! `xmi2mid` converts XMI (Extended MIDI) sequences, the music format of many DOS-era games,
//! into Standard MIDI Files that any player or sequencer can open.
//!
//! Usage is as simple as:
//!
//! ```rust
//! let xmi = b"FORM\0\0\0\x0eXDIRINFO\0\0\0\x02\x01\0\
//!             CAT \0\0\0\x1bXMIDFORM\0\0\0\x0fXMIDEVNT\0\0\0\x03\xFF\x2F\0";
//!
//! let mid = xmi2mid::xmi_to_mid(xmi);
//! assert_eq!(&mid[..4], b"MThd");
//! assert_eq!(mid.len(), 26);
//! ```
//!
//! An empty output means the input was not a convertible XMI file.
//! Use [`convert`](fn.convert.html) to find out why:
//!
//! ```rust
//! let err = xmi2mid::convert(b"RIFF\0\0\0\x04WAVE").unwrap_err();
//! println!("{}", err);
//! ```
//!
//! # The conversion
//!
//! An XMI file is an IFF container wrapping an event stream that differs from a MIDI track in
//! two ways: delays are stored as a sum of 7-bit bytes, and notes are stored as a single note on
//! event with a duration instead of a note on/note off pair.
//!
//! The conversion runs in three steps, each available on its own:
//!
//! - [`Xmi::parse`](struct.Xmi.html#method.parse) validates the container and locates the
//!   event data.
//! - [`decode`](fn.decode.html) turns the event data into timed events, synthesizing a note off
//!   for every note on.
//! - [`Track`](struct.Track.html) sorts the events by time, and [`Smf`](struct.Smf.html)
//!   writes them out as a format 0 MIDI file.
//!
//! The resolution of the output file is derived from the tempo of the sequence, since XMI
//! ticks always run at 120Hz.
//!
//! # About features
//!
//! The mode in which the crate works is configurable through the use of cargo features.
//! Three optional features are available: `std`, `parallel` and `strict`.
//! `std` and `parallel` are enabled by default.
//!
//! - The `std` feature
//!
//!   This feature enables `Smf::write` and `Smf::save` (which use `std::io::Write`), and
//!   implements `std::error::Error` for the crate errors.
//!   Disabling this feature with `default-features = false` will make the crate
//!   `no_std + alloc`.
//!
//! - The `parallel` feature
//!
//!   Converts several files at once in [`convert_all`](fn.convert_all.html), through the
//!   `rayon` dependency. Implies `std`.
//!
//! - The `strict` feature
//!
//!   By default `xmi2mid` will convert damaged event data as far as it can, ending the track
//!   right before the damage.
//!   By enabling the `strict` feature such files are rejected instead, with errors of the kind
//!   `ErrorKind::Malformed`.
//!
//! # Logging
//!
//! Diagnostics are emitted through the `log` crate. Recovered damage is reported as warnings,
//! and the tempo and instruments of each sequence are reported at the debug level.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{ErrorKind, Result, ResultExt, StdResult},
        primitive::{u15, u24, u4, IntRead},
    };
    pub(crate) use alloc::vec::Vec;
    pub(crate) use core::{convert::TryFrom, fmt, mem, ops};
    pub(crate) use log::{debug, error, trace, warn};
    #[cfg(feature = "std")]
    pub(crate) use std::{fs::File, io, path::Path};
}

mod event;
pub mod gm;
mod iff;
mod primitive;
mod smf;
mod track;
mod xmi;

pub use crate::{
    error::{Error, ErrorKind, Result},
    event::{decode, Decoded, Event, EventKind, MidiMessage, TrackEnd},
    iff::{ChunkHeader, GroupHeader, Tag},
    primitive::{EncodedVarLen, Format, Timing, VarLen},
    smf::{Header, Smf},
    track::{Track, TrackEvent},
    xmi::Xmi,
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u15, u24, u28, u4};
}

use crate::prelude::*;

/// Convert a complete XMI file into the bytes of a Standard MIDI File.
pub fn convert(raw: &[u8]) -> Result<Vec<u8>> {
    Smf::from_xmi(raw)?.encode()
}

/// Convert a complete XMI file into the bytes of a Standard MIDI File.
///
/// Returns an empty buffer if the file cannot be converted. The reason is logged as an error.
pub fn xmi_to_mid(raw: &[u8]) -> Vec<u8> {
    match convert(raw) {
        Ok(mid) => mid,
        Err(err) => {
            error!("failed to convert xmi file: {:?}", err);
            Vec::new()
        }
    }
}

/// Convert several independent XMI files, returning the results in input order.
///
/// If the `parallel` feature is enabled the files are converted on the `rayon` thread pool.
pub fn convert_all<T: AsRef<[u8]> + Sync>(inputs: &[T]) -> Vec<Result<Vec<u8>>> {
    #[cfg(feature = "parallel")]
    {
        if inputs.len() > 1 {
            use rayon::prelude::*;

            return inputs
                .par_iter()
                .map(|raw| convert(raw.as_ref()))
                .collect();
        }
    }
    inputs.iter().map(|raw| convert(raw.as_ref())).collect()
}
