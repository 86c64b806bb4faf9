use core::fmt;

#[cfg(debug_assertions)]
mod error_impl {
    use super::{Error, ErrorExt, ErrorKind};

    pub type ErrorInner = alloc::boxed::Box<Frame>;

    #[derive(Clone, Debug)]
    pub struct Frame {
        kind: &'static ErrorKind,
        cause: Option<Error>,
    }
    impl ErrorExt for Error {
        #[inline]
        fn kind(&self) -> ErrorKind {
            *self.inner.kind
        }
        #[inline]
        fn source(&self) -> Option<&Error> {
            self.inner.cause.as_ref()
        }
        #[inline]
        fn chain_ctx(self, ctx: &'static ErrorKind) -> Error {
            Error {
                inner: Frame {
                    kind: ctx,
                    cause: Some(self),
                }
                .into(),
            }
        }
    }
    impl From<&'static ErrorKind> for Error {
        #[inline]
        fn from(kind: &'static ErrorKind) -> Error {
            Error {
                inner: Frame {
                    kind,
                    cause: None,
                }
                .into(),
            }
        }
    }
}

#[cfg(not(debug_assertions))]
mod error_impl {
    use super::{Error, ErrorExt, ErrorKind};

    pub type ErrorInner = &'static ErrorKind;
    impl ErrorExt for Error {
        #[inline]
        fn kind(&self) -> ErrorKind {
            *self.inner
        }
        #[inline]
        fn source(&self) -> Option<&Error> {
            None
        }
        #[inline]
        fn chain_ctx(self, ctx: &'static ErrorKind) -> Error {
            Error { inner: ctx }
        }
    }
    impl From<&'static ErrorKind> for Error {
        #[inline]
        fn from(inner: &'static ErrorKind) -> Error {
            Error { inner }
        }
    }
}

/// Why an XMI file could not be converted.
///
/// Debug builds record which container level or event the failure happened in, reachable
/// through `source`. Release builds only keep the innermost `ErrorKind`.
#[derive(Clone)]
pub struct Error {
    inner: self::error_impl::ErrorInner,
}
impl Error {
    #[inline]
    pub fn new(kind: &'static ErrorKind) -> Error {
        Error::from(kind)
    }

    /// The class of the failure and its message.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        ErrorExt::kind(self)
    }

    /// The failure this one wraps, if it was raised while reading a nested chunk or event.
    #[inline]
    pub fn source(&self) -> Option<&Error> {
        ErrorExt::source(self)
    }
}
impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        let mut cause = self.source();
        while let Some(err) = cause {
            write!(f, "\n  while reading: {}", err.kind())?;
            cause = err.source();
        }
        Ok(())
    }
}
#[cfg(feature = "std")]
impl std::error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

trait ErrorExt {
    fn kind(&self) -> ErrorKind;
    fn source(&self) -> Option<&Error>;
    fn chain_ctx(self, ctx: &'static ErrorKind) -> Error;
}

/// Whether the container or the event stream is at fault.
///
/// The attached message names the check that failed and is meant for humans only.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container skeleton is broken: a wrong tag, a wrong group type, a bad `INFO` chunk,
    /// an `EVNT` length mismatch or a header running past the end of the data.
    ///
    /// Nothing can be rescued from such a file, so no MIDI output is produced.
    Invalid(&'static str),

    /// The event stream is damaged, but everything decoded before the damage is usable.
    ///
    /// This kind of error is not emitted by default, only if the `strict` crate feature is
    /// enabled. Otherwise the track is cut at the damaged event and closed with an end of
    /// track marker.
    Malformed(&'static str),
}
impl ErrorKind {
    /// The check that failed, without the `invalid xmi:` or `malformed xmi:` prefix.
    #[inline]
    pub fn message(&self) -> &'static str {
        match *self {
            ErrorKind::Invalid(msg) => msg,
            ErrorKind::Malformed(msg) => msg,
        }
    }
}
impl fmt::Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Invalid(msg) => write!(f, "invalid xmi: {}", msg),
            ErrorKind::Malformed(msg) => write!(f, "malformed xmi: {}", msg),
        }
    }
}

macro_rules! err_invalid {
    ($msg:expr) => {{
        const ERR_KIND: &'static ErrorKind = &ErrorKind::Invalid($msg);
        ERR_KIND
    }};
}
macro_rules! err_malformed {
    ($msg:expr) => {{
        const ERR_KIND: &'static ErrorKind = &ErrorKind::Malformed($msg);
        ERR_KIND
    }};
}

pub(crate) trait ResultExt<T> {
    fn context(self, ctx: &'static ErrorKind) -> StdResult<T, Error>;
}
impl<T> ResultExt<T> for StdResult<T, Error> {
    #[inline]
    fn context(self, ctx: &'static ErrorKind) -> StdResult<T, Error> {
        self.map_err(|err| err.chain_ctx(ctx))
    }
}
impl<T> ResultExt<T> for StdResult<T, &'static ErrorKind> {
    #[inline]
    fn context(self, ctx: &'static ErrorKind) -> StdResult<T, Error> {
        self.map_err(|errkind| Error::from(errkind).chain_ctx(ctx))
    }
}

pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn context_keeps_the_outer_kind() {
        let res: StdResult<(), &'static ErrorKind> = Err(err_invalid!("failed to read chunk id"));
        let err = res
            .context(err_invalid!("invalid form:xdir header"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid("invalid form:xdir header"));
        if cfg!(debug_assertions) {
            let src = err.source().expect("debug builds keep the error chain");
            assert_eq!(src.kind().message(), "failed to read chunk id");
        }
    }

    #[test]
    fn debug_walks_the_chain() {
        let res: Result<()> = Err(Error::new(err_malformed!("event data is truncated")));
        let err = res.context(err_invalid!("invalid evnt chunk")).unwrap_err();
        let expected = if cfg!(debug_assertions) {
            "invalid xmi: invalid evnt chunk\n  while reading: malformed xmi: event data is truncated"
        } else {
            "invalid xmi: invalid evnt chunk"
        };
        assert_eq!(format!("{:?}", err), expected);
    }

    #[test]
    fn display_names_the_class() {
        let invalid = Error::new(err_invalid!("sequence count must be 1"));
        let malformed = Error::new(err_malformed!("truncated event"));
        assert_eq!(invalid.to_string(), "invalid xmi: sequence count must be 1");
        assert_eq!(malformed.to_string(), "malformed xmi: truncated event");
    }
}
