//! Error types for the protocol engine.
//!
//! Every fallible operation in this crate returns one of the two kinds
//! described by [`Error`]: a [`Kind::Local`] error, raised when the
//! caller itself misused the state machine or handed it malformed data
//! to send, or a [`Kind::Remote`] error, raised when bytes arriving from
//! the peer violate HTTP/1.1 syntax or framing. Both are fatal to the
//! connection: once either is returned, the driver moves to
//! [`crate::state::State::Error`] and every subsequent call fails fast.

use std::error::Error as StdError;
use std::fmt;

/// Result type returned by fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

type Cause = Box<dyn StdError + Send + Sync>;

/// An error raised by the protocol engine.
///
/// Carries a [`Kind`] (local vs. remote), an optional status code that
/// best describes the problem to a peer, and an optional underlying
/// cause.
pub struct Error {
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: Kind,
    message: &'static str,
    status: Option<u16>,
    snippet: Option<Vec<u8>>,
    cause: Option<Cause>,
}

/// Which side of the connection is responsible for an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The caller attempted an event illegal in the current state, or
    /// asked the engine to serialize malformed headers.
    Local,
    /// The peer's bytes violated HTTP/1.1 syntax or framing, or the
    /// stream closed in the middle of a message.
    Remote,
}

impl Error {
    fn new(kind: Kind, message: &'static str) -> Error {
        Error {
            inner: Box::new(ErrorImpl {
                kind,
                message,
                status: None,
                snippet: None,
                cause: None,
            }),
        }
    }

    /// Construct a [`Kind::Local`] error: the caller did something illegal.
    pub fn local(message: &'static str) -> Error {
        Error::new(Kind::Local, message)
    }

    /// Construct a [`Kind::Remote`] error: the peer did something illegal.
    pub fn remote(message: &'static str) -> Error {
        Error::new(Kind::Remote, message)
    }

    /// Attach the HTTP status code that would best describe this error
    /// to a peer (e.g. `400` for malformed request syntax).
    pub fn with_status(mut self, status: u16) -> Error {
        self.inner.status = Some(status);
        self
    }

    /// Attach a truncated copy of the offending bytes, for diagnostics.
    /// `max_len` bounds how much of `bytes` is retained.
    pub fn with_snippet(mut self, bytes: &[u8], max_len: usize) -> Error {
        let len = bytes.len().min(max_len);
        self.inner.snippet = Some(bytes[..len].to_vec());
        self
    }

    /// Attach an underlying cause (e.g. a grammar-validator failure).
    pub fn with_cause<C: Into<Cause>>(mut self, cause: C) -> Error {
        self.inner.cause = Some(cause.into());
        self
    }

    /// Whether this is a [`Kind::Local`] error.
    pub fn is_local(&self) -> bool {
        self.inner.kind == Kind::Local
    }

    /// Whether this is a [`Kind::Remote`] error.
    pub fn is_remote(&self) -> bool {
        self.inner.kind == Kind::Remote
    }

    /// The best-effort status code describing this error to a peer, if any.
    pub fn status(&self) -> Option<u16> {
        self.inner.status
    }

    /// The (possibly truncated) offending bytes, if any were recorded.
    pub fn snippet(&self) -> Option<&[u8]> {
        self.inner.snippet.as_deref()
    }

    /// Which side the engine blames for this error.
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct(match self.inner.kind {
            Kind::Local => "LocalProtocolError",
            Kind::Remote => "RemoteProtocolError",
        });
        f.field("message", &self.inner.message);
        if let Some(status) = self.inner.status {
            f.field("status", &status);
        }
        if let Some(ref snippet) = self.inner.snippet {
            f.field("snippet", &String::from_utf8_lossy(snippet));
        }
        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.message)?;
        if let Some(ref snippet) = self.inner.snippet {
            write!(f, " (near {:?})", String::from_utf8_lossy(snippet))?;
        }
        if let Some(ref cause) = self.inner.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .cause
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }
}

/// Construct a `LocalProtocolError` (see [`Error::local`]).
#[allow(non_snake_case)]
pub fn LocalProtocolError(message: &'static str) -> Error {
    Error::local(message)
}

/// Construct a `RemoteProtocolError` (see [`Error::remote`]).
#[allow(non_snake_case)]
pub fn RemoteProtocolError(message: &'static str) -> Error {
    Error::remote(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_vs_remote() {
        let local = Error::local("bad send");
        assert!(local.is_local());
        assert!(!local.is_remote());

        let remote = Error::remote("bad bytes");
        assert!(remote.is_remote());
        assert!(!remote.is_local());
    }

    #[test]
    fn display_includes_snippet() {
        let err = Error::remote("invalid request-line").with_snippet(b"GET /\r\n", 64);
        let text = format!("{}", err);
        assert!(text.contains("invalid request-line"));
        assert!(text.contains("GET /"));
    }

    #[test]
    fn snippet_is_truncated() {
        let err = Error::remote("oops").with_snippet(&[b'a'; 200], 8);
        assert_eq!(err.snippet().unwrap().len(), 8);
    }

    #[test]
    fn with_status_round_trips() {
        let err = Error::local("bad request").with_status(400);
        assert_eq!(err.status(), Some(400));
    }
}
