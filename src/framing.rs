//! Deriving a [`Framing`] descriptor from a head event's headers.
//!
//! Grounded in `hyper::proto::h1::role::{Client,Server}::set_length`
//! and the HEAD/CONNECT/204/304 `can_have_body` special-casing there —
//! generalized so it applies uniformly to both the request and
//! response side instead of being encode-only.

use tracing::debug;

use crate::error::{Error, Result};
use crate::headers::{get_all, HeaderList};

/// How many body bytes belong to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    ContentLength(u64),
    Chunked,
    /// Read-until-close: HTTP/1.0, or a response with neither framing
    /// header present.
    Http10,
    /// HEAD responses, 1xx, 204, 304, or messages with no
    /// body-indicating headers at all.
    NoBody,
}

/// Whether a just-completed head indicates no body regardless of any
/// `Content-Length`/`Transfer-Encoding` headers present.
fn forces_no_body(is_response: bool, status_code: Option<u16>, request_was_head: bool) -> bool {
    if !is_response {
        return false;
    }
    if request_was_head {
        return true;
    }
    matches!(status_code, Some(100..=199) | Some(204) | Some(304))
}

/// Derive the framing for a message just headed by `headers`.
///
/// `is_response` distinguishes request framing (never `Http10`) from
/// response framing (`Http10` read-until-close is only ever chosen for
/// responses). `status_code` is `None` for requests. `request_was_head`
/// is set by the caller, which tracks the method of the request this
/// response answers.
pub fn determine(
    headers: &HeaderList,
    is_response: bool,
    status_code: Option<u16>,
    request_was_head: bool,
) -> Result<Framing> {
    if forces_no_body(is_response, status_code, request_was_head) {
        return Ok(Framing::NoBody);
    }

    let transfer_encodings = get_all(headers, b"transfer-encoding");
    let content_lengths = get_all(headers, b"content-length");

    if !transfer_encodings.is_empty() {
        if !content_lengths.is_empty() {
            debug!("message has both Content-Length and Transfer-Encoding");
            return Err(Error::remote(
                "ambiguous framing: both Content-Length and Transfer-Encoding present",
            ));
        }
        let is_chunked = transfer_encodings
            .last()
            .map(|v| v.eq_ignore_ascii_case(b"chunked"))
            .unwrap_or(false);
        return if is_chunked {
            Ok(Framing::Chunked)
        } else {
            debug!("Transfer-Encoding present, but final coding is not chunked");
            Err(Error::remote(
                "Transfer-Encoding present without a final chunked coding",
            ))
        };
    }

    if !content_lengths.is_empty() {
        let first = content_lengths[0];
        if content_lengths.iter().any(|v| *v != first) {
            debug!("multiple, conflicting Content-Length headers");
            return Err(Error::remote("multiple conflicting Content-Length headers"));
        }
        let text = std::str::from_utf8(first)
            .map_err(|_| Error::remote("invalid Content-Length: not UTF-8"))?;
        let len: u64 = text
            .trim()
            .parse()
            .map_err(|_| Error::remote("invalid Content-Length: not a non-negative integer"))?;
        return Ok(Framing::ContentLength(len));
    }

    if is_response {
        // No framing header and no forced no-body status: read until
        // close. HTTP/1.0 and HTTP/1.1 responses are the same here —
        // the only difference a version makes is that HTTP/1.0 can't
        // use chunked, already ruled out above.
        Ok(Framing::Http10)
    } else {
        // A request with no framing header has no body.
        Ok(Framing::NoBody)
    }
}
