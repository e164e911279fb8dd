//! Head readers: extracting and validating a request-line or
//! status-line plus its header block, including obsolete line folding
//! (RFC 7230 §3.2.4).
//!
//! `hyper::proto::h1::role::{Server,Client}Transaction::parse` is the
//! closest analogue (extract a head via `httparse`, convert into a
//! `MessageHead`) — reworked here to resolve folding before validating
//! each line, since `httparse` has no notion of folding at all and it
//! must be tolerated for compatibility with older senders.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::buf::ReceiveBuffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::grammar::{self, HeaderField};
use crate::headers::normalize;

/// Join obsolete-folded continuation lines (lines beginning with SP or
/// HTAB) onto the previous line, replacing the leading whitespace run
/// with a single space. A fold at the very start of the block has no
/// previous line to join, so it's treated as a `LocalProtocolError`
/// even though the offending bytes came from the peer.
fn unfold_lines(lines: Vec<Bytes>) -> Result<Vec<Bytes>> {
    let mut out: Vec<BytesMut> = Vec::with_capacity(lines.len());
    for line in lines {
        let is_fold = line.first().map_or(false, |&b| b == b' ' || b == b'\t');
        if is_fold {
            let prev = out.last_mut().ok_or_else(|| {
                Error::local("obsolete line folding at the start of a header block")
            })?;
            let trimmed = &line[line.iter().take_while(|&&b| b == b' ' || b == b'\t').count()..];
            prev.extend_from_slice(b" ");
            prev.extend_from_slice(trimmed);
        } else {
            out.push(BytesMut::from(&line[..]));
        }
    }
    Ok(out.into_iter().map(|b| b.freeze()).collect())
}

fn decode_header_block(raw_lines: Vec<Bytes>, cfg: &Config) -> Result<Vec<HeaderField>> {
    let lines = unfold_lines(raw_lines)?;
    if lines.len() > cfg.max_headers {
        return Err(Error::remote("too many headers"));
    }
    let mut fields = Vec::with_capacity(lines.len());
    for line in &lines {
        if line.len() > cfg.max_header_line_len {
            return Err(Error::remote("header line too long"));
        }
        fields.push(grammar::header_field(line, cfg.error_snippet_len)?);
    }
    Ok(fields)
}

/// `(CLIENT, IDLE)`: extract a header block and parse line 0 as a
/// request-line. Returns `None` if the block hasn't fully arrived yet.
pub fn read_request(buf: &mut ReceiveBuffer, cfg: &Config) -> Result<Option<Event>> {
    let mut lines = match buf.maybe_extract_lines() {
        None => return Ok(None),
        Some(lines) => lines,
    };
    if lines.is_empty() {
        return Err(Error::local("no request line received"));
    }
    let request_line_bytes = lines.remove(0);
    let request_line = grammar::request_line(&request_line_bytes, cfg.error_snippet_len)?;
    let fields = decode_header_block(lines, cfg)?;
    debug!(
        "parsed request: {} {} ({} headers)",
        String::from_utf8_lossy(&request_line.method),
        String::from_utf8_lossy(&request_line.target),
        fields.len()
    );

    Ok(Some(Event::Request {
        method: request_line.method,
        target: request_line.target,
        http_version: request_line.http_version,
        headers: normalize(fields),
    }))
}

/// `(SERVER, IDLE)` and `(SERVER, SEND_RESPONSE)`: extract a header
/// block and parse line 0 as a status-line, choosing between
/// `InformationalResponse` and `Response` by status code.
pub fn read_response(buf: &mut ReceiveBuffer, cfg: &Config) -> Result<Option<Event>> {
    let mut lines = match buf.maybe_extract_lines() {
        None => return Ok(None),
        Some(lines) => lines,
    };
    if lines.is_empty() {
        return Err(Error::remote("no status line received"));
    }
    let status_line_bytes = lines.remove(0);
    let status_line = grammar::status_line(&status_line_bytes, cfg.error_snippet_len)?;
    let fields = decode_header_block(lines, cfg)?;

    let status_code: u16 = std::str::from_utf8(&status_line.status_code)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::remote("invalid status code"))?;
    debug!("parsed response: {} ({} headers)", status_code, fields.len());

    Ok(Some(Event::response(
        status_line.http_version,
        status_code,
        status_line.reason,
        normalize(fields),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_simple_request() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let event = read_request(&mut buf, &Config::default()).unwrap().unwrap();
        match event {
            Event::Request {
                method,
                target,
                http_version,
                headers,
            } => {
                assert_eq!(&method[..], b"GET");
                assert_eq!(&target[..], b"/");
                assert_eq!(&http_version[..], b"HTTP/1.1");
                assert_eq!(headers, vec![(Bytes::from_static(b"host"), Bytes::from_static(b"x"))]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn empty_block_is_local_error() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"\r\n");
        assert!(read_request(&mut buf, &Config::default()).unwrap_err().is_local());
    }

    #[test]
    fn waits_for_full_head() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"GET / HTTP/1.1\r\n");
        assert!(read_request(&mut buf, &Config::default()).unwrap().is_none());
    }

    #[test]
    fn obsolete_folding_joins_continuation() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"GET / HTTP/1.1\r\nX: a\r\n b\r\n\r\n");
        let event = read_request(&mut buf, &Config::default()).unwrap().unwrap();
        match event {
            Event::Request { headers, .. } => {
                assert_eq!(headers, vec![(Bytes::from_static(b"x"), Bytes::from_static(b"a b"))]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fold_at_start_of_block_is_error() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"GET / HTTP/1.1\r\n X: a\r\n\r\n");
        assert!(read_request(&mut buf, &Config::default()).is_err());
    }

    #[test]
    fn response_status_line_without_reason() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"HTTP/1.1 200\r\n\r\n");
        let event = read_response(&mut buf, &Config::default()).unwrap().unwrap();
        match event {
            Event::Response { reason, status_code, .. } => {
                assert_eq!(status_code, 200);
                assert_eq!(&reason[..], b"");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn error_snippet_len_is_honored() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"this is not a request line\r\n\r\n");
        let cfg = Config {
            error_snippet_len: 5,
            ..Config::default()
        };
        let err = read_request(&mut buf, &cfg).unwrap_err();
        assert_eq!(err.snippet().unwrap().len(), 5);
    }

    #[test]
    fn too_many_headers_is_remote_error() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"GET / HTTP/1.1\r\n");
        for i in 0..5 {
            buf.append(format!("X-{}: v\r\n", i).as_bytes());
        }
        buf.append(b"\r\n");
        let cfg = Config {
            max_headers: 3,
            ..Config::default()
        };
        assert!(read_request(&mut buf, &cfg).unwrap_err().is_remote());
    }

    #[test]
    fn response_informational_status() {
        let mut buf = ReceiveBuffer::new();
        buf.append(b"HTTP/1.1 100 Continue\r\n\r\n");
        let event = read_response(&mut buf, &Config::default()).unwrap().unwrap();
        assert!(matches!(event, Event::InformationalResponse { .. }));
    }
}
