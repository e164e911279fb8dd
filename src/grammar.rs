//! Grammar validators: byte-level recognizers for the RFC 7230
//! productions this engine needs — request-line, status-line,
//! header-field, and chunk-header.
//!
//! `hyper`'s own `proto::h1` module hand-rolls exactly one of these
//! productions itself (the chunk-size grammar, in
//! `proto::h1::decode::ChunkedState::read_start`/`read_size`) rather
//! than reach for `httparse`, because `httparse` has no notion of a
//! chunk header at all. Obsolete line folding (RFC 7230 §3.2.4) must
//! also be resolved line-by-line *before* a header-field can be
//! validated, which rules out feeding whole head blocks to a
//! whole-buffer parser. Both of those push every production here
//! toward a small hand-rolled recognizer per RFC 7230 ABNF instead.
//!
//! Each recognizer takes one line's bytes (already stripped of its
//! trailing `\r?\n` by the caller, except `chunk_header` which expects
//! the terminator still attached) and returns named captures as byte
//! slices borrowed from the input, or a `RemoteProtocolError`.

use bytes::Bytes;

use crate::error::{Error, Result};

/// `method SP target SP HTTP-version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Bytes,
    pub target: Bytes,
    pub http_version: Bytes,
}

/// `HTTP-version SP status-code [SP reason]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub http_version: Bytes,
    pub status_code: Bytes,
    pub reason: Bytes,
}

/// `field-name ":" OWS field-value OWS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: Bytes,
    pub value: Bytes,
}

/// `1*HEXDIG [";" chunk-ext] CRLF`, chunk-ext discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub size: u64,
    /// Number of bytes consumed from the start of the input, including
    /// the terminating CRLF.
    pub consumed: usize,
}

fn remote_error(message: &'static str, snippet: &[u8], snippet_len: usize) -> Error {
    Error::remote(message).with_snippet(snippet, snippet_len)
}

/// True for RFC 7230 `tchar` (token character).
fn is_tchar(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#'
            | b'$'
            | b'%'
            | b'&'
            | b'\''
            | b'*'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~'
    ) || b.is_ascii_alphanumeric()
}

fn is_token(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|&b| is_tchar(b))
}

/// Trim RFC 7230 `OWS` (space and horizontal tab) from both ends.
fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ' && b != b'\t');
    match start {
        None => &[],
        Some(start) => {
            let end = bytes.iter().rposition(|&b| b != b' ' && b != b'\t').unwrap();
            &bytes[start..=end]
        }
    }
}

/// Validate and parse a request-line (no trailing CRLF expected).
/// `snippet_len` bounds how much of the line is retained on error, via
/// [`crate::config::Config::error_snippet_len`].
pub fn request_line(line: &Bytes, snippet_len: usize) -> Result<RequestLine> {
    let bytes = &line[..];
    let sp1 = bytes
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| remote_error("invalid request-line: missing method", bytes, snippet_len))?;
    let method = &bytes[..sp1];
    if !is_token(method) {
        return Err(remote_error("invalid request-line: bad method token", bytes, snippet_len));
    }
    let rest = &bytes[sp1 + 1..];
    let sp2 = rest
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| remote_error("invalid request-line: missing target", bytes, snippet_len))?;
    let target = &rest[..sp2];
    if target.is_empty() {
        return Err(remote_error("invalid request-line: empty target", bytes, snippet_len));
    }
    let version = &rest[sp2 + 1..];
    validate_http_version(version, bytes, snippet_len)?;

    Ok(RequestLine {
        method: line.slice_ref(method),
        target: line.slice_ref(target),
        http_version: line.slice_ref(version),
    })
}

/// Validate and parse a status-line. The reason phrase may be absent,
/// in which case `reason` is empty. `snippet_len` bounds how much of
/// the line is retained on error.
pub fn status_line(line: &Bytes, snippet_len: usize) -> Result<StatusLine> {
    let bytes = &line[..];
    let sp1 = bytes
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| remote_error("invalid status-line: missing status code", bytes, snippet_len))?;
    let version = &bytes[..sp1];
    validate_http_version(version, bytes, snippet_len)?;

    let rest = &bytes[sp1 + 1..];
    let (status_code, reason) = match rest.iter().position(|&b| b == b' ') {
        Some(sp2) => (&rest[..sp2], &rest[sp2 + 1..]),
        None => (rest, &rest[rest.len()..]),
    };
    if status_code.len() != 3 || !status_code.iter().all(u8::is_ascii_digit) {
        return Err(remote_error("invalid status-line: bad status code", bytes, snippet_len));
    }

    Ok(StatusLine {
        http_version: line.slice_ref(version),
        status_code: line.slice_ref(status_code),
        reason: line.slice_ref(reason),
    })
}

fn validate_http_version(version: &[u8], whole_line: &[u8], snippet_len: usize) -> Result<()> {
    let ok = matches!(version, b"HTTP/1.1" | b"HTTP/1.0");
    if ok {
        Ok(())
    } else {
        Err(remote_error("unsupported or malformed HTTP-version", whole_line, snippet_len))
    }
}

/// Validate and parse a single header line (no trailing CRLF expected,
/// and already un-folded — see [`crate::head::unfold_lines`]).
/// `snippet_len` bounds how much of the line is retained on error.
pub fn header_field(line: &Bytes, snippet_len: usize) -> Result<HeaderField> {
    let bytes = &line[..];
    let colon = bytes
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| remote_error("invalid header field: missing colon", bytes, snippet_len))?;
    let name = &bytes[..colon];
    if !is_token(name) {
        return Err(remote_error("invalid header field: bad field-name", bytes, snippet_len));
    }
    let value = trim_ows(&bytes[colon + 1..]);
    if value.iter().any(|&b| b == b'\r' || b == b'\n' || b == 0) {
        return Err(remote_error("invalid header field: bad field-value", bytes, snippet_len));
    }

    Ok(HeaderField {
        name: line.slice_ref(name),
        value: line.slice_ref(value),
    })
}

/// Validate and parse a chunk-header line, including its trailing
/// CRLF (or bare LF). Chunk-extensions are recognized syntactically —
/// rejecting a bare LF inside them — then discarded. `snippet_len`
/// bounds how much of the line is retained on error.
pub fn chunk_header(bytes: &[u8], snippet_len: usize) -> Result<ChunkHeader> {
    let mut size: u64 = 0;
    let mut i = 0;
    let mut saw_digit = false;
    while i < bytes.len() {
        match bytes[i] {
            b @ b'0'..=b'9' => {
                size = checked_hex_step(size, b - b'0')?;
                saw_digit = true;
            }
            b @ b'a'..=b'f' => {
                size = checked_hex_step(size, b - b'a' + 10)?;
                saw_digit = true;
            }
            b @ b'A'..=b'F' => {
                size = checked_hex_step(size, b - b'A' + 10)?;
                saw_digit = true;
            }
            _ => break,
        }
        i += 1;
    }
    if !saw_digit {
        return Err(remote_error("invalid chunk-header: missing size digit", bytes, snippet_len));
    }

    // Skip linear whitespace then an optional chunk-extension run.
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b';' {
        loop {
            if i >= bytes.len() {
                return Err(remote_error(
                    "invalid chunk-header: unterminated extension",
                    bytes,
                    snippet_len,
                ));
            }
            if bytes[i] == b'\r' {
                break;
            }
            if bytes[i] == b'\n' {
                return Err(remote_error(
                    "invalid chunk-header: bare LF in extension",
                    bytes,
                    snippet_len,
                ));
            }
            i += 1;
        }
    }

    if i < bytes.len() && bytes[i] == b'\r' {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'\n' {
        return Err(remote_error("invalid chunk-header: missing CRLF", bytes, snippet_len));
    }
    i += 1;

    Ok(ChunkHeader {
        size,
        consumed: i,
    })
}

fn checked_hex_step(size: u64, digit: u8) -> Result<u64> {
    size.checked_mul(16)
        .and_then(|s| s.checked_add(digit as u64))
        .ok_or_else(|| Error::remote("invalid chunk-header: size overflow"))
}
