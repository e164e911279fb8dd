//! Event types: the tagged variants the parser emits on the way in,
//! and the driver accepts on the way out.
//!
//! Grounded in `hyper::proto::MessageHead` / `RequestLine` — a plain
//! value type carrying version, subject, and headers — generalized
//! into one tagged enum covering every piece of a message, since this
//! engine (unlike `hyper`) exposes the head/body/end-of-message split
//! directly to the caller instead of hiding it behind a streaming body
//! type.

use bytes::Bytes;

use crate::headers::HeaderList;

/// A protocol event: either something the parser extracted from
/// incoming bytes, or something the caller wants serialized and sent.
///
/// Fields are immutable after construction; events compare structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A request head: request-line plus headers.
    Request {
        method: Bytes,
        target: Bytes,
        http_version: Bytes,
        headers: HeaderList,
    },
    /// A `1xx` response head. Does not end the response phase.
    InformationalResponse {
        http_version: Bytes,
        status_code: u16,
        reason: Bytes,
        headers: HeaderList,
    },
    /// A final (`>= 200`) response head.
    Response {
        http_version: Bytes,
        status_code: u16,
        reason: Bytes,
        headers: HeaderList,
    },
    /// A chunk of body bytes. `chunk_start`/`chunk_end` only carry
    /// meaning for chunked framing; other framings always report both
    /// `true` for each `Data` they emit.
    Data {
        data: Bytes,
        chunk_start: bool,
        chunk_end: bool,
    },
    /// The end of the current message, carrying trailers (empty unless
    /// chunked framing produced a non-empty trailer block).
    EndOfMessage { headers: HeaderList },
    /// The connection has closed; terminal for both roles.
    ConnectionClosed,
    /// Sentinel: more bytes are required before another event can be
    /// produced.
    NeedData,
    /// Sentinel: no event can be produced right now without the caller
    /// taking some other action (e.g. starting the next cycle).
    Paused,
}

impl Event {
    /// Convenience constructor choosing `Response` or
    /// `InformationalResponse` based on the status code.
    pub fn response(
        http_version: Bytes,
        status_code: u16,
        reason: Bytes,
        headers: HeaderList,
    ) -> Event {
        if (100..200).contains(&status_code) {
            Event::InformationalResponse {
                http_version,
                status_code,
                reason,
                headers,
            }
        } else {
            Event::Response {
                http_version,
                status_code,
                reason,
                headers,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_dispatches_by_status() {
        let info = Event::response(Bytes::from_static(b"HTTP/1.1"), 100, Bytes::new(), vec![]);
        assert!(matches!(info, Event::InformationalResponse { .. }));

        let final_ = Event::response(Bytes::from_static(b"HTTP/1.1"), 200, Bytes::new(), vec![]);
        assert!(matches!(final_, Event::Response { .. }));
    }

    #[test]
    fn events_compare_structurally() {
        let a = Event::Data {
            data: Bytes::from_static(b"x"),
            chunk_start: true,
            chunk_end: true,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
