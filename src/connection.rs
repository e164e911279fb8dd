//! The connection driver: glues the buffer, grammar, events, state
//! model, body readers, head readers, and dispatch table together.
//! Feeds bytes in, drives state transitions on every event, and
//! serializes outgoing events back to bytes.
//!
//! Grounded in `hyper::proto::h1::conn::Conn` — the struct that owns a
//! `Buffered` read buffer plus a `State { reading, writing, keep_alive,
//! method, version }` and exposes `can_read_head`/`can_read_body` plus
//! a `poll_read`/`write_head` pair — reworked here with no I/O at all:
//! `receive_data`/`next_event`/`send` replace the `poll_*` methods, and
//! `State` becomes the two-role tracker from [`crate::state`].

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::body::{BodyReader, StepOutcome};
use crate::buf::ReceiveBuffer;
use crate::config::Config;
use crate::dispatch::{self, ReaderChoice};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::framing::{self, Framing};
use crate::head;
use crate::headers::{get_last, HeaderList};
use crate::state::{self, EventKind, Role, State};

/// Which side originated an event: decides whether an illegal
/// transition is surfaced as a `LocalProtocolError` (we misused the
/// API) or a `RemoteProtocolError` (the peer misbehaved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Send,
    Receive,
}

/// A sans-I/O HTTP/1.1 connection: owns the receive buffer and the
/// per-role state, and translates between bytes and [`Event`]s.
///
/// This type performs no I/O. The caller reads bytes off a socket and
/// hands them to [`Connection::receive_data`], pulls events out with
/// [`Connection::next_event`], and turns outgoing events into bytes
/// with [`Connection::send`].
#[derive(Debug)]
pub struct Connection {
    role: Role,
    cfg: Config,
    buf: ReceiveBuffer,
    client_state: State,
    server_state: State,
    client_wants_close: bool,
    server_wants_close: bool,
    client_http_version: Option<HttpVersion>,
    server_http_version: Option<HttpVersion>,
    last_request_method: Option<Bytes>,
    last_request_was_connect: bool,
    body_reader: Option<BodyReader>,
    pending_framing: Option<Framing>,
    eof_seen: bool,
    poisoned: Option<Box<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HttpVersion {
    Http10,
    Http11,
}

impl Connection {
    /// A fresh connection for `role`, with default [`Config`].
    pub fn new(role: Role) -> Connection {
        Connection::with_config(role, Config::default())
    }

    /// A fresh connection for `role`, with caller-supplied [`Config`].
    pub fn with_config(role: Role, cfg: Config) -> Connection {
        Connection {
            role,
            cfg,
            buf: ReceiveBuffer::new(),
            client_state: State::Idle,
            server_state: State::Idle,
            client_wants_close: false,
            server_wants_close: false,
            client_http_version: None,
            server_http_version: None,
            last_request_method: None,
            last_request_was_connect: false,
            body_reader: None,
            pending_framing: None,
            eof_seen: false,
            poisoned: None,
        }
    }

    /// Our own role's current state.
    pub fn our_state(&self) -> State {
        self.state_of(self.role)
    }

    /// The peer's current state.
    pub fn their_state(&self) -> State {
        self.state_of(self.role.other())
    }

    fn state_of(&self, role: Role) -> State {
        match role {
            Role::Client => self.client_state,
            Role::Server => self.server_state,
        }
    }

    fn set_state(&mut self, role: Role, state: State) {
        match role {
            Role::Client => self.client_state = state,
            Role::Server => self.server_state = state,
        }
    }

    fn wants_close(&self, role: Role) -> bool {
        match role {
            Role::Client => self.client_wants_close,
            Role::Server => self.server_wants_close,
        }
    }

    fn poison(&mut self, err: &Error) {
        warn!("connection entering ERROR state: {}", err);
        self.client_state = State::Error;
        self.server_state = State::Error;
        self.poisoned = Some(format!("{}", err).into_boxed_str());
    }

    fn check_not_poisoned(&self) -> Result<()> {
        if let Some(ref msg) = self.poisoned {
            return Err(Error::local("connection is in the ERROR state").with_cause(
                std::io::Error::new(std::io::ErrorKind::Other, msg.to_string()),
            ));
        }
        Ok(())
    }

    /// Apply `kind` to `role`'s state. `Request` additionally nudges
    /// the other role's state, since a client's request is observed by
    /// the server's own state machine too. Returns the new state of
    /// `role`.
    fn advance(&mut self, role: Role, kind: EventKind, direction: Direction) -> Result<State> {
        let from = self.state_of(role);
        let to = state::transition(role, from, kind).ok_or_else(|| {
            debug!("illegal transition: {} {:?} {:?} -> ?", role, from, kind);
            let message: &'static str = match direction {
                Direction::Send => "attempted to send an event illegal in the current state",
                Direction::Receive => "peer sent an event illegal in the current state",
            };
            match direction {
                Direction::Send => Error::local(message),
                Direction::Receive => Error::remote(message),
            }
        })?;
        trace!("{} {} -> {:?} on {:?}", role, from, to, kind);
        let to = if to == State::Done && self.wants_close(role) {
            State::MustClose
        } else {
            to
        };
        self.set_state(role, to);

        if kind == EventKind::Request {
            let other = role.other();
            let from2 = self.state_of(other);
            let to2 = state::transition(other, from2, EventKind::Request).ok_or_else(|| {
                Error::remote("request received while a prior exchange was still outstanding")
            })?;
            self.set_state(other, to2);
        }

        Ok(self.state_of(role))
    }

    fn force_closed(&mut self) {
        if !self.client_state.is_terminal() {
            self.client_state = State::Closed;
        }
        if !self.server_state.is_terminal() {
            self.server_state = State::Closed;
        }
    }

    fn maybe_switch_protocol(&mut self, status_code: u16) {
        let is_switch = status_code == 101
            || (self.last_request_was_connect && (200..300).contains(&status_code));
        if is_switch {
            self.client_state = State::SwitchedProtocol;
            self.server_state = State::SwitchedProtocol;
        }
    }

    // ---- receive side ----

    /// Append bytes received from the peer. Pass an empty slice with
    /// `eof = true` to signal the stream has closed; the resulting EOF
    /// is surfaced from a later [`Connection::next_event`] call.
    pub fn receive_data(&mut self, data: &[u8], eof: bool) {
        if !data.is_empty() {
            self.buf.append(data);
        }
        if eof {
            self.eof_seen = true;
        }
    }

    /// Produce the next event: a parsed message piece, [`Event::NeedData`]
    /// if more bytes are required, or [`Event::Paused`] if nothing can
    /// be parsed without the caller taking some other action.
    pub fn next_event(&mut self) -> Result<Event> {
        self.check_not_poisoned()?;
        let result = self.next_event_inner();
        if let Err(err) = &result {
            self.poison(err);
        }
        result
    }

    fn next_event_inner(&mut self) -> Result<Event> {
        let their_role = self.role.other();
        let choice = dispatch::choose(their_role, self.state_of(their_role));

        match choice {
            ReaderChoice::RequestHead => self.read_request_head(),
            ReaderChoice::ResponseHead => self.read_response_head(),
            ReaderChoice::Body => self.read_body(their_role),
            ReaderChoice::ExpectNothing => {
                if !self.buf.is_empty() {
                    return Err(Error::local("Got data when expecting EOF"));
                }
                self.maybe_close_on_eof()
            }
            ReaderChoice::None => self.maybe_close_on_eof(),
        }
    }

    fn maybe_close_on_eof(&mut self) -> Result<Event> {
        if self.eof_seen && self.buf.is_empty() {
            debug!("connection closed gracefully");
            self.force_closed();
            Ok(Event::ConnectionClosed)
        } else {
            Ok(Event::Paused)
        }
    }

    fn read_request_head(&mut self) -> Result<Event> {
        match head::read_request(&mut self.buf, &self.cfg)? {
            Some(Event::Request {
                method,
                target,
                http_version,
                headers,
            }) => {
                let version = parse_http_version(&http_version)?;
                self.client_http_version = Some(version);
                self.client_wants_close = wants_close(&headers, version);
                self.last_request_was_connect = method.eq_ignore_ascii_case(b"CONNECT");
                self.last_request_method = Some(method.clone());
                let request_framing = framing::determine(&headers, false, None, false)?;
                self.pending_framing = Some(request_framing);
                self.advance(Role::Client, EventKind::Request, Direction::Receive)?;
                Ok(Event::Request {
                    method,
                    target,
                    http_version,
                    headers,
                })
            }
            Some(_) => unreachable!("read_request only produces Request events"),
            None => {
                if self.eof_seen {
                    if self.buf.is_empty() {
                        self.force_closed();
                        Ok(Event::ConnectionClosed)
                    } else {
                        Err(Error::remote("connection closed before request head completed"))
                    }
                } else if self.buf.len() > self.cfg.max_buffer_size {
                    Err(Error::remote("request head is too large").with_status(431))
                } else {
                    Ok(Event::NeedData)
                }
            }
        }
    }

    fn read_response_head(&mut self) -> Result<Event> {
        match head::read_response(&mut self.buf, &self.cfg)? {
            Some(event) => {
                let (http_version, status_code, headers) = match &event {
                    Event::Response {
                        http_version,
                        status_code,
                        headers,
                        ..
                    }
                    | Event::InformationalResponse {
                        http_version,
                        status_code,
                        headers,
                        ..
                    } => (http_version.clone(), *status_code, headers.clone()),
                    _ => unreachable!(),
                };
                let version = parse_http_version(&http_version)?;
                self.server_http_version = Some(version);

                let is_informational = matches!(event, Event::InformationalResponse { .. });
                if is_informational {
                    self.advance(
                        Role::Server,
                        EventKind::InformationalResponse,
                        Direction::Receive,
                    )?;
                } else {
                    self.server_wants_close = wants_close(&headers, version);
                    let request_was_head = self
                        .last_request_method
                        .as_deref()
                        .map_or(false, |m| m.eq_ignore_ascii_case(b"HEAD"));
                    let framing =
                        framing::determine(&headers, true, Some(status_code), request_was_head)?;
                    self.pending_framing = Some(framing);
                    self.advance(Role::Server, EventKind::Response, Direction::Receive)?;
                }
                // 101 arrives as an InformationalResponse (100..200 covers
                // it), so the switch check runs unconditionally here
                // rather than only on the `Response` branch above.
                self.maybe_switch_protocol(status_code);
                Ok(event)
            }
            None => {
                if self.eof_seen {
                    if self.buf.is_empty() {
                        self.force_closed();
                        Ok(Event::ConnectionClosed)
                    } else {
                        Err(Error::remote(
                            "connection closed before response head completed",
                        ))
                    }
                } else if self.buf.len() > self.cfg.max_buffer_size {
                    Err(Error::remote("response head is too large"))
                } else {
                    Ok(Event::NeedData)
                }
            }
        }
    }

    fn read_body(&mut self, role: Role) -> Result<Event> {
        if self.body_reader.is_none() {
            // `pending_framing` was computed when the head for this
            // exchange was parsed; falling back here only matters if a
            // caller somehow reaches `SendBody` without us having seen
            // a head first, which the dispatch table rules out.
            let framing = self.pending_framing.take().unwrap_or(if role == Role::Client {
                Framing::NoBody
            } else {
                Framing::Http10
            });
            self.body_reader = Some(match framing {
                Framing::ContentLength(n) => BodyReader::content_length(n),
                Framing::Chunked => BodyReader::chunked(),
                Framing::Http10 => BodyReader::http10(),
                Framing::NoBody => BodyReader::content_length(0),
            });
        }

        let reader = self.body_reader.as_mut().unwrap();
        match reader.step(&mut self.buf, &self.cfg)? {
            StepOutcome::Data(event) => Ok(event),
            StepOutcome::EndOfMessage(event) => {
                self.body_reader = None;
                self.advance(role, EventKind::EndOfMessage, Direction::Receive)?;
                Ok(event)
            }
            StepOutcome::NeedData => {
                if self.eof_seen {
                    let event = self.body_reader.as_ref().unwrap().on_eof()?;
                    self.body_reader = None;
                    self.advance(role, EventKind::EndOfMessage, Direction::Receive)?;
                    Ok(event)
                } else {
                    Ok(Event::NeedData)
                }
            }
        }
    }

    // ---- send side ----

    /// Validate `event` against our own state, serialize it, and
    /// advance our state. Returns the bytes to write to the peer.
    pub fn send(&mut self, event: Event) -> Result<Bytes> {
        self.check_not_poisoned()?;
        let result = self.send_inner(event);
        if let Err(err) = &result {
            self.poison(err);
        }
        result
    }

    fn send_inner(&mut self, event: Event) -> Result<Bytes> {
        let role = self.role;
        match (&event, role) {
            (Event::Request { .. }, Role::Server)
            | (Event::Response { .. }, Role::Client)
            | (Event::InformationalResponse { .. }, Role::Client) => {
                return Err(Error::local("this role cannot send that kind of event"));
            }
            _ => {}
        }
        match event {
            Event::Request {
                ref method,
                ref target,
                ref http_version,
                ref headers,
            } => {
                let version = parse_http_version(http_version)?;
                self.client_http_version = Some(version);
                self.client_wants_close = wants_close(headers, version);
                self.last_request_was_connect = method.eq_ignore_ascii_case(b"CONNECT");
                self.last_request_method = Some(method.clone());
                let request_framing = framing::determine(headers, false, None, false)?;
                self.pending_framing = Some(request_framing);
                self.advance(Role::Client, EventKind::Request, Direction::Send)?;
                Ok(encode_request(method, target, http_version, headers))
            }
            Event::InformationalResponse {
                ref http_version,
                status_code,
                ref reason,
                ref headers,
            } => {
                self.advance(
                    Role::Server,
                    EventKind::InformationalResponse,
                    Direction::Send,
                )?;
                // 101 arrives here too (100..200 covers it in
                // Event::response), so the switch check can't live only
                // on the Response arm below.
                self.maybe_switch_protocol(status_code);
                Ok(encode_status_line(http_version, status_code, reason, headers))
            }
            Event::Response {
                ref http_version,
                status_code,
                ref reason,
                ref headers,
            } => {
                let version = parse_http_version(http_version)?;
                self.server_http_version = Some(version);
                self.server_wants_close = wants_close(headers, version);
                let request_was_head = self
                    .last_request_method
                    .as_deref()
                    .map_or(false, |m| m.eq_ignore_ascii_case(b"HEAD"));
                let framing =
                    framing::determine(headers, true, Some(status_code), request_was_head)?;
                self.pending_framing = Some(framing);
                self.advance(Role::Server, EventKind::Response, Direction::Send)?;
                self.maybe_switch_protocol(status_code);
                Ok(encode_status_line(http_version, status_code, reason, headers))
            }
            Event::Data {
                ref data,
                chunk_start,
                chunk_end,
            } => {
                self.advance(role, EventKind::Data, Direction::Send)?;
                Ok(encode_data(data, self.pending_framing, chunk_start, chunk_end))
            }
            Event::EndOfMessage { ref headers } => {
                let bytes = encode_end_of_message(self.pending_framing, headers);
                self.advance(role, EventKind::EndOfMessage, Direction::Send)?;
                self.pending_framing = None;
                Ok(bytes)
            }
            Event::ConnectionClosed => {
                self.advance(role, EventKind::ConnectionClosed, Direction::Send)?;
                Ok(Bytes::new())
            }
            Event::NeedData | Event::Paused => {
                Err(Error::local("NeedData/Paused are sentinels, not sendable events"))
            }
        }
    }

    /// Reset both roles to `Idle` and drop per-exchange state, ready
    /// for the next pipelined request/response pair. Precondition:
    /// both roles are currently `Done`.
    pub fn start_next_cycle(&mut self) -> Result<()> {
        self.check_not_poisoned()?;
        if self.client_state != State::Done || self.server_state != State::Done {
            return Err(Error::local(
                "start_next_cycle requires both roles to be DONE",
            ));
        }
        self.client_state = State::Idle;
        self.server_state = State::Idle;
        self.client_wants_close = false;
        self.server_wants_close = false;
        self.last_request_method = None;
        self.last_request_was_connect = false;
        self.body_reader = None;
        self.pending_framing = None;
        Ok(())
    }
}

impl Role {
    fn other(self) -> Role {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }
}

fn parse_http_version(bytes: &[u8]) -> Result<HttpVersion> {
    match bytes {
        b"HTTP/1.1" => Ok(HttpVersion::Http11),
        b"HTTP/1.0" => Ok(HttpVersion::Http10),
        _ => Err(Error::remote("unsupported HTTP version")),
    }
}

fn wants_close(headers: &HeaderList, version: HttpVersion) -> bool {
    match get_last(headers, b"connection") {
        Some(value) => {
            value_contains_token(value, b"close")
                || (version == HttpVersion::Http10 && !value_contains_token(value, b"keep-alive"))
        }
        None => version == HttpVersion::Http10,
    }
}

fn value_contains_token(value: &[u8], token: &[u8]) -> bool {
    value
        .split(|&b| b == b',')
        .map(|part| trim_ascii_whitespace(part))
        .any(|part| part.eq_ignore_ascii_case(token))
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    match start {
        None => &[],
        Some(start) => {
            let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).unwrap();
            &bytes[start..=end]
        }
    }
}

// ---- serialization ----

fn encode_request(method: &[u8], target: &[u8], http_version: &[u8], headers: &HeaderList) -> Bytes {
    let mut out = BytesMut::with_capacity(64 + headers.len() * 32);
    out.extend_from_slice(method);
    out.put_u8(b' ');
    out.extend_from_slice(target);
    out.put_u8(b' ');
    out.extend_from_slice(http_version);
    out.extend_from_slice(b"\r\n");
    encode_headers(&mut out, headers);
    out.freeze()
}

fn encode_status_line(
    http_version: &[u8],
    status_code: u16,
    reason: &[u8],
    headers: &HeaderList,
) -> Bytes {
    let mut out = BytesMut::with_capacity(64 + headers.len() * 32);
    out.extend_from_slice(http_version);
    out.put_u8(b' ');
    use std::fmt::Write as _;
    write!(out, "{}", status_code).expect("write to BytesMut is infallible");
    if !reason.is_empty() {
        out.put_u8(b' ');
        out.extend_from_slice(reason);
    }
    out.extend_from_slice(b"\r\n");
    encode_headers(&mut out, headers);
    out.freeze()
}

fn encode_headers(out: &mut BytesMut, headers: &HeaderList) {
    for (name, value) in headers {
        out.extend_from_slice(name);
        out.extend_from_slice(b": ");
        out.extend_from_slice(value);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}

fn encode_data(data: &[u8], framing: Option<Framing>, _chunk_start: bool, chunk_end: bool) -> Bytes {
    match framing {
        Some(Framing::Chunked) => {
            let mut out = BytesMut::with_capacity(data.len() + 16);
            write_hex(&mut out, data.len() as u64);
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
            let _ = chunk_end;
            out.freeze()
        }
        _ => Bytes::copy_from_slice(data),
    }
}

fn encode_end_of_message(framing: Option<Framing>, trailers: &HeaderList) -> Bytes {
    match framing {
        Some(Framing::Chunked) => {
            let mut out = BytesMut::with_capacity(16 + trailers.len() * 32);
            out.extend_from_slice(b"0\r\n");
            encode_trailers(&mut out, trailers);
            out.freeze()
        }
        _ => Bytes::new(),
    }
}

fn encode_trailers(out: &mut BytesMut, trailers: &HeaderList) {
    for (name, value) in trailers {
        out.extend_from_slice(name);
        out.extend_from_slice(b": ");
        out.extend_from_slice(value);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
}

fn write_hex(out: &mut BytesMut, mut n: u64) {
    if n == 0 {
        out.put_u8(b'0');
        return;
    }
    let mut digits = [0u8; 16];
    let mut i = 16;
    while n > 0 {
        i -= 1;
        let d = (n % 16) as u8;
        digits[i] = if d < 10 { b'0' + d } else { b'a' + (d - 10) };
        n /= 16;
    }
    out.extend_from_slice(&digits[i..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    /// 100-continue leaves the server's own state at `SendHeaders`
    /// after the informational response, before the final response.
    #[test]
    fn informational_response_keeps_server_in_send_headers() {
        let mut conn = Connection::new(Role::Client);
        conn.send(Event::Request {
            method: Bytes::from_static(b"POST"),
            target: Bytes::from_static(b"/"),
            http_version: Bytes::from_static(b"HTTP/1.1"),
            headers: vec![],
        })
        .unwrap();
        conn.send(Event::EndOfMessage { headers: vec![] }).unwrap();

        conn.receive_data(b"HTTP/1.1 100 Continue\r\n\r\n", false);
        conn.next_event().unwrap();
        assert_eq!(conn.their_state(), State::SendHeaders);
    }

    #[test]
    fn head_request_forces_no_body_on_response() {
        let mut conn = Connection::new(Role::Client);
        conn.send(Event::Request {
            method: Bytes::from_static(b"HEAD"),
            target: Bytes::from_static(b"/"),
            http_version: Bytes::from_static(b"HTTP/1.1"),
            headers: vec![],
        })
        .unwrap();
        conn.send(Event::EndOfMessage { headers: vec![] }).unwrap();

        conn.receive_data(
            b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n",
            false,
        );
        assert!(matches!(conn.next_event().unwrap(), Event::Response { .. }));
        // Even though Content-Length: 100 was sent, a HEAD response has
        // no body: the very next event must be EndOfMessage.
        assert_eq!(conn.next_event().unwrap(), Event::EndOfMessage { headers: vec![] });
    }

    #[test]
    fn ambiguous_framing_is_remote_error() {
        let mut conn = Connection::new(Role::Server);
        conn.receive_data(
            b"POST / HTTP/1.1\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\n\r\n",
            false,
        );
        assert!(conn.next_event().unwrap_err().is_remote());
    }

    #[test]
    fn pipelined_requests_wait_for_done() {
        let mut conn = Connection::new(Role::Server);
        conn.receive_data(b"GET /a HTTP/1.1\r\nHost: x\r\n\r\n", false);
        conn.receive_data(b"GET /b HTTP/1.1\r\nHost: x\r\n\r\n", false);

        match conn.next_event().unwrap() {
            Event::Request { target, .. } => assert_eq!(&target[..], b"/a"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(conn.next_event().unwrap(), Event::EndOfMessage { headers: vec![] });

        // The client side is already Done, but start_next_cycle
        // requires our own (server) side Done too, which only happens
        // once the response below is sent — until then the second
        // pipelined request line just sits buffered.
        conn.send(Event::Response {
            http_version: Bytes::from_static(b"HTTP/1.1"),
            status_code: 200,
            reason: Bytes::from_static(b"OK"),
            headers: vec![(Bytes::from_static(b"content-length"), Bytes::from_static(b"0"))],
        })
        .unwrap();
        conn.send(Event::EndOfMessage { headers: vec![] }).unwrap();

        conn.start_next_cycle().unwrap();
        match conn.next_event().unwrap() {
            Event::Request { target, .. } => assert_eq!(&target[..], b"/b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn must_close_after_connection_close_header() {
        let mut conn = Connection::new(Role::Server);
        conn.receive_data(
            b"GET / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n",
            false,
        );
        conn.next_event().unwrap();
        conn.next_event().unwrap();
        assert_eq!(conn.their_state(), State::MustClose);
    }

    #[test]
    fn switching_protocols_moves_both_roles() {
        let mut conn = Connection::new(Role::Client);
        conn.send(Event::Request {
            method: Bytes::from_static(b"GET"),
            target: Bytes::from_static(b"/"),
            http_version: Bytes::from_static(b"HTTP/1.1"),
            headers: vec![(Bytes::from_static(b"upgrade"), Bytes::from_static(b"websocket"))],
        })
        .unwrap();
        conn.send(Event::EndOfMessage { headers: vec![] }).unwrap();

        conn.receive_data(
            b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n",
            false,
        );
        conn.next_event().unwrap();
        assert_eq!(conn.our_state(), State::SwitchedProtocol);
        assert_eq!(conn.their_state(), State::SwitchedProtocol);
    }

    #[test]
    fn switching_protocols_moves_both_roles_on_send_side() {
        let mut conn = Connection::new(Role::Server);
        conn.receive_data(
            b"GET / HTTP/1.1\r\nUpgrade: websocket\r\n\r\n",
            false,
        );
        conn.next_event().unwrap();
        conn.next_event().unwrap();

        // A 101 is constructed as InformationalResponse (see
        // Event::response), not Response, so the switch has to be
        // checked on this arm too.
        conn.send(Event::InformationalResponse {
            http_version: Bytes::from_static(b"HTTP/1.1"),
            status_code: 101,
            reason: Bytes::from_static(b"Switching Protocols"),
            headers: vec![(Bytes::from_static(b"upgrade"), Bytes::from_static(b"websocket"))],
        })
        .unwrap();
        assert_eq!(conn.our_state(), State::SwitchedProtocol);
        assert_eq!(conn.their_state(), State::SwitchedProtocol);
    }

    #[test]
    fn oversized_head_is_rejected_before_completion() {
        let cfg = Config {
            max_buffer_size: 16,
            ..Config::default()
        };
        let mut conn = Connection::with_config(Role::Server, cfg);
        conn.receive_data(b"GET /way-too-long-a-target-for-this-limit HTTP/1.1\r\n", false);
        assert!(conn.next_event().unwrap_err().is_remote());
    }

    #[test]
    fn errors_are_fatal_and_sticky() {
        let _ = tracing_subscriber::fmt::try_init();
        let mut conn = Connection::new(Role::Server);
        conn.receive_data(b"not a valid request line at all\r\n\r\n", false);
        assert!(conn.next_event().is_err());
        assert!(conn.next_event().is_err());
        assert!(conn.send(Event::ConnectionClosed).is_err());
    }
}
