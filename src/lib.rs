#![deny(missing_debug_implementations)]

//! A sans-I/O HTTP/1.1 protocol engine.
//!
//! This crate parses and serializes HTTP/1.1 messages incrementally
//! from byte buffers and tracks the connection state machine for both
//! the client and the server side of an exchange. It performs no
//! network I/O itself — callers own the socket, feed received bytes
//! into a [`Connection`] via [`Connection::receive_data`], pull
//! [`Event`]s out with [`Connection::next_event`], and turn outgoing
//! `Event`s into bytes with [`Connection::send`].
//!
//! ```
//! use h1spec::{Connection, Event, Role};
//!
//! let mut conn = Connection::new(Role::Server);
//! conn.receive_data(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n", false);
//!
//! let request = conn.next_event().unwrap();
//! assert!(matches!(request, Event::Request { .. }));
//! ```

mod body;
mod buf;
mod config;
mod connection;
mod dispatch;
mod error;
mod event;
mod framing;
mod grammar;
mod head;
mod headers;
mod state;

pub use crate::config::Config;
pub use crate::connection::Connection;
pub use crate::error::{Error, Kind, LocalProtocolError, RemoteProtocolError, Result};
pub use crate::event::Event;
pub use crate::headers::HeaderList;
pub use crate::state::{Role, State};
