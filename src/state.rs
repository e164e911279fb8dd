//! The state model: per-role states and the table of legal transitions
//! between them.
//!
//! `hyper`'s `proto::h1::conn::{Reading, Writing, KA}` enums are the
//! closest analogue — three small enums tracking where a connection is
//! in its read/write/keep-alive lifecycle — generalized here into one
//! shared `State` enum, applied independently to each [`Role`]. The
//! table is kept as literal data (a `match` over `(role, state,
//! event)`) rather than hidden behind polymorphism, since transitions
//! are declarative and worth reading as a table.

use std::fmt;

/// Which side of an HTTP/1.1 exchange a state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Client => "CLIENT",
            Role::Server => "SERVER",
        })
    }
}

/// A per-role connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    /// Server only: headers (and any number of 1xx informational
    /// responses) are being sent.
    SendHeaders,
    SendBody,
    Done,
    MustClose,
    Closed,
    MightSwitchProtocol,
    SwitchedProtocol,
    Error,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Idle => "IDLE",
            State::SendHeaders => "SEND_HEADERS",
            State::SendBody => "SEND_BODY",
            State::Done => "DONE",
            State::MustClose => "MUST_CLOSE",
            State::Closed => "CLOSED",
            State::MightSwitchProtocol => "MIGHT_SWITCH_PROTOCOL",
            State::SwitchedProtocol => "SWITCHED_PROTOCOL",
            State::Error => "ERROR",
        })
    }
}

impl State {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Closed | State::Error)
    }
}

/// The kind of event being applied to a role's state, independent of
/// its payload. `NeedData`/`Paused` are sentinels, never fed to the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Request,
    InformationalResponse,
    Response,
    Data,
    EndOfMessage,
    ConnectionClosed,
}

/// Look up the next state for `role` currently in `from`, given that
/// `event` is about to be applied. Returns `None` for any untabled
/// combination; the caller decides whether to surface that as a
/// `LocalProtocolError` or a `RemoteProtocolError`, depending on
/// whether the transition was attempted by us or observed from the
/// peer.
pub fn transition(role: Role, from: State, event: EventKind) -> Option<State> {
    use EventKind::*;
    use State::*;

    if let ConnectionClosed = event {
        // A role may close from any non-terminal state.
        return if from.is_terminal() { None } else { Some(Closed) };
    }

    match (role, from, event) {
        (Role::Client, Idle, Request) => Some(SendBody),
        (Role::Client, SendBody, Data) => Some(SendBody),
        (Role::Client, SendBody, EndOfMessage) => Some(Done),
        // Pipelining: a fresh Request is only legal once this role has
        // cycled back to Idle (via `start_next_cycle`); Done does not
        // itself accept another Request.

        // The server's own state reacts to the *client's* Request too,
        // nudged alongside it from the driver.
        (Role::Server, Idle, Request) => Some(SendHeaders),
        (Role::Server, SendHeaders, InformationalResponse) => Some(SendHeaders),
        (Role::Server, SendHeaders, Response) => Some(SendBody),
        (Role::Server, SendBody, Data) => Some(SendBody),
        (Role::Server, SendBody, EndOfMessage) => Some(Done),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EventKind::*;
    use Role::*;
    use State::*;

    #[test]
    fn client_request_to_response_lifecycle() {
        assert_eq!(transition(Client, Idle, Request), Some(SendBody));
        assert_eq!(transition(Client, SendBody, Data), Some(SendBody));
        assert_eq!(transition(Client, SendBody, EndOfMessage), Some(Done));
    }

    #[test]
    fn server_lifecycle_with_informational_responses() {
        assert_eq!(transition(Server, Idle, Request), Some(SendHeaders));
        assert_eq!(
            transition(Server, SendHeaders, InformationalResponse),
            Some(SendHeaders)
        );
        assert_eq!(transition(Server, SendHeaders, Response), Some(SendBody));
        assert_eq!(transition(Server, SendBody, EndOfMessage), Some(Done));
    }

    #[test]
    fn untabled_combination_is_none() {
        assert_eq!(transition(Client, Done, Request), None);
        assert_eq!(transition(Server, Idle, Response), None);
    }

    #[test]
    fn connection_closed_from_any_nonterminal_state() {
        assert_eq!(transition(Client, Idle, ConnectionClosed), Some(Closed));
        assert_eq!(transition(Server, MustClose, ConnectionClosed), Some(Closed));
    }

    #[test]
    fn connection_closed_not_legal_twice() {
        assert_eq!(transition(Client, Closed, ConnectionClosed), None);
    }
}
