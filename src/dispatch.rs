//! Reader dispatch: a literal lookup table from protocol situation to
//! which reader `next_event` should invoke next.
//!
//! Kept as a literal `match` — the situations are declarative and
//! worth reading as a table, not worth a trait object for — mirroring
//! how `hyper::proto::h1::conn`'s `can_read_head`/`can_read_body` pick
//! between head and body parsing based on `Reading`/`Writing` state
//! rather than a virtual call.

use crate::state::{Role, State};

/// Which reader `next_event` should invoke for the peer role currently
/// in `state`. Body framing itself is resolved separately, once a head
/// event is available — see [`crate::connection::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderChoice {
    /// `(CLIENT, IDLE)`: read a request head.
    RequestHead,
    /// `(SERVER, IDLE)` or `(SERVER, SEND_RESPONSE)`: read a response head.
    ResponseHead,
    /// `(*, SEND_BODY)`: read body bytes using the framing selected
    /// when this exchange's head was parsed.
    Body,
    /// `(*, DONE | MUST_CLOSE | CLOSED)`: any further bytes are a
    /// protocol violation.
    ExpectNothing,
    /// No reader applies — waiting on the caller (e.g. a fresh cycle,
    /// or a role that hasn't started speaking yet).
    None,
}

/// Choose the reader for the peer role `role`, currently in `state`.
pub fn choose(role: Role, state: State) -> ReaderChoice {
    use ReaderChoice::*;
    use State::*;

    match (role, state) {
        (Role::Client, Idle) => RequestHead,
        (Role::Server, Idle) | (Role::Server, SendHeaders) => ResponseHead,
        (_, SendBody) => Body,
        (_, Done) | (_, MustClose) | (_, Closed) => ExpectNothing,
        _ => None,
    }
}
