//! Tunable limits threaded through the buffer, readers, and driver.
//!
//! Mirrors the constants hard-coded near the top of `hyper`'s
//! `proto::h1::role` and `proto::h1::io` modules
//! (`DEFAULT_MAX_HEADERS`, `MINIMUM_MAX_BUFFER_SIZE`,
//! `DEFAULT_MAX_BUFFER_SIZE`), but collected into a struct the caller
//! can override instead of baked-in `const`s.

/// The initial buffer capacity allocated before any bytes arrive.
pub const INIT_BUFFER_SIZE: usize = 8192;

/// Limits applied while parsing and serializing HTTP/1.1 messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of header fields accepted in a single head or
    /// trailer block. Exceeding this raises a `RemoteProtocolError`.
    pub max_headers: usize,
    /// Maximum length, in bytes, of a single header line (after
    /// obsolete-fold joining). Guards against unbounded folded lines.
    pub max_header_line_len: usize,
    /// Maximum number of bytes the receive buffer may hold while still
    /// waiting on a complete head or line. Exceeding this raises a
    /// `RemoteProtocolError` ("message head is too large").
    pub max_buffer_size: usize,
    /// Maximum number of bytes retained when an `Error` records the
    /// offending input for diagnostics.
    pub error_snippet_len: usize,
    /// Maximum number of bytes tolerated in chunk-extensions before a
    /// chunked body is rejected.
    pub max_chunk_extension_bytes: usize,
}

/// Default cap on header fields per head or trailer block.
pub const DEFAULT_MAX_HEADERS: usize = 100;

impl Default for Config {
    fn default() -> Config {
        Config {
            max_headers: DEFAULT_MAX_HEADERS,
            max_header_line_len: 8192,
            max_buffer_size: INIT_BUFFER_SIZE + 4096 * 100,
            error_snippet_len: 64,
            max_chunk_extension_bytes: 1024 * 16,
        }
    }
}
