//! Immutable HTTP message model.
//!
//! Requests, responses and URIs are value types: every `with_*` call returns
//! a new instance and leaves the receiver untouched, optionally keeping a
//! link to the instance it was derived from. Message bodies are in-memory
//! seekable streams shared between derived messages.
//!
//! ```
//! use rustynet_message::http::message::HttpMessage;
//! use rustynet_message::http::request::HttpRequest;
//! use rustynet_message::http::uri::Uri;
//!
//! let uri = Uri::parse("https://example.com:443/search?q=rust")?;
//! let req = HttpRequest::new(uri)
//!     .with_method("POST")
//!     .with_header("Content-Type", "application/json");
//!
//! assert_eq!(req.request_target(), "/search?q=rust");
//! assert_eq!(req.uri().to_string(), "https://example.com/search?q=rust");
//! assert_eq!(req.header_line("content-type"), "application/json");
//! # Ok::<(), rustynet_message::error::MessageError>(())
//! ```
//!
//! No wire parsing, transport or connection handling lives here; this crate
//! only models the messages that such layers produce and consume.

pub mod config;
pub mod error;
pub mod http;

pub use error::{MessageError, Result};
pub use http::headers::HttpHeaders;
pub use http::history::Versioned;
pub use http::message::HttpMessage;
pub use http::request::HttpRequest;
pub use http::response::HttpResponse;
pub use http::stream::{Body, ByteStream, Whence};
pub use http::uri::Uri;
