//! Immutable message protocol shared by [`HttpRequest`](crate::http::request::HttpRequest)
//! and [`HttpResponse`](crate::http::response::HttpResponse).
//!
//! A message is never modified after construction. Every `with_*` operation
//! goes through [`HttpMessage::derive`]: it takes the current fields as
//! defaults, overlays the changed ones and builds a new message linked back to
//! the receiver. Unchanged headers are shared between the two messages, and
//! the body handle is always shared unless it is replaced.

use std::sync::Arc;

use crate::http::headers::{HttpHeaders, IntoHeaderValues};
use crate::http::stream::Body;

/// Fields common to every message.
#[derive(Debug, Clone, Default)]
pub struct MessageParts {
    protocol_version: Option<String>,
    headers: Arc<HttpHeaders>,
    body: Body,
}

/// Message fields to replace during a derivation. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct MessageChanges {
    pub protocol_version: Option<String>,
    pub headers: Option<HttpHeaders>,
    pub body: Option<Body>,
}

impl MessageParts {
    pub fn new(protocol_version: Option<String>, headers: HttpHeaders, body: Body) -> Self {
        Self {
            protocol_version,
            headers: Arc::new(headers),
            body,
        }
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Current parts overlaid with `changes`.
    pub fn apply(&self, changes: MessageChanges) -> MessageParts {
        MessageParts {
            protocol_version: changes
                .protocol_version
                .or_else(|| self.protocol_version.clone()),
            headers: changes
                .headers
                .map(Arc::new)
                .unwrap_or_else(|| Arc::clone(&self.headers)),
            body: changes.body.unwrap_or_else(|| self.body.clone()),
        }
    }

    /// Whether both parts hold the very same header store.
    pub fn shares_headers(&self, other: &MessageParts) -> bool {
        Arc::ptr_eq(&self.headers, &other.headers)
    }
}

impl MessageChanges {
    pub fn protocol_version(version: impl Into<String>) -> Self {
        Self {
            protocol_version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn headers(headers: HttpHeaders) -> Self {
        Self {
            headers: Some(headers),
            ..Self::default()
        }
    }

    pub fn body(body: Body) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }
}

/// Read accessors and `with_*` derivations of a message.
///
/// Implementors provide the stored [`MessageParts`] and a single
/// [`derive`](HttpMessage::derive); everything else is built on those two.
pub trait HttpMessage: Sized {
    /// Change set accepted by [`derive`](HttpMessage::derive).
    type Changes: From<MessageChanges>;

    fn message(&self) -> &MessageParts;

    /// New instance with `changes` applied on top of the current fields.
    fn derive(&self, changes: Self::Changes) -> Self;

    /// Protocol version, empty when unset.
    fn protocol_version(&self) -> &str {
        self.message().protocol_version().unwrap_or("")
    }

    fn with_protocol_version(&self, version: impl Into<String>) -> Self {
        self.derive(MessageChanges::protocol_version(version).into())
    }

    fn headers(&self) -> &HttpHeaders {
        self.message().headers()
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().has(name)
    }

    fn header(&self, name: &str) -> &[String] {
        self.headers().get(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.headers().get_line(name)
    }

    fn with_header<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let headers = self.headers().set(name, value);
        self.derive(MessageChanges::headers(headers).into())
    }

    fn with_added_header<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let headers = self.headers().add(name, value);
        self.derive(MessageChanges::headers(headers).into())
    }

    fn without_header(&self, name: &str) -> Self {
        let headers = self.headers().remove(name);
        self.derive(MessageChanges::headers(headers).into())
    }

    fn body(&self) -> &Body {
        self.message().body()
    }

    fn with_body(&self, body: impl Into<Body>) -> Self {
        self.derive(MessageChanges::body(body.into()).into())
    }
}
