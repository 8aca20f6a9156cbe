use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::config;
use crate::http::history::{self, Versioned};
use crate::http::message::{HttpMessage, MessageChanges, MessageParts};
use crate::http::status::reason_phrase;

/// Response fields to replace during a derivation. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ResponseChanges {
    pub message: MessageChanges,
    pub status_code: Option<u16>,
    pub reason_phrase: Option<String>,
}

impl From<MessageChanges> for ResponseChanges {
    fn from(message: MessageChanges) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

#[derive(Clone, Default)]
pub struct HttpResponse {
    status_code: Option<u16>,
    reason_phrase: Option<String>,
    message: MessageParts,
    previous: Option<Arc<HttpResponse>>,
}

impl HttpResponse {
    /// A response with no status, no reason phrase, no protocol version,
    /// no headers and an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        status_code: Option<u16>,
        reason_phrase: Option<String>,
        message: MessageParts,
    ) -> Self {
        Self {
            status_code,
            reason_phrase,
            message,
            previous: None,
        }
    }

    /// Status code, `0` while unset.
    pub fn status_code(&self) -> u16 {
        self.status_code.unwrap_or(0)
    }

    /// Reason phrase, empty while unset.
    pub fn reason_phrase(&self) -> &str {
        self.reason_phrase.as_deref().unwrap_or("")
    }

    /// Sets the status code and the reason phrase together. An empty phrase is
    /// stored as given; the default phrase table is not consulted.
    pub fn with_status(&self, code: u16, reason_phrase: &str) -> Self {
        self.derive(ResponseChanges {
            status_code: Some(code),
            reason_phrase: Some(reason_phrase.to_string()),
            ..ResponseChanges::default()
        })
    }

    /// Sets the status code along with its default reason phrase, if it has one.
    pub fn with_standard_status(&self, code: u16) -> Self {
        self.with_status(code, reason_phrase(code).unwrap_or(""))
    }

    /// Status line and header block, up to and including the blank line.
    ///
    /// Falls back to the configured protocol version when none is set.
    pub fn build_head(&self) -> String {
        let version = match self.protocol_version() {
            "" => config().protocol_version.as_str(),
            version => version,
        };

        // HTTP/<version> <status> <reason>\r\n
        // <header_name>: <header_value>\r\n
        // ...
        // \r\n
        format!(
            "HTTP/{} {} {}\r\n{}\r\n",
            version,
            self.status_code(),
            self.reason_phrase(),
            self.headers().stringify(),
        )
    }
}

impl HttpMessage for HttpResponse {
    type Changes = ResponseChanges;

    fn message(&self) -> &MessageParts {
        &self.message
    }

    fn derive(&self, changes: ResponseChanges) -> Self {
        let previous = history::link(self);
        trace!(linked = previous.is_some(), "derived response");

        Self {
            status_code: changes.status_code.or(self.status_code),
            reason_phrase: changes
                .reason_phrase
                .or_else(|| self.reason_phrase.clone()),
            message: self.message.apply(changes.message),
            previous,
        }
    }
}

impl Versioned for HttpResponse {
    fn previous(&self) -> Option<&HttpResponse> {
        self.previous.as_deref()
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status_code", &self.status_code)
            .field("reason_phrase", &self.reason_phrase)
            .field("message", &self.message)
            .field("revision", &self.revision())
            .finish()
    }
}

impl Drop for HttpResponse {
    fn drop(&mut self) {
        history::unlink(self.previous.take(), |res| res.previous.take());
    }
}
