use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::config;
use crate::http::HttpMethod;
use crate::http::headers::HttpHeaders;
use crate::http::history::{self, Versioned};
use crate::http::message::{HttpMessage, MessageChanges, MessageParts};
use crate::http::stream::Body;
use crate::http::uri::Uri;

/// Request fields to replace during a derivation. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct RequestChanges {
    pub message: MessageChanges,
    pub uri: Option<Uri>,
    pub method: Option<String>,
    pub request_target: Option<String>,
}

impl From<MessageChanges> for RequestChanges {
    fn from(message: MessageChanges) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct HttpRequest {
    uri: Uri,
    method: Option<String>,
    request_target: Option<String>,
    message: MessageParts,
    previous: Option<Arc<HttpRequest>>,
}

impl HttpRequest {
    /// A `GET` request for `uri` with no headers, an empty body and the
    /// configured protocol version.
    pub fn new(uri: Uri) -> Self {
        Self::from_parts(
            uri,
            HttpMethod::Get.as_str(),
            MessageParts::new(
                Some(config().protocol_version.as_str().to_string()),
                HttpHeaders::new(),
                Body::new(),
            ),
            None,
        )
    }

    pub fn from_parts(
        uri: Uri,
        method: impl Into<String>,
        message: MessageParts,
        request_target: Option<String>,
    ) -> Self {
        Self {
            uri,
            method: Some(method.into()),
            request_target,
            message,
            previous: None,
        }
    }

    /// Explicit request target if one was set, otherwise the path of the URI
    /// (`/` when empty) followed by `?query` when there is a query.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.request_target {
            return target.clone();
        }

        let mut target = match self.uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        let query = self.uri.query();
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    pub fn with_request_target(&self, request_target: impl Into<String>) -> Self {
        self.derive(RequestChanges {
            request_target: Some(request_target.into()),
            ..RequestChanges::default()
        })
    }

    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or(HttpMethod::Get.as_str())
    }

    pub fn with_method(&self, method: impl AsRef<str>) -> Self {
        self.derive(RequestChanges {
            method: Some(method.as_ref().to_string()),
            ..RequestChanges::default()
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Replaces the URI. The `Host` header is left as it is whatever the value
    /// of `_preserve_host`; keeping it in line with the URI is up to the caller.
    pub fn with_uri(&self, uri: Uri, _preserve_host: bool) -> Self {
        self.derive(RequestChanges {
            uri: Some(uri),
            ..RequestChanges::default()
        })
    }

    /// Request line and header block, up to and including the blank line.
    pub fn build_head(&self) -> String {
        // <method> <target> HTTP/<version>\r\n
        // <header_name>: <header_value>\r\n
        // ...
        // \r\n
        format!(
            "{} {} HTTP/{}\r\n{}\r\n",
            self.method(),
            self.request_target(),
            self.protocol_version(),
            self.headers().stringify(),
        )
    }
}

impl HttpMessage for HttpRequest {
    type Changes = RequestChanges;

    fn message(&self) -> &MessageParts {
        &self.message
    }

    fn derive(&self, changes: RequestChanges) -> Self {
        let previous = history::link(self);
        trace!(linked = previous.is_some(), "derived request");

        Self {
            uri: changes.uri.unwrap_or_else(|| self.uri.clone()),
            method: changes.method.or_else(|| self.method.clone()),
            request_target: changes
                .request_target
                .or_else(|| self.request_target.clone()),
            message: self.message.apply(changes.message),
            previous,
        }
    }
}

impl Versioned for HttpRequest {
    fn previous(&self) -> Option<&HttpRequest> {
        self.previous.as_deref()
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method())
            .field("uri", &self.uri)
            .field("request_target", &self.request_target)
            .field("message", &self.message)
            .field("revision", &self.revision())
            .finish()
    }
}

impl Drop for HttpRequest {
    fn drop(&mut self) {
        history::unlink(self.previous.take(), |req| req.previous.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> HttpRequest {
        HttpRequest::new(Uri::parse(uri).unwrap())
    }

    #[test]
    fn defaults() {
        let req = request("http://example.com");
        assert_eq!(req.method(), "GET");
        assert_eq!(req.protocol_version(), "1.1");
        assert!(req.headers().is_empty());
        assert_eq!(req.body().lock().size(), 0);
        assert!(req.previous().is_none());
    }

    #[test]
    fn request_target_from_uri() {
        assert_eq!(request("http://example.com").request_target(), "/");
        assert_eq!(request("http://example.com/a/b").request_target(), "/a/b");
        assert_eq!(
            request("http://example.com/a?x=1#frag").request_target(),
            "/a?x=1"
        );
        assert_eq!(request("http://example.com?x=1").request_target(), "/?x=1");
    }

    #[test]
    fn request_target_follows_uri() {
        let req = request("http://example.com/a");
        let moved = req.with_uri(Uri::parse("http://example.com/b?y=2").unwrap(), false);

        assert_eq!(req.request_target(), "/a");
        assert_eq!(moved.request_target(), "/b?y=2");
    }

    #[test]
    fn explicit_request_target_wins() {
        let req = request("http://example.com/a")
            .with_method(HttpMethod::Connect)
            .with_request_target("example.com:443");

        assert_eq!(req.request_target(), "example.com:443");
        assert_eq!(
            req.with_uri(Uri::parse("/other").unwrap(), true).request_target(),
            "example.com:443"
        );
    }

    #[test]
    fn with_uri_leaves_host_header() {
        let req = request("http://example.com/")
            .with_header("Host", "example.com")
            .with_uri(Uri::parse("http://example.org/").unwrap(), false);

        assert_eq!(req.header_line("host"), "example.com");
        assert_eq!(req.uri().host(), "example.org");
    }

    #[test]
    fn derivations_are_independent() {
        let base = request("http://example.com/");
        let post = base.with_method("POST");
        let put = base.with_method(HttpMethod::Put);

        assert_eq!(base.method(), "GET");
        assert_eq!(post.method(), "POST");
        assert_eq!(put.method(), "PUT");
        assert_eq!(post.previous().map(HttpRequest::method), Some("GET"));
        assert_eq!(put.previous().map(HttpRequest::method), Some("GET"));
    }

    #[test]
    fn header_derivations() {
        let base = request("http://example.com/");
        let req = base
            .with_header("Accept", "text/html")
            .with_added_header("accept", "text/plain")
            .with_header("X-Trace", vec!["a", "b"]);

        assert!(!base.has_header("Accept"));
        assert_eq!(req.header("ACCEPT"), ["text/html", "text/plain"]);
        assert_eq!(req.header_line("x-trace"), "a,b");

        let req = req.without_header("x-trace");
        assert!(!req.has_header("X-Trace"));
        assert!(req.has_header("Accept"));
        assert_eq!(req.revision(), 4);
    }

    #[test]
    fn unchanged_parts_are_shared() {
        let base = request("http://example.com/").with_header("A", "1");
        let derived = base.with_method("POST");

        assert!(derived.message().shares_headers(base.message()));
        assert!(derived.body().ptr_eq(base.body()));

        let derived = base.with_header("B", "2");
        assert!(!derived.message().shares_headers(base.message()));
        assert!(!base.has_header("B"));
    }

    #[test]
    fn body_is_shared_until_replaced() {
        let base = request("http://example.com/");
        let derived = base.with_protocol_version("1.0");
        derived.body().lock().write(b"shared");

        assert_eq!(base.body().lock().to_string(), "shared");

        let replaced = base.with_body("own");
        assert_eq!(replaced.body().lock().to_string(), "own");
        assert_eq!(base.body().lock().to_string(), "shared");
    }

    #[test]
    fn build_head_renders_request_line() {
        let req = request("http://example.com/search?q=rust")
            .with_method(HttpMethod::Post)
            .with_header("Host", "example.com")
            .with_header("Content-Length", "0");

        assert_eq!(
            req.build_head(),
            "POST /search?q=rust HTTP/1.1\r\nHost: example.com\r\nContent-Length: 0\r\n\r\n"
        );
    }
}
