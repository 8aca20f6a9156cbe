use serde::Deserialize;

pub mod headers;
pub mod history;
pub mod message;
pub mod request;
pub mod response;
pub mod status;
pub mod stream;
pub mod uri;

/// All existing HTTP versions
/// Used as the protocol version handed to new requests
/// (see [`protocol_version`](crate::config::MessageConfig::protocol_version))
#[derive(PartialEq, PartialOrd, Debug, Clone, Copy, Deserialize)]
pub enum HttpVersion {
    #[serde(rename = "0.9")]
    V0_9,
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "2")]
    V2_0,
    #[serde(rename = "3")]
    V3_0,
}

impl HttpVersion {
    /// Protocol version as it appears in a message, without the `HTTP/` prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::V0_9 => "0.9",
            HttpVersion::V1_0 => "1.0",
            HttpVersion::V1_1 => "1.1",
            HttpVersion::V2_0 => "2",
            HttpVersion::V3_0 => "3",
        }
    }

    pub fn from_protocol(version: &str) -> Option<HttpVersion> {
        match version {
            "0.9" => Some(HttpVersion::V0_9),
            "1.0" => Some(HttpVersion::V1_0),
            "1.1" => Some(HttpVersion::V1_1),
            "2" | "2.0" => Some(HttpVersion::V2_0),
            "3" | "3.0" => Some(HttpVersion::V3_0),
            _ => None,
        }
    }
}

impl AsRef<str> for HttpVersion {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Well-known request methods.
///
/// Requests store their method as a plain string so extension methods stay
/// representable; these variants are only shorthands for the common ones.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Connect,
    Options,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl AsRef<str> for HttpMethod {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

pub fn http_method_from_str(method: &str) -> Option<HttpMethod> {
    match method {
        "GET" => Some(HttpMethod::Get),
        "HEAD" => Some(HttpMethod::Head),
        "POST" => Some(HttpMethod::Post),
        "PUT" => Some(HttpMethod::Put),
        "PATCH" => Some(HttpMethod::Patch),
        "DELETE" => Some(HttpMethod::Delete),
        "TRACE" => Some(HttpMethod::Trace),
        "OPTIONS" => Some(HttpMethod::Options),
        "CONNECT" => Some(HttpMethod::Connect),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_strings() {
        assert_eq!(HttpVersion::V1_1.as_str(), "1.1");
        assert_eq!(HttpVersion::from_protocol("1.0"), Some(HttpVersion::V1_0));
        assert_eq!(HttpVersion::from_protocol("2.0"), Some(HttpVersion::V2_0));
        assert_eq!(HttpVersion::from_protocol("1.2"), None);
        assert_eq!(HttpVersion::from_protocol("HTTP/1.1"), None);
        assert!(HttpVersion::V1_0 < HttpVersion::V1_1);
    }

    #[test]
    fn method_strings() {
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(http_method_from_str("OPTIONS"), Some(HttpMethod::Options));
        assert_eq!(http_method_from_str("get"), None);
    }
}
