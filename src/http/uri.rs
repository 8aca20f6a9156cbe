//! URI value type.
//!
//! [`Uri::parse`] splits absolute URIs and relative references into their
//! RFC 3986 components. [`Display`](std::fmt::Display) reassembles them,
//! fixing up the path so the result cannot be misread: with an authority the
//! path always starts with `/`, without one a path never starts with `//`.
//!
//! Ports equal to the well-known default of the scheme are kept but not
//! reported by [`Uri::port`]. The scheme to port table starts with http and
//! https and can be extended through [`register_default_port`] or the
//! [`default_ports`](crate::config::MessageConfig::default_ports) setting.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::config::config;
use crate::error::{MessageError, Result};
use crate::http::history::{self, Versioned};

pub const PORT_HTTP: u16 = 80;
pub const PORT_HTTPS: u16 = 443;

// Configured ports are merged on first use only.
static DEFAULT_PORTS: Lazy<RwLock<HashMap<String, u16>>> = Lazy::new(|| {
    let mut ports = HashMap::from([
        ("http".to_string(), PORT_HTTP),
        ("https".to_string(), PORT_HTTPS),
    ]);
    for (scheme, port) in &config().default_ports {
        ports.entry(scheme.to_ascii_lowercase()).or_insert(*port);
    }
    RwLock::new(ports)
});

/// Well-known port of `scheme`, if any is registered.
pub fn default_port(scheme: &str) -> Option<u16> {
    DEFAULT_PORTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&scheme.to_ascii_lowercase())
        .copied()
}

/// Registers (or replaces) the well-known port of `scheme`.
pub fn register_default_port(scheme: &str, port: u16) {
    DEFAULT_PORTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(scheme.to_ascii_lowercase(), port);
}

/// Raw URI components, as stored. `None` means the component was never given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

#[derive(Clone, Default)]
pub struct Uri {
    parts: UriParts,
    previous: Option<Arc<Uri>>,
}

impl Uri {
    /// An empty reference, serializing to `""`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: UriParts) -> Self {
        Self {
            parts,
            previous: None,
        }
    }

    pub fn parse(raw: &str) -> Result<Uri> {
        parse_uri(raw)
            .map(Uri::from_parts)
            .inspect_err(|err| debug!(%err, "rejected uri"))
    }

    pub fn parts(&self) -> &UriParts {
        &self.parts
    }

    pub fn scheme(&self) -> String {
        self.parts
            .scheme
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    pub fn host(&self) -> String {
        self.parts.host.as_deref().unwrap_or("").to_ascii_lowercase()
    }

    /// Stored port, unless it is the well-known port of the scheme.
    pub fn port(&self) -> Option<u16> {
        let port = self.parts.port?;
        if default_port(&self.scheme()) == Some(port) {
            return None;
        }
        Some(port)
    }

    pub fn user_info(&self) -> String {
        match (&self.parts.user, &self.parts.password) {
            (None, _) => String::new(),
            (Some(user), None) => user.clone(),
            (Some(user), Some(password)) => format!("{user}:{password}"),
        }
    }

    /// `[userinfo@]host[:port]`, empty when there is no host.
    pub fn authority(&self) -> String {
        let host = self.host();
        if host.is_empty() {
            return String::new();
        }

        let mut authority = String::new();
        let user_info = self.user_info();
        if !user_info.is_empty() {
            authority.push_str(&user_info);
            authority.push('@');
        }
        authority.push_str(&host);
        if let Some(port) = self.port() {
            authority.push(':');
            authority.push_str(&port.to_string());
        }
        authority
    }

    pub fn path(&self) -> &str {
        self.parts.path.as_deref().unwrap_or("")
    }

    pub fn query(&self) -> &str {
        self.parts.query.as_deref().unwrap_or("")
    }

    pub fn fragment(&self) -> &str {
        self.parts.fragment.as_deref().unwrap_or("")
    }

    pub fn with_scheme(&self, scheme: impl Into<String>) -> Uri {
        let scheme = scheme.into();
        self.derive(|parts| parts.scheme = Some(scheme))
    }

    pub fn with_user_info(&self, user: impl Into<String>, password: Option<&str>) -> Uri {
        let user = user.into();
        self.derive(|parts| {
            parts.user = Some(user);
            parts.password = password.map(str::to_string);
        })
    }

    pub fn with_host(&self, host: impl Into<String>) -> Uri {
        let host = host.into();
        self.derive(|parts| parts.host = Some(host))
    }

    pub fn with_port(&self, port: Option<u16>) -> Uri {
        self.derive(|parts| parts.port = port)
    }

    pub fn with_path(&self, path: impl Into<String>) -> Uri {
        let path = path.into();
        self.derive(|parts| parts.path = Some(path))
    }

    pub fn with_query(&self, query: impl Into<String>) -> Uri {
        let query = query.into();
        self.derive(|parts| parts.query = Some(query))
    }

    pub fn with_fragment(&self, fragment: impl Into<String>) -> Uri {
        let fragment = fragment.into();
        self.derive(|parts| parts.fragment = Some(fragment))
    }

    /// Copies the current components, applies `change` and links the result
    /// back to `self`.
    fn derive(&self, change: impl FnOnce(&mut UriParts)) -> Uri {
        let mut parts = self.parts.clone();
        change(&mut parts);

        let previous = history::link(self);
        trace!(linked = previous.is_some(), "derived uri");
        Uri { parts, previous }
    }
}

impl Versioned for Uri {
    fn previous(&self) -> Option<&Uri> {
        self.previous.as_deref()
    }
}

impl Drop for Uri {
    fn drop(&mut self) {
        history::unlink(self.previous.take(), |uri| uri.previous.take());
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Uri) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Uri {}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.scheme();
        if !scheme.is_empty() {
            write!(f, "{scheme}:")?;
        }

        let authority = self.authority();
        if !authority.is_empty() {
            write!(f, "//{authority}")?;
        }

        let path = self.path();
        if !authority.is_empty() {
            if !path.is_empty() && !path.starts_with('/') {
                f.write_str("/")?;
            }
            f.write_str(path)?;
        } else if path.starts_with('/') {
            // "//x" without an authority would read as one
            write!(f, "/{}", path.trim_start_matches('/'))?;
        } else {
            f.write_str(path)?;
        }

        let query = self.query();
        if !query.is_empty() {
            write!(f, "?{query}")?;
        }

        let fragment = self.fragment();
        if !fragment.is_empty() {
            write!(f, "#{fragment}")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uri")
            .field("uri", &self.to_string())
            .field("revision", &self.revision())
            .finish()
    }
}

impl FromStr for Uri {
    type Err = MessageError;

    fn from_str(raw: &str) -> Result<Uri> {
        Uri::parse(raw)
    }
}

impl TryFrom<&str> for Uri {
    type Error = MessageError;

    fn try_from(raw: &str) -> Result<Uri> {
        Uri::parse(raw)
    }
}

// ===== Parsing =====

fn parse_uri(raw: &str) -> Result<UriParts> {
    let (rest, fragment) = split_off(raw, '#');
    let (rest, query) = split_off(rest, '?');

    let (scheme, rest) = match scheme_len(rest) {
        Some(len) => (Some(&rest[..len]), &rest[len + 1..]),
        None => (None, rest),
    };

    let mut parts = UriParts {
        scheme: scheme.map(str::to_string),
        query: query.map(str::to_string),
        fragment: fragment.map(str::to_string),
        ..UriParts::default()
    };

    let path = match rest.strip_prefix("//") {
        Some(after) => {
            let (authority, path) = after.split_at(after.find('/').unwrap_or(after.len()));
            parse_authority(raw, authority, &mut parts)?;
            path
        }
        None => rest,
    };

    if !path.is_empty() {
        parts.path = Some(path.to_string());
    }

    Ok(parts)
}

fn split_off(input: &str, delimiter: char) -> (&str, Option<&str>) {
    match input.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail)),
        None => (input, None),
    }
}

/// Length of a leading `scheme ":"`, per `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn scheme_len(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }

    for (i, byte) in bytes.iter().enumerate().skip(1) {
        match byte {
            b':' => return Some(i),
            b if b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.') => continue,
            _ => return None,
        }
    }
    None
}

fn parse_authority(raw: &str, authority: &str, parts: &mut UriParts) -> Result<()> {
    if authority.is_empty() {
        return Err(MessageError::invalid_uri(raw, "empty authority"));
    }

    let host_port = match authority.rsplit_once('@') {
        Some((user_info, host_port)) => {
            match user_info.split_once(':') {
                Some((user, password)) => {
                    parts.user = Some(user.to_string());
                    parts.password = Some(password.to_string());
                }
                None => parts.user = Some(user_info.to_string()),
            }
            host_port
        }
        None => authority,
    };

    let (host, port) = if host_port.starts_with('[') {
        let end = host_port
            .find(']')
            .ok_or_else(|| MessageError::invalid_uri(raw, "unterminated IP literal"))?;
        let (host, rest) = host_port.split_at(end + 1);
        match rest {
            "" => (host, None),
            _ => match rest.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => return Err(MessageError::invalid_uri(raw, "junk after IP literal")),
            },
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        }
    };

    if host.is_empty() {
        return Err(MessageError::invalid_uri(raw, "missing host"));
    }
    parts.host = Some(host.to_string());

    parts.port = match port {
        None | Some("") => None,
        Some(port) if port.bytes().all(|b| b.is_ascii_digit()) => Some(
            port.parse::<u16>()
                .map_err(|_| MessageError::invalid_uri(raw, "port out of range"))?,
        ),
        Some(_) => return Err(MessageError::invalid_uri(raw, "invalid port")),
    };

    Ok(())
}
