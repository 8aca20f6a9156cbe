//! HTTP headers abstraction for [`HttpRequest`](crate::http::request::HttpRequest) and
//! [`HttpResponse`](crate::http::response::HttpResponse)
//!
//! Headers are stored in an ordered map keyed by the lowercased header name,
//! so lookups, existence checks and overwrites are case-insensitive while
//! iteration follows insertion order. Each entry keeps the casing under which
//! the name was first inserted alongside its ordered list of values.
//!
//! The store is a value type: [`set`](HttpHeaders::set), [`add`](HttpHeaders::add)
//! and [`remove`](HttpHeaders::remove) return a new store and leave the receiver
//! untouched. Names and values are kept as raw strings, without validation.

use indexmap::IndexMap;
use indexmap::map::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    headers: IndexMap<String, HeaderEntry>,
}

/// Anything usable as the value side of a header: a single string or a
/// sequence of strings.
pub trait IntoHeaderValues {
    fn into_header_values(self) -> Vec<String>;
}

impl IntoHeaderValues for &str {
    fn into_header_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoHeaderValues for String {
    fn into_header_values(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoHeaderValues for &String {
    fn into_header_values(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoHeaderValues for Vec<String> {
    fn into_header_values(self) -> Vec<String> {
        self
    }
}

impl IntoHeaderValues for Vec<&str> {
    fn into_header_values(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoHeaderValues for &[&str] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl IntoHeaderValues for &[String] {
    fn into_header_values(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoHeaderValues for [&str; N] {
    fn into_header_values(self) -> Vec<String> {
        self.iter().map(|v| v.to_string()).collect()
    }
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            headers: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// Values stored for `name` in insertion order, empty when absent.
    pub fn get(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
    }

    /// Values for `name` joined with `,`.
    pub fn get_line(&self, name: &str) -> String {
        self.get(name).join(",")
    }

    /// Casing under which `name` is stored, if present.
    pub fn original_name(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.name.as_str())
    }

    /// Returns a copy of the store with `name` holding exactly `value`.
    ///
    /// An existing entry keeps both its casing and its position.
    pub fn set<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let mut headers = self.clone();
        headers.set_raw(name, value.into_header_values());
        headers
    }

    /// Returns a copy of the store with `value` appended after any values
    /// already stored for `name`.
    pub fn add<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let mut headers = self.clone();
        headers.append_raw(name, value.into_header_values());
        headers
    }

    /// Returns a copy of the store without `name`. Other entries keep their order.
    pub fn remove(&self, name: &str) -> Self {
        let mut headers = self.clone();
        headers.remove_raw(name);
        headers
    }

    pub(crate) fn set_raw(&mut self, name: &str, values: Vec<String>) {
        match self.headers.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => entry.get_mut().values = values,
            Entry::Vacant(entry) => {
                entry.insert(HeaderEntry {
                    name: name.to_string(),
                    values,
                });
            }
        }
    }

    pub(crate) fn append_raw(&mut self, name: &str, values: Vec<String>) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| HeaderEntry {
                name: name.to_string(),
                values: Vec::new(),
            })
            .values
            .extend(values);
    }

    pub(crate) fn remove_raw(&mut self, name: &str) {
        self.headers.shift_remove(&name.to_ascii_lowercase());
    }

    /// Iterates `(original name, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers
            .values()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Renders every entry as a `Name: v1,v2\r\n` line.
    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, values) in self.iter() {
            result.push_str(&format!("{}: {}\r\n", name, values.join(",")));
        }
        result
    }
}

impl<N: AsRef<str>, V: IntoHeaderValues> FromIterator<(N, V)> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = HttpHeaders::new();
        for (name, value) in iter {
            headers.append_raw(name.as_ref(), value.into_header_values());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_ignore_case() {
        let headers = HttpHeaders::new().set("Content-Type", "text/html");

        assert!(headers.has("content-type"));
        assert!(headers.has("CONTENT-TYPE"));
        assert_eq!(headers.get("CONTENT-TYPE"), headers.get("Content-Type"));
        assert_eq!(headers.get("content-type"), ["text/html"]);
        assert!(!headers.has("Content-Length"));
    }

    #[test]
    fn missing_header_is_empty() {
        let headers = HttpHeaders::new();
        assert!(headers.get("Host").is_empty());
        assert_eq!(headers.get_line("Host"), "");
    }

    #[test]
    fn overwrite_keeps_first_casing() {
        let headers = HttpHeaders::new().set("X-Foo", "a").set("x-foo", "b");

        let entries: Vec<_> = headers.iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "X-Foo");
        assert_eq!(entries[0].1, ["b"]);
        assert_eq!(headers.original_name("X-FOO"), Some("X-Foo"));
    }

    #[test]
    fn add_appends_values() {
        let headers = HttpHeaders::new().set("A", "1").add("a", "2");
        assert_eq!(headers.get("A"), ["1", "2"]);
        assert_eq!(headers.get_line("A"), "1,2");

        let headers = headers.add("B", ["3", "4"]);
        assert_eq!(headers.get("b"), ["3", "4"]);
    }

    #[test]
    fn set_replaces_all_values() {
        let headers = HttpHeaders::new()
            .add("Accept", vec!["text/html", "text/plain"])
            .set("accept", "*/*");
        assert_eq!(headers.get("Accept"), ["*/*"]);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let headers = HttpHeaders::new()
            .set("Host", "example.com")
            .set("Accept", "*/*")
            .set("Content-Length", "0")
            .set("host", "example.org");

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Host", "Accept", "Content-Length"]);

        let removed = headers.remove("ACCEPT");
        let names: Vec<_> = removed.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Host", "Content-Length"]);
    }

    #[test]
    fn mutators_leave_receiver_untouched() {
        let base = HttpHeaders::new().set("A", "1");
        let _ = base.set("A", "2");
        let _ = base.add("A", "3");
        let _ = base.remove("A");
        let _ = base.set("B", "4");

        assert_eq!(base.get("A"), ["1"]);
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let base = HttpHeaders::new().set("A", "1");
        assert_eq!(base.remove("B"), base);
    }

    #[test]
    fn stringify_in_order() {
        let headers: HttpHeaders = [("Host", "example.com"), ("Accept", "*/*"), ("accept", "text/html")]
            .into_iter()
            .collect();
        assert_eq!(
            headers.stringify(),
            "Host: example.com\r\nAccept: */*,text/html\r\n"
        );
    }
}
