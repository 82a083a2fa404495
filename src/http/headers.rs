//! Header list shared by [`Response`](crate::http::response::Response) and the
//! serialized [`ResponseParts`](crate::http::response::ResponseParts).
//!
//! Headers are stored in an ordered map to preserve insertion order, which is
//! the order handed to the gateway. Lookups ignore ASCII case while the name is
//! emitted with the spelling it was first set with.
//!
//! Setting an existing header replaces its value in place without moving it.
//! No validation is performed on names or values.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    // lowercased name -> (name as set, value)
    headers: IndexMap<String, (String, String)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self {
            headers: IndexMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.headers.get_mut(&name.to_ascii_lowercase()) {
            Some(entry) => entry.1 = value,
            None => {
                self.headers
                    .insert(name.to_ascii_lowercase(), (name.to_string(), value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes a header while keeping the relative order of the others.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.headers
            .shift_remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Owned `(name, value)` pairs in insertion order, as the gateway expects them.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// CGI style header block: `Name: value\r\n` per header.
    pub fn stringify(&self) -> String {
        let mut result = String::new();
        for (name, value) in self.iter() {
            result.push_str(&format!("{}: {}\r\n", name, value));
        }
        result
    }
}

impl<N: AsRef<str>, V: Into<String>> FromIterator<(N, V)> for HttpHeaders {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = HttpHeaders::new();
        for (name, value) in iter {
            headers.set(name.as_ref(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place_and_keeps_order() {
        let mut headers = HttpHeaders::new();
        headers.set("Content-Type", "text/html");
        headers.set("Content-Length", "0");
        headers.set("content-type", "application/json");

        assert_eq!(
            headers.to_pairs(),
            vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Content-Length".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn lookup_ignores_case() {
        let headers: HttpHeaders = [("Accept", "text/html")].into_iter().collect();
        assert_eq!(headers.get("accept"), Some("text/html"));
        assert!(headers.contains("ACCEPT"));
        assert_eq!(headers.get("Content-Type"), None);
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut headers: HttpHeaders = [("A", "1"), ("B", "2"), ("C", "3")]
            .into_iter()
            .collect();
        assert_eq!(headers.remove("b"), Some("2".to_string()));
        assert_eq!(headers.stringify(), "A: 1\r\nC: 3\r\n");
    }
}
