//! Multi-valued form data, as sent to and received from PayPal.
//!
//! Every NVP request and response, and every IPN delivery, is a flat
//! `application/x-www-form-urlencoded` document. A key may repeat, so each
//! key maps to an ordered list of values; [`Values::get`] returns the first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

/// Errors from strict form parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid percent escape in '{0}'")]
    InvalidEscape(String),

    #[error("invalid semicolon separator in '{0}'")]
    Semicolon(String),

    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
}

/// Form fields keyed by name. Keys are kept sorted, matching the encoding
/// PayPal's own clients produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, Vec<String>>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First value for `key`, or `""` when the key is absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// All values for `key`, in the order they were added.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Append every value of `other`, key by key.
    pub fn extend(&mut self, other: &Values) {
        for (key, values) in &other.0 {
            self.0
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate `(key, value)` pairs, one per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Form-encode the fields (`+` for spaces, keys in sorted order).
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Parse a form-encoded document.
    ///
    /// Rejects malformed percent escapes and `;` separators instead of
    /// silently repairing them. Empty segments are skipped.
    pub fn parse(input: &str) -> Result<Self, FormError> {
        Self::parse_bytes(input.as_bytes())
    }

    /// Parse a raw body with the same strictness as [`Values::parse`].
    ///
    /// The body need not be UTF-8: IPN deliveries default to windows-1252.
    /// Decoded bytes that are not UTF-8 become U+FFFD, so the result is for
    /// reading only. Forward the original body when exact bytes matter.
    pub fn parse_bytes(body: &[u8]) -> Result<Self, FormError> {
        let mut values = Self::new();
        for segment in body.split(|&b| b == b'&') {
            if segment.is_empty() {
                continue;
            }
            if segment.contains(&b';') {
                return Err(FormError::Semicolon(
                    String::from_utf8_lossy(segment).into_owned(),
                ));
            }
            check_escapes(segment)?;
            for (key, value) in form_urlencoded::parse(segment) {
                values.add(key.into_owned(), value.into_owned());
            }
        }
        Ok(values)
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.add(key, value);
        }
        values
    }
}

fn check_escapes(segment: &[u8]) -> Result<(), FormError> {
    let mut i = 0;
    while i < segment.len() {
        if segment[i] == b'%' {
            let valid = segment
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return Err(FormError::InvalidEscape(
                    String::from_utf8_lossy(segment).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
