use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left as-is by `application/x-www-form-urlencoded` serialization.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    /// Text as it appeared in the URL; `None` once the entry has been written.
    raw: Option<String>,
}

impl Entry {
    fn serialize(&self) -> Cow<'_, str> {
        match &self.raw {
            Some(raw) => Cow::Borrowed(raw),
            None => Cow::Owned(format!("{}={}", encode(&self.key), encode(&self.value))),
        }
    }
}

/// Ordered `key=value` pairs in form-urlencoded layout (`a=1&b=two%20words`).
///
/// Entries that are not written keep their original text, so rewriting one
/// key leaves the encoding of every other key untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBag {
    entries: Vec<Entry>,
}

impl ParamBag {
    pub fn parse(input: &str) -> Self {
        let entries = input
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                Entry {
                    key: decode(key),
                    value: decode(value),
                    raw: Some(segment.to_string()),
                }
            })
            .collect();
        Self { entries }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    /// Overwrite the first `key` entry in place and drop any duplicates, or
    /// append when the key is new.
    pub fn set(&mut self, key: &str, value: &str) {
        let written = Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: None,
        };
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(first) => {
                self.entries[first] = written;
                let mut index = 0;
                self.entries.retain(|entry| {
                    let keep = index <= first || entry.key != key;
                    index += 1;
                    keep
                });
            }
            None => self.entries.push(written),
        }
    }

    /// Remove every entry stored under `key`.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|entry| entry.key != key);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Decoded pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
    }

    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.serialize())
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode(input: &str) -> String {
    utf8_percent_encode(input, FORM_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}

fn decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
