//! URL hash state: a flat `key=value&key=value` map.
//!
//! Keys and values are percent-encoded independently with the
//! `encodeURIComponent` character set, so hashes written here read back
//! identically in a browser. Parsing is permissive: malformed segments are
//! dropped, never reported.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters `encodeURIComponent` leaves untouched.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One hash value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashValue {
    /// `key=value` segment.
    Value(String),
    /// Bare `key` segment.
    Flag,
}

impl HashValue {
    /// The string value, if this is not a flag.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Flag => None,
        }
    }
}

impl From<String> for HashValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for HashValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Decoded hash map.
///
/// Keys keep the order they were first inserted in; re-inserting a key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashState {
    entries: Vec<(String, HashValue)>,
}

impl HashState {
    /// Create an empty hash state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HashValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HashValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a string value; flags read as absent.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HashValue::as_str)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HashValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<HashValue>> FromIterator<(K, V)> for HashState {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut state = Self::new();
        for (key, value) in iter {
            state.insert(key, value);
        }
        state
    }
}

fn decode(component: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(component).decode_utf8().ok()
}

fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

/// Parse a hash string, with or without its leading `#`.
#[must_use]
pub fn parse(hash: &str) -> HashState {
    let body = hash.strip_prefix('#').unwrap_or(hash);
    let mut state = HashState::new();
    for segment in body.split('&').filter(|s| !s.is_empty()) {
        match segment.find('=') {
            Some(0) => {}
            Some(at) => {
                let (Some(key), Some(value)) = (decode(&segment[..at]), decode(&segment[at + 1..]))
                else {
                    tracing::debug!(segment, "dropping undecodable hash segment");
                    continue;
                };
                state.insert(key.into_owned(), value.into_owned());
            }
            None => match decode(segment) {
                Some(flag) => state.insert(flag.into_owned(), HashValue::Flag),
                None => tracing::debug!(segment, "dropping undecodable hash flag"),
            },
        }
    }
    state
}

/// Build a hash string (without the leading `#`).
///
/// Flags are written as `key=true`.
#[must_use]
pub fn build(state: &HashState) -> String {
    state
        .iter()
        .map(|(key, value)| {
            let value = value.as_str().unwrap_or("true");
            format!("{}={}", encode(key), encode(value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Storage for the hash, e.g. `window.location`.
pub trait HashStore {
    /// Read the current hash, with or without its leading `#`.
    fn read_hash(&self) -> String;

    /// Replace the hash.
    fn write_hash(&mut self, hash: &str);
}

/// Overlay `values` on the current hash and write it back.
///
/// Keys not named in `values` are preserved. This is the only path that
/// writes the hash.
pub fn set_values<S, K, V>(store: &mut S, values: impl IntoIterator<Item = (K, V)>)
where
    S: HashStore + ?Sized,
    K: Into<String>,
    V: Into<HashValue>,
{
    let mut state = parse(&store.read_hash());
    for (key, value) in values {
        state.insert(key, value);
    }
    let hash = build(&state);
    tracing::debug!(%hash, "writing hash");
    store.write_hash(&hash);
}

/// In-memory hash store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHashStore {
    hash: String,
    writes: usize,
}

impl MemoryHashStore {
    /// Create a store holding `hash`.
    #[must_use]
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            writes: 0,
        }
    }

    /// Current hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Number of writes so far.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl HashStore for MemoryHashStore {
    fn read_hash(&self) -> String {
        self.hash.clone()
    }

    fn write_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
        self.writes += 1;
    }
}
