//! Case-insensitive header storage.
//!
//! Names are stored lower-cased. Repeated names are merged into a single value joined with
//! `", "`, which is also how the incremental parser folds duplicate field lines.

use std::collections::HashMap;
use std::collections::hash_map;

use crate::http::error::{HeaderError, ParseError};

const CRLF: &[u8] = b"\r\n";
const HEADERS_END: &[u8] = b"\r\n\r\n";

/// A header map whose names are validated HTTP tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Looks up a header value, ignoring the case of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_ascii_lowercase())
    }

    /// Adds a value. An existing value for the same name is kept and the new one appended
    /// after `", "`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        validate(name, value)?;
        self.append(name.to_ascii_lowercase(), value);
        Ok(())
    }

    /// Overwrites any existing value for `name`.
    pub fn replace(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        validate(name, value)?;
        self.map.insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    /// Removes `name`, returning its value if it was present.
    pub fn delete(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates `(name, value)` pairs in no particular order. Names are lower-case.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.map.iter(),
        }
    }

    /// Parses a header block from the front of `buf`.
    ///
    /// Returns `Ok(None)` when the blank line ending the block has not arrived yet and `eof` is
    /// false; the caller retries later with the same unconsumed bytes plus whatever was read
    /// since. On success returns the number of bytes spanning the block and its blank line.
    /// The map is left untouched unless the whole block is valid.
    pub fn parse(&mut self, buf: &[u8], eof: bool) -> Result<Option<usize>, ParseError> {
        if buf.starts_with(CRLF) {
            return Ok(Some(CRLF.len()));
        }

        let end = match find(buf, HEADERS_END) {
            Some(idx) => idx,
            None if eof => return Err(ParseError::MalformedHeaders),
            None => return Ok(None),
        };

        let mut fields = Vec::new();
        let mut rest = &buf[..end];
        loop {
            match find(rest, CRLF) {
                Some(idx) => {
                    fields.push(parse_field_line(&rest[..idx])?);
                    rest = &rest[idx + CRLF.len()..];
                }
                None => {
                    fields.push(parse_field_line(rest)?);
                    break;
                }
            }
        }

        for (name, value) in fields {
            self.append(name, &value);
        }

        Ok(Some(end + HEADERS_END.len()))
    }

    /// Overwrites a header whose name is a known-valid constant.
    pub(crate) fn insert_known(&mut self, name: &'static str, value: String) {
        debug_assert!(is_token(name));
        self.map.insert(name.to_ascii_lowercase(), value);
    }

    fn append(&mut self, name: String, value: &str) {
        match self.map.entry(name) {
            hash_map::Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                existing.push_str(", ");
                existing.push_str(value);
            }
            hash_map::Entry::Vacant(e) => {
                e.insert(value.to_string());
            }
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a> {
    inner: hash_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Splits one field line (without its CRLF) into a lower-cased name and a trimmed value.
fn parse_field_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedHeaders)?;
    if line.contains(['\r', '\n']) {
        return Err(ParseError::MalformedHeaders);
    }
    let colon = line.find(':').ok_or(ParseError::MalformedHeaders)?;

    // "Host : x" is not allowed
    if line[..colon].ends_with([' ', '\t']) {
        return Err(ParseError::MalformedHeaders);
    }

    let name = line[..colon].trim();
    let value = line[colon + 1..].trim();
    if !is_token(name) {
        return Err(ParseError::MalformedHeaders);
    }

    Ok((name.to_ascii_lowercase(), value.to_string()))
}

fn validate(name: &str, value: &str) -> Result<(), HeaderError> {
    if !is_token(name) {
        return Err(HeaderError::InvalidName(name.to_string()));
    }
    if value.contains(['\r', '\n']) {
        return Err(HeaderError::InvalidValue(name.to_string()));
    }
    Ok(())
}

/// Reports whether `s` is a non-empty HTTP token.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_tchar)
}

fn is_tchar(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}
