/*
 * headers.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a portable HTTP client library.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Ordered header multimap. Lookups are case-insensitive; equality
//! compares name casing and order strictly. Storage alternates name and
//! value in a single vector.

use std::fmt;

use crate::error::Error;

/// Header names whose values never appear in logs.
const SENSITIVE_HEADERS: &[&str] = &["Authorization", "Cookie", "Proxy-Authorization", "Set-Cookie"];

/// An immutable ordered sequence of (name, value) pairs.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Headers {
    names_and_values: Vec<String>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers::default()
    }

    /// Build from alternating name/value strings.
    pub fn of(names_and_values: &[&str]) -> Result<Headers, Error> {
        if names_and_values.len() % 2 != 0 {
            return Err(Error::BadHeader("expected alternating names and values".to_string()));
        }
        let mut builder = HeadersBuilder::new();
        let mut i = 0;
        while i < names_and_values.len() {
            builder.add(names_and_values[i], names_and_values[i + 1])?;
            i += 2;
        }
        Ok(builder.build())
    }

    pub fn builder() -> HeadersBuilder {
        HeadersBuilder::new()
    }

    /// Last value for a case-insensitive name, or None.
    pub fn get(&self, name: &str) -> Option<&str> {
        let mut i = self.names_and_values.len();
        while i >= 2 {
            i -= 2;
            if self.names_and_values[i].eq_ignore_ascii_case(name) {
                return Some(&self.names_and_values[i + 1]);
            }
        }
        None
    }

    /// All values for a case-insensitive name, in insertion order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.names_and_values.len() {
            if self.names_and_values[i].eq_ignore_ascii_case(name) {
                out.push(self.names_and_values[i + 1].as_str());
            }
            i += 2;
        }
        out
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.names_and_values.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.names_and_values.is_empty()
    }

    pub fn name_at(&self, index: usize) -> &str {
        &self.names_and_values[index * 2]
    }

    pub fn value_at(&self, index: usize) -> &str {
        &self.names_and_values[index * 2 + 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names_and_values
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    pub fn new_builder(&self) -> HeadersBuilder {
        HeadersBuilder {
            names_and_values: self.names_and_values.clone(),
        }
    }
}

impl fmt::Display for Headers {
    /// One `Name: value` line per entry. Values of sensitive headers are
    /// replaced with a placeholder so header dumps are safe to log.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            let redact = SENSITIVE_HEADERS.iter().any(|s| s.eq_ignore_ascii_case(name));
            writeln!(f, "{}: {}", name, if redact { "██" } else { value })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Mutable builder for [`Headers`].
#[derive(Clone, Default)]
pub struct HeadersBuilder {
    names_and_values: Vec<String>,
}

impl HeadersBuilder {
    pub fn new() -> HeadersBuilder {
        HeadersBuilder::default()
    }

    /// Add a `Name: value` line, splitting on the first colon.
    pub fn add_line(&mut self, line: &str) -> Result<&mut Self, Error> {
        match line.find(':') {
            Some(colon) => self.add(line[..colon].trim(), &line[colon + 1..]),
            None => Err(Error::BadHeader(format!("unexpected header: {}", line))),
        }
    }

    /// Add a validated name and value. The value is trimmed.
    pub fn add(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        check_name(name)?;
        check_value(value, name)?;
        self.add_unchecked(name, value.trim());
        Ok(self)
    }

    /// Add with the value check skipped, for values that carry non-ASCII
    /// bytes from lenient servers.
    pub fn add_unsafe_non_ascii(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        check_name(name)?;
        self.add_unchecked(name, value.trim());
        Ok(self)
    }

    /// Add a line without validation: empty names and colon-prefixed lines
    /// from legacy servers are kept.
    pub fn add_lenient_line(&mut self, line: &str) -> &mut Self {
        match line[1.min(line.len())..].find(':') {
            Some(offset) => {
                let colon = offset + 1;
                self.add_unchecked(line[..colon].trim(), line[colon + 1..].trim());
            }
            None => {
                if let Some(rest) = line.strip_prefix(':') {
                    // Shield for web socket handshakes and naughty servers.
                    self.add_unchecked("", rest.trim());
                } else {
                    self.add_unchecked("", line.trim());
                }
            }
        }
        self
    }

    /// Replace every entry matching the name (case-insensitive).
    pub fn set(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        check_name(name)?;
        check_value(value, name)?;
        self.remove_all(name);
        self.add_unchecked(name, value.trim());
        Ok(self)
    }

    /// Remove every entry matching the name (case-insensitive).
    pub fn remove_all(&mut self, name: &str) -> &mut Self {
        let mut i = 0;
        while i < self.names_and_values.len() {
            if self.names_and_values[i].eq_ignore_ascii_case(name) {
                self.names_and_values.drain(i..i + 2);
            } else {
                i += 2;
            }
        }
        self
    }

    /// Last value for a case-insensitive name in the builder.
    pub fn get(&self, name: &str) -> Option<&str> {
        let mut i = self.names_and_values.len();
        while i >= 2 {
            i -= 2;
            if self.names_and_values[i].eq_ignore_ascii_case(name) {
                return Some(&self.names_and_values[i + 1]);
            }
        }
        None
    }

    pub fn build(&self) -> Headers {
        Headers {
            names_and_values: self.names_and_values.clone(),
        }
    }

    fn add_unchecked(&mut self, name: &str, value: &str) {
        self.names_and_values.push(name.to_string());
        self.names_and_values.push(value.to_string());
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::BadHeader("name is empty".to_string()));
    }
    for (i, b) in name.bytes().enumerate() {
        if !(0x21..=0x7e).contains(&b) {
            return Err(Error::BadHeader(format!(
                "unexpected char 0x{:02x} at {} in header name: {}",
                b, i, name
            )));
        }
    }
    Ok(())
}

fn check_value(value: &str, name: &str) -> Result<(), Error> {
    for (i, b) in value.bytes().enumerate() {
        if b != b'\t' && !(0x20..=0x7e).contains(&b) {
            return Err(Error::BadHeader(format!(
                "unexpected char 0x{:02x} at {} in {} value",
                b, i, name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_last_match() {
        let headers = Headers::of(&["Cache-Control", "no-cache", "cache-control", "no-store"]).unwrap();
        assert_eq!(headers.get("Cache-Control"), Some("no-store"));
        assert_eq!(headers.get("CACHE-CONTROL"), Some("no-store"));
        assert_eq!(headers.get("Missing"), None);
    }

    #[test]
    fn values_in_order() {
        let headers = Headers::of(&["Set-Cookie", "a=1", "Other", "x", "set-cookie", "b=2"]).unwrap();
        assert_eq!(headers.values("Set-Cookie"), vec!["a=1", "b=2"]);
        assert_eq!(headers.size(), 3);
    }

    #[test]
    fn equality_is_case_and_order_sensitive() {
        let a = Headers::of(&["Accept", "text/html"]).unwrap();
        let b = Headers::of(&["accept", "text/html"]).unwrap();
        let c = Headers::of(&["Accept", "text/html"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn add_line_splits_on_first_colon() {
        let mut builder = Headers::builder();
        builder.add_line("Host: example.com:8080").unwrap();
        let headers = builder.build();
        assert_eq!(headers.get("Host"), Some("example.com:8080"));
    }

    #[test]
    fn value_is_trimmed() {
        let headers = Headers::of(&["Accept", "  text/html  "]).unwrap();
        assert_eq!(headers.get("Accept"), Some("text/html"));
    }

    #[test]
    fn name_validation() {
        assert!(Headers::builder().add("", "v").is_err());
        assert!(Headers::builder().add("Na me", "v").is_err());
        assert!(Headers::builder().add("Né", "v").is_err());
        assert!(Headers::builder().add("Name", "v").is_ok());
    }

    #[test]
    fn value_validation() {
        assert!(Headers::builder().add("N", "ok value\twith tab").is_ok());
        assert!(Headers::builder().add("N", "bad\u{7f}").is_err());
        assert!(Headers::builder().add("N", "é").is_err());
        assert!(Headers::builder().add_unsafe_non_ascii("N", "é").is_ok());
    }

    #[test]
    fn lenient_lines() {
        let mut builder = Headers::builder();
        builder
            .add_lenient_line("Name: value")
            .add_lenient_line(": no name")
            .add_lenient_line("no colon at all");
        let headers = builder.build();
        assert_eq!(headers.size(), 3);
        assert_eq!(headers.get("Name"), Some("value"));
        assert_eq!(headers.get(""), Some("no colon at all"));
    }

    #[test]
    fn set_replaces_all() {
        let mut builder = Headers::builder();
        builder.add("A", "1").unwrap();
        builder.add("a", "2").unwrap();
        builder.add("B", "3").unwrap();
        builder.set("A", "4").unwrap();
        let headers = builder.build();
        assert_eq!(headers.values("A"), vec!["4"]);
        assert_eq!(headers.size(), 2);
    }

    #[test]
    fn remove_all_case_insensitive() {
        let mut builder = Headers::builder();
        builder.add("A", "1").unwrap();
        builder.add("a", "2").unwrap();
        builder.remove_all("A");
        assert_eq!(builder.build().size(), 0);
    }

    #[test]
    fn display_redacts_sensitive_values() {
        let headers =
            Headers::of(&["Authorization", "Basic dXNlcg==", "Accept", "*/*", "Set-Cookie", "a=b"])
                .unwrap();
        let text = headers.to_string();
        assert!(!text.contains("dXNlcg=="));
        assert!(text.contains("Authorization: ██"));
        assert!(text.contains("Accept: */*"));
        assert!(text.contains("Set-Cookie: ██"));
    }
}
