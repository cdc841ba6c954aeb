/*
 * media_type.rs
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

//! Media types (RFC 2045 Content-Type grammar): type/subtype plus
//! semicolon-separated parameters, with quoted-string values.

use std::fmt;

/// A parsed media type. Keeps the original text for `Display`.
#[derive(Debug, Clone)]
pub struct MediaType {
    full: String,
    primary_type: String,
    sub_type: String,
    /// Parameters in declaration order; names stored lowercase.
    parameters: Vec<(String, String)>,
}

impl MediaType {
    /// Parse a Content-Type value. None when the text is not
    /// `type/subtype` with optional parameters.
    pub fn parse(value: &str) -> Option<MediaType> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (type_part, params_part) = match trimmed.find(';') {
            Some(i) if i >= 3 => {
                let (a, b) = trimmed.split_at(i);
                (a.trim(), b[1..].trim())
            }
            _ => (trimmed, ""),
        };
        let slash = type_part.find('/')?;
        let primary = type_part[..slash].trim();
        let sub = type_part[slash + 1..].trim();
        if !is_token(primary) || !is_token(sub) {
            return None;
        }
        let parameters = parse_parameter_list(params_part);
        Some(MediaType {
            full: trimmed.to_string(),
            primary_type: primary.to_ascii_lowercase(),
            sub_type: sub.to_ascii_lowercase(),
            parameters,
        })
    }

    /// High-level type, e.g. "text" in "text/plain; charset=utf-8".
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// Specific subtype, e.g. "plain" in "text/plain; charset=utf-8".
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// First value of a parameter, matched case-insensitively.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.parameters
            .iter()
            .find(|(n, _)| n == &lower)
            .map(|(_, v)| v.as_str())
    }

    /// The charset parameter, when present.
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.full == other.full
    }
}

impl Eq for MediaType {}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            (0x21..=0x7e).contains(&b)
                && !matches!(
                    b,
                    b'(' | b')'
                        | b'<'
                        | b'>'
                        | b'@'
                        | b','
                        | b';'
                        | b':'
                        | b'\\'
                        | b'"'
                        | b'/'
                        | b'['
                        | b']'
                        | b'?'
                        | b'='
                )
        })
}

/// Parse a semicolon-separated parameter list (name=value; name="value").
/// Malformed parameters are skipped.
fn parse_parameter_list(params_part: &str) -> Vec<(String, String)> {
    let mut parameters = Vec::new();
    let bytes = params_part.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        while pos < len && (bytes[pos] == b';' || bytes[pos].is_ascii_whitespace()) {
            pos += 1;
        }
        if pos >= len {
            break;
        }
        let eq = match bytes[pos..].iter().position(|&b| b == b'=') {
            Some(i) => pos + i,
            None => break,
        };
        let name = match std::str::from_utf8(&bytes[pos..eq]) {
            Ok(s) => s.trim(),
            Err(_) => break,
        };
        if !is_token(name) {
            match bytes[pos..].iter().position(|&b| b == b';') {
                Some(semi) => {
                    pos += semi + 1;
                    continue;
                }
                None => break,
            }
        }
        pos = eq + 1;
        let value = if pos < len && bytes[pos] == b'"' {
            pos += 1;
            let mut v = String::new();
            while pos < len {
                let c = bytes[pos];
                if c == b'\\' && pos + 1 < len {
                    v.push(bytes[pos + 1] as char);
                    pos += 2;
                } else if c == b'"' {
                    pos += 1;
                    break;
                } else {
                    v.push(c as char);
                    pos += 1;
                }
            }
            v
        } else {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| pos + i)
                .unwrap_or(len);
            let v = match std::str::from_utf8(&bytes[pos..end]) {
                Ok(s) => s.trim(),
                Err(_) => "",
            };
            pos = end;
            if !is_token(v) {
                continue;
            }
            v.to_string()
        };
        parameters.push((name.to_ascii_lowercase(), value));
    }
    parameters
}
