/*
 * cache_control.rs
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

//! Cache-Control header model (RFC 7234 section 5.2): directive parser
//! over every Cache-Control line plus the Pragma fallback, and a formatter
//! that round-trips a single unmodified header line verbatim.

use std::fmt;
use std::time::Duration;

use crate::headers::Headers;

/// Parsed cache directives. Numeric fields are -1 when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControl {
    no_cache: bool,
    no_store: bool,
    max_age_seconds: i32,
    s_max_age_seconds: i32,
    is_private: bool,
    is_public: bool,
    must_revalidate: bool,
    max_stale_seconds: i32,
    min_fresh_seconds: i32,
    only_if_cached: bool,
    no_transform: bool,
    immutable: bool,
    /// Original header text when it can be reproduced verbatim.
    header_value: Option<String>,
}

impl Default for CacheControl {
    /// No directives set.
    fn default() -> Self {
        CacheControl::new_unset()
    }
}

impl CacheControl {
    pub fn builder() -> CacheControlBuilder {
        CacheControlBuilder::default()
    }

    /// Require a network response, bypassing any cache.
    pub fn force_network() -> CacheControl {
        let mut cc = CacheControl::new_unset();
        cc.no_cache = true;
        cc
    }

    /// Require a cached response, however stale.
    pub fn force_cache() -> CacheControl {
        let mut cc = CacheControl::new_unset();
        cc.only_if_cached = true;
        cc.max_stale_seconds = i32::MAX;
        cc
    }

    fn new_unset() -> CacheControl {
        CacheControl {
            no_cache: false,
            no_store: false,
            max_age_seconds: -1,
            s_max_age_seconds: -1,
            is_private: false,
            is_public: false,
            must_revalidate: false,
            max_stale_seconds: -1,
            min_fresh_seconds: -1,
            only_if_cached: false,
            no_transform: false,
            immutable: false,
            header_value: None,
        }
    }

    /// Parse every Cache-Control header line, plus `Pragma: no-cache`.
    pub fn parse(headers: &Headers) -> CacheControl {
        let mut cc = CacheControl::new_unset();
        let mut can_use_header_value = true;
        let mut header_value: Option<String> = None;

        for (name, value) in headers.iter() {
            let is_cache_control = name.eq_ignore_ascii_case("Cache-Control");
            let is_pragma = name.eq_ignore_ascii_case("Pragma");
            if is_cache_control {
                if header_value.is_some() {
                    can_use_header_value = false;
                } else {
                    header_value = Some(value.to_string());
                }
            } else if is_pragma {
                // Pragma means the fields no longer mirror one header line.
                can_use_header_value = false;
            } else {
                continue;
            }

            let bytes = value.as_bytes();
            let mut pos = 0;
            while pos < bytes.len() {
                let token_start = pos;
                pos = index_of_element(value, pos, "=,;");
                let directive = value[token_start..pos].trim().to_ascii_lowercase();

                let parameter: Option<String>;
                if pos == bytes.len() || bytes[pos] == b',' || bytes[pos] == b';' {
                    pos += 1;
                    parameter = None;
                } else {
                    pos += 1; // '='
                    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
                        pos += 1;
                    }
                    if pos < bytes.len() && bytes[pos] == b'"' {
                        pos += 1;
                        let start = pos;
                        pos = index_of_element(value, pos, "\"");
                        parameter = Some(value[start..pos].to_string());
                        pos += 1;
                    } else {
                        let start = pos;
                        pos = index_of_element(value, pos, ",;");
                        parameter = Some(value[start..pos].trim().to_string());
                        pos += 1;
                    }
                }

                if is_pragma {
                    // Only the no-cache fallback is honored from Pragma.
                    if directive == "no-cache" {
                        cc.no_cache = true;
                    }
                    continue;
                }

                match directive.as_str() {
                    "no-cache" => cc.no_cache = true,
                    "no-store" => cc.no_store = true,
                    "max-age" => cc.max_age_seconds = to_non_negative_int(parameter.as_deref(), -1),
                    "s-maxage" => {
                        cc.s_max_age_seconds = to_non_negative_int(parameter.as_deref(), -1)
                    }
                    "private" => cc.is_private = true,
                    "public" => cc.is_public = true,
                    "must-revalidate" => cc.must_revalidate = true,
                    "max-stale" => {
                        cc.max_stale_seconds = to_non_negative_int(parameter.as_deref(), i32::MAX)
                    }
                    "min-fresh" => {
                        cc.min_fresh_seconds = to_non_negative_int(parameter.as_deref(), -1)
                    }
                    "only-if-cached" => cc.only_if_cached = true,
                    "no-transform" => cc.no_transform = true,
                    "immutable" => cc.immutable = true,
                    _ => {} // unknown directives are ignored
                }
            }
        }

        if can_use_header_value {
            cc.header_value = header_value;
        }
        cc
    }

    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    pub fn no_store(&self) -> bool {
        self.no_store
    }

    pub fn max_age_seconds(&self) -> i32 {
        self.max_age_seconds
    }

    pub fn s_max_age_seconds(&self) -> i32 {
        self.s_max_age_seconds
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn must_revalidate(&self) -> bool {
        self.must_revalidate
    }

    pub fn max_stale_seconds(&self) -> i32 {
        self.max_stale_seconds
    }

    pub fn min_fresh_seconds(&self) -> i32 {
        self.min_fresh_seconds
    }

    pub fn only_if_cached(&self) -> bool {
        self.only_if_cached
    }

    pub fn no_transform(&self) -> bool {
        self.no_transform
    }

    pub fn immutable(&self) -> bool {
        self.immutable
    }
}

impl fmt::Display for CacheControl {
    /// The original header text when one unmodified line was parsed, else
    /// the directives recomposed in a fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = &self.header_value {
            return f.write_str(v);
        }
        let mut parts: Vec<String> = Vec::new();
        if self.no_cache {
            parts.push("no-cache".to_string());
        }
        if self.no_store {
            parts.push("no-store".to_string());
        }
        if self.max_age_seconds != -1 {
            parts.push(format!("max-age={}", self.max_age_seconds));
        }
        if self.s_max_age_seconds != -1 {
            parts.push(format!("s-maxage={}", self.s_max_age_seconds));
        }
        if self.is_private {
            parts.push("private".to_string());
        }
        if self.is_public {
            parts.push("public".to_string());
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        if self.max_stale_seconds != -1 {
            parts.push(format!("max-stale={}", self.max_stale_seconds));
        }
        if self.min_fresh_seconds != -1 {
            parts.push(format!("min-fresh={}", self.min_fresh_seconds));
        }
        if self.only_if_cached {
            parts.push("only-if-cached".to_string());
        }
        if self.no_transform {
            parts.push("no-transform".to_string());
        }
        if self.immutable {
            parts.push("immutable".to_string());
        }
        f.write_str(&parts.join(", "))
    }
}

/// Builder for request-side cache directives.
#[derive(Debug, Clone)]
pub struct CacheControlBuilder {
    no_cache: bool,
    no_store: bool,
    max_age_seconds: i32,
    max_stale_seconds: i32,
    min_fresh_seconds: i32,
    only_if_cached: bool,
    no_transform: bool,
    immutable: bool,
}

impl Default for CacheControlBuilder {
    fn default() -> Self {
        Self {
            no_cache: false,
            no_store: false,
            max_age_seconds: -1,
            max_stale_seconds: -1,
            min_fresh_seconds: -1,
            only_if_cached: false,
            no_transform: false,
            immutable: false,
        }
    }
}

impl CacheControlBuilder {
    pub fn no_cache(&mut self) -> &mut Self {
        self.no_cache = true;
        self
    }

    pub fn no_store(&mut self) -> &mut Self {
        self.no_store = true;
        self
    }

    /// Sub-second precision truncates; values saturate at i32::MAX seconds.
    pub fn max_age(&mut self, age: Duration) -> &mut Self {
        self.max_age_seconds = duration_seconds(age);
        self
    }

    pub fn max_stale(&mut self, stale: Duration) -> &mut Self {
        self.max_stale_seconds = duration_seconds(stale);
        self
    }

    pub fn min_fresh(&mut self, fresh: Duration) -> &mut Self {
        self.min_fresh_seconds = duration_seconds(fresh);
        self
    }

    pub fn only_if_cached(&mut self) -> &mut Self {
        self.only_if_cached = true;
        self
    }

    pub fn no_transform(&mut self) -> &mut Self {
        self.no_transform = true;
        self
    }

    pub fn immutable(&mut self) -> &mut Self {
        self.immutable = true;
        self
    }

    pub fn build(&self) -> CacheControl {
        let mut cc = CacheControl::new_unset();
        cc.no_cache = self.no_cache;
        cc.no_store = self.no_store;
        cc.max_age_seconds = self.max_age_seconds;
        cc.max_stale_seconds = self.max_stale_seconds;
        cc.min_fresh_seconds = self.min_fresh_seconds;
        cc.only_if_cached = self.only_if_cached;
        cc.no_transform = self.no_transform;
        cc.immutable = self.immutable;
        cc
    }
}

fn duration_seconds(d: Duration) -> i32 {
    let secs = d.as_secs();
    if secs > i32::MAX as u64 {
        i32::MAX
    } else {
        secs as i32
    }
}

/// Saturating directive number: negative clamps to 0, overflow to i32::MAX,
/// unparsable or missing falls back to `default`.
fn to_non_negative_int(parameter: Option<&str>, default: i32) -> i32 {
    let text = match parameter {
        Some(t) if !t.is_empty() => t,
        _ => return default,
    };
    match text.parse::<i64>() {
        Ok(v) if v > i32::MAX as i64 => i32::MAX,
        Ok(v) if v < 0 => 0,
        Ok(v) => v as i32,
        Err(_) => default,
    }
}

/// Index of the first character in `characters`, or the end of `input`.
fn index_of_element(input: &str, pos: usize, characters: &str) -> usize {
    let bytes = input.as_bytes();
    for i in pos..bytes.len() {
        if bytes[i] < 0x80 && characters.contains(bytes[i] as char) {
            return i;
        }
    }
    bytes.len()
}
