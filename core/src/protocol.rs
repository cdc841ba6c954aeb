/*
 * protocol.rs
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

//! Application protocols by ALPN-style wire label.

use std::fmt;

/// Protocol a response was delivered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http10,
    Http11,
    H2,
    H2PriorKnowledge,
    Quic,
    H3,
}

impl Protocol {
    /// Wire label, e.g. "http/1.1" or "h2".
    pub fn as_label(&self) -> &'static str {
        match self {
            Protocol::Http10 => "http/1.0",
            Protocol::Http11 => "http/1.1",
            Protocol::H2 => "h2",
            Protocol::H2PriorKnowledge => "h2_prior_knowledge",
            Protocol::Quic => "quic",
            Protocol::H3 => "h3",
        }
    }

    /// Look up by wire label. Draft `h3-<n>` labels map to HTTP/3.
    pub fn from_label(label: &str) -> Option<Protocol> {
        match label {
            "http/1.0" => Some(Protocol::Http10),
            "http/1.1" => Some(Protocol::Http11),
            "h2" => Some(Protocol::H2),
            "h2_prior_knowledge" => Some(Protocol::H2PriorKnowledge),
            "quic" => Some(Protocol::Quic),
            "h3" => Some(Protocol::H3),
            _ if label.starts_with("h3-") => Some(Protocol::H3),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for p in [
            Protocol::Http10,
            Protocol::Http11,
            Protocol::H2,
            Protocol::H2PriorKnowledge,
            Protocol::Quic,
            Protocol::H3,
        ] {
            assert_eq!(Protocol::from_label(p.as_label()), Some(p));
        }
    }

    #[test]
    fn h3_drafts_map_to_h3() {
        assert_eq!(Protocol::from_label("h3-29"), Some(Protocol::H3));
    }

    #[test]
    fn unknown_label() {
        assert_eq!(Protocol::from_label("spdy/3.1"), None);
    }
}
