/*
 * public_suffix.rs
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

//! Public Suffix List matcher. Rules are two sorted newline-delimited UTF-8
//! tables (normal rules and exception rules), binary-searched as raw bytes.
//! Loading the data is external: implement [`PublicSuffixList`] and install
//! a matcher process-wide, or construct one directly for tests.

use std::io;
use std::sync::{Arc, RwLock};

use bytes::Bytes;

use super::idna;

/// Source of the PSL byte tables. `ensure_loaded` is called once before the
/// tables are read, so implementations may load lazily from disk.
pub trait PublicSuffixList: Send + Sync {
    fn ensure_loaded(&self) -> io::Result<()>;
    /// Sorted newline-delimited rules in Unicode label form.
    fn bytes(&self) -> Bytes;
    /// Sorted newline-delimited exception rules, without the leading `!`.
    fn exception_bytes(&self) -> Bytes;
}

/// Matcher over loaded PSL tables.
pub struct PublicSuffixMatcher {
    bytes: Bytes,
    exception_bytes: Bytes,
}

static GLOBAL_MATCHER: RwLock<Option<Arc<PublicSuffixMatcher>>> = RwLock::new(None);

/// Install the process-wide matcher used by `HttpUrl::top_private_domain`
/// and cookie validation. Tests install small in-memory tables.
pub fn install_global(matcher: Arc<PublicSuffixMatcher>) {
    *GLOBAL_MATCHER.write().unwrap() = Some(matcher);
}

/// The installed matcher, if any.
pub fn global() -> Option<Arc<PublicSuffixMatcher>> {
    GLOBAL_MATCHER.read().unwrap().clone()
}

impl PublicSuffixMatcher {
    pub fn new(bytes: Bytes, exception_bytes: Bytes) -> Self {
        Self { bytes, exception_bytes }
    }

    /// Load through a [`PublicSuffixList`] provider.
    pub fn from_list(list: &dyn PublicSuffixList) -> io::Result<Self> {
        list.ensure_loaded()?;
        Ok(Self::new(list.bytes(), list.exception_bytes()))
    }

    /// The registrable domain: the public suffix plus one more label.
    /// None when the domain is itself a public suffix or has no label
    /// before the suffix.
    pub fn effective_tld_plus_one(&self, domain: &str) -> Option<String> {
        let domain = domain.strip_suffix('.').unwrap_or(domain);
        if domain.is_empty() {
            return None;
        }
        // The list is distributed in Unicode labels; match in that form.
        let unicode = idna::to_unicode(domain);
        let unicode_labels: Vec<&str> = unicode.split('.').collect();
        if unicode_labels.iter().any(|l| l.is_empty()) {
            return None;
        }

        let (rule_labels, is_exception) = self.find_matching_rule(&unicode_labels);

        if unicode_labels.len() == rule_labels.len() && !is_exception {
            return None; // the domain is itself a public suffix
        }

        // An exception rule is itself registrable; a normal rule needs one
        // more label in front.
        let first_label_offset = if is_exception {
            unicode_labels.len() - rule_labels.len()
        } else {
            unicode_labels.len() - (rule_labels.len() + 1)
        };

        let original_labels: Vec<&str> = domain.split('.').collect();
        Some(original_labels[first_label_offset..].join("."))
    }

    /// Highest-priority matching rule: exception > longest literal >
    /// wildcard > the prevailing rule `*`.
    fn find_matching_rule(&self, labels: &[&str]) -> (Vec<String>, bool) {
        for start in 0..labels.len() {
            let candidate = labels[start..].join(".");
            if find_line(&self.exception_bytes, candidate.as_bytes()) {
                return (labels[start..].iter().map(|s| s.to_string()).collect(), true);
            }
        }

        let mut exact_match: Option<Vec<String>> = None;
        for start in 0..labels.len() {
            let candidate = labels[start..].join(".");
            if find_line(&self.bytes, candidate.as_bytes()) {
                exact_match = Some(labels[start..].iter().map(|s| s.to_string()).collect());
                break;
            }
        }

        let mut wildcard_match: Option<Vec<String>> = None;
        if labels.len() > 1 {
            for start in 0..labels.len() - 1 {
                let mut candidate_labels: Vec<&str> = labels[start..].to_vec();
                candidate_labels[0] = "*";
                let candidate = candidate_labels.join(".");
                if find_line(&self.bytes, candidate.as_bytes()) {
                    wildcard_match =
                        Some(candidate_labels.iter().map(|s| s.to_string()).collect());
                    break;
                }
            }
        }

        match (exact_match, wildcard_match) {
            (Some(e), Some(w)) => {
                if e.len() >= w.len() {
                    (e, false)
                } else {
                    (w, false)
                }
            }
            (Some(e), None) => (e, false),
            (None, Some(w)) => (w, false),
            // The prevailing rule: every bare TLD is a public suffix.
            (None, None) => (vec!["*".to_string()], false),
        }
    }
}

/// Binary search for an exact line in a sorted newline-delimited table.
fn find_line(table: &[u8], candidate: &[u8]) -> bool {
    let mut low = 0usize;
    let mut high = table.len();
    while low < high {
        let mid = (low + high) / 2;
        let line_start = match table[..mid].iter().rposition(|&b| b == b'\n') {
            Some(p) => p + 1,
            None => 0,
        };
        let line_end = line_start
            + table[line_start..]
                .iter()
                .position(|&b| b == b'\n')
                .unwrap_or(table.len() - line_start);
        let line = &table[line_start..line_end];
        match candidate.cmp(line) {
            std::cmp::Ordering::Equal => return true,
            std::cmp::Ordering::Less => high = line_start,
            std::cmp::Ordering::Greater => low = line_end + 1,
        }
    }
    false
}

/// Shared seed tables for tests across the crate. Every caller installs
/// identical data, so concurrent test ordering cannot change behavior.
#[cfg(test)]
pub(crate) fn install_for_tests() {
    use std::sync::Arc;
    install_global(Arc::new(PublicSuffixMatcher::new(
        Bytes::from_static(b"*.ck\nco.uk\ncom\nde\nfr\nuk"),
        Bytes::from_static(b"www.ck"),
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(rules: &[&str], exceptions: &[&str]) -> PublicSuffixMatcher {
        let mut sorted_rules: Vec<&str> = rules.to_vec();
        sorted_rules.sort_unstable();
        let mut sorted_exceptions: Vec<&str> = exceptions.to_vec();
        sorted_exceptions.sort_unstable();
        PublicSuffixMatcher::new(
            Bytes::from(sorted_rules.join("\n").into_bytes()),
            Bytes::from(sorted_exceptions.join("\n").into_bytes()),
        )
    }

    #[test]
    fn literal_rule() {
        let m = matcher(&["com", "co.uk", "*.ck"], &["www.ck"]);
        assert_eq!(
            m.effective_tld_plus_one("foo.example.co.uk").unwrap(),
            "example.co.uk"
        );
        assert_eq!(m.effective_tld_plus_one("example.com").unwrap(), "example.com");
        assert_eq!(
            m.effective_tld_plus_one("www.example.com").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn wildcard_rule() {
        let m = matcher(&["com", "co.uk", "*.ck"], &["www.ck"]);
        assert_eq!(
            m.effective_tld_plus_one("foo.test.ck").unwrap(),
            "foo.test.ck"
        );
        // test.ck is a public suffix under *.ck
        assert_eq!(m.effective_tld_plus_one("test.ck"), None);
    }

    #[test]
    fn exception_rule() {
        let m = matcher(&["com", "co.uk", "*.ck"], &["www.ck"]);
        assert_eq!(m.effective_tld_plus_one("www.ck").unwrap(), "www.ck");
        assert_eq!(m.effective_tld_plus_one("foo.www.ck").unwrap(), "www.ck");
    }

    #[test]
    fn domain_is_suffix_returns_none() {
        let m = matcher(&["com", "co.uk", "*.ck"], &["www.ck"]);
        assert_eq!(m.effective_tld_plus_one("com"), None);
        assert_eq!(m.effective_tld_plus_one("co.uk"), None);
    }

    #[test]
    fn unknown_tld_uses_prevailing_rule() {
        let m = matcher(&["com"], &[]);
        assert_eq!(m.effective_tld_plus_one("example.zz").unwrap(), "example.zz");
        assert_eq!(m.effective_tld_plus_one("zz"), None);
    }

    #[test]
    fn trailing_dot_stripped() {
        let m = matcher(&["com"], &[]);
        assert_eq!(m.effective_tld_plus_one("example.com.").unwrap(), "example.com");
    }

    #[test]
    fn idn_rules_match_a_labels() {
        // PSL carries Unicode labels; hosts arrive as A-labels.
        let m = matcher(&["co.uk", "食狮.com.cn"], &[]);
        assert_eq!(
            m.effective_tld_plus_one("shop.xn--85x722f.com.cn").unwrap(),
            "shop.xn--85x722f.com.cn"
        );
    }

    #[test]
    fn longest_rule_wins() {
        let m = matcher(&["uk", "co.uk"], &[]);
        assert_eq!(
            m.effective_tld_plus_one("a.b.co.uk").unwrap(),
            "b.co.uk"
        );
    }

    #[test]
    fn global_install_reaches_top_private_domain() {
        install_for_tests();
        let g = global().unwrap();
        assert_eq!(g.effective_tld_plus_one("a.com").unwrap(), "a.com");

        let url = crate::url::HttpUrl::parse("https://foo.example.co.uk/").unwrap();
        assert_eq!(url.top_private_domain().unwrap(), "example.co.uk");
        let ip = crate::url::HttpUrl::parse("http://127.0.0.1/").unwrap();
        assert_eq!(ip.top_private_domain(), None);
    }
}
