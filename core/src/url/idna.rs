/*
 * idna.rs
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

//! IDNA2008 / UTS #46 hostname processing: U-label to A-label conversion
//! and validation over dot-separated labels.

use super::punycode;
use super::uts46;
use super::uts46::{BidiClass, MapResult};

/// Longest name in octets, excluding any trailing dot.
const MAX_DOMAIN_LENGTH: usize = 253;
/// Longest single label in octets.
const MAX_LABEL_LENGTH: usize = 63;

/// Convert a domain to its A-label (ASCII) form. None when any label fails
/// mapping or validation. A trailing dot is preserved.
pub fn to_ascii(domain: &str) -> Option<String> {
    // Map the whole name first so ideographic dots become label separators.
    let mut mapped = String::with_capacity(domain.len());
    for c in domain.chars() {
        match uts46::map_char(c, &mut mapped) {
            MapResult::Valid => mapped.push(c),
            MapResult::Mapped | MapResult::Ignored => {}
            MapResult::Disallowed => return None,
        }
    }
    let normalized = uts46::nfc(&mapped);
    // Mapping and normalization must have reached a fixed point.
    if uts46::nfc(&normalized) != normalized {
        return None;
    }

    let trailing_dot = normalized.ends_with('.');
    let trimmed = if trailing_dot {
        &normalized[..normalized.len() - 1]
    } else {
        &normalized[..]
    };
    if trimmed.is_empty() {
        return None;
    }

    let mut out_labels: Vec<String> = Vec::new();
    for label in trimmed.split('.') {
        if label.len() >= 4 && label[..4].eq_ignore_ascii_case(punycode::PREFIX) {
            out_labels.push(validate_a_label(label)?);
        } else if label.is_ascii() {
            out_labels.push(validate_ldh_label(label)?);
        } else {
            let validated = validate_u_label(label)?;
            let encoded = punycode::encode(validated)?;
            if encoded.len() > MAX_LABEL_LENGTH {
                return None;
            }
            out_labels.push(encoded);
        }
    }

    let mut out = out_labels.join(".");
    if out.len() > MAX_DOMAIN_LENGTH {
        return None;
    }
    if trailing_dot {
        out.push('.');
    }
    Some(out)
}

/// Convert a domain to its U-label (Unicode) form. Labels that fail to
/// decode keep their original text; this never fails.
pub fn to_unicode(domain: &str) -> String {
    let labels: Vec<String> = domain
        .split('.')
        .map(|label| punycode::decode(label).unwrap_or_else(|| label.to_string()))
        .collect();
    labels.join(".")
}

/// An existing A-label must decode and re-encode to itself, case-insensitively.
fn validate_a_label(label: &str) -> Option<String> {
    if label.len() > MAX_LABEL_LENGTH {
        return None;
    }
    let decoded = punycode::decode(label)?;
    let reencoded = punycode::encode(&decoded)?;
    if !reencoded.eq_ignore_ascii_case(label) {
        return None;
    }
    validate_u_label(&decoded)?;
    Some(label.to_ascii_lowercase())
}

/// Letters-digits-hyphen validation for plain ASCII labels.
fn validate_ldh_label(label: &str) -> Option<String> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return None;
    }
    let b = label.as_bytes();
    if b[0] == b'-' || b[b.len() - 1] == b'-' {
        return None;
    }
    // Reserved hyphen positions are only valid for `xn--` labels, which
    // take the A-label path.
    if b.len() >= 4 && b[2] == b'-' && b[3] == b'-' {
        return None;
    }
    for &c in b {
        if !matches!(c, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_') {
            return None;
        }
    }
    Some(label.to_ascii_lowercase())
}

/// Validation for a Unicode label: no leading combining mark, no ZWNJ, and
/// the RFC 5893 bidi rule when the label contains RTL characters.
fn validate_u_label(label: &str) -> Option<&str> {
    let mut chars = label.chars();
    let first = chars.next()?;
    if uts46::is_combining_mark(first) {
        return None;
    }
    if label.chars().any(|c| c == '\u{200C}') {
        return None;
    }
    if !check_bidi(label) {
        return None;
    }
    Some(label)
}

/// RFC 5893 section 2, applied to labels containing R, AL, or AN.
fn check_bidi(label: &str) -> bool {
    let classes: Vec<BidiClass> = label.chars().map(uts46::bidi_class).collect();
    let is_rtl = classes
        .iter()
        .any(|c| matches!(c, BidiClass::R | BidiClass::Al | BidiClass::An));
    if !is_rtl {
        return true;
    }

    // Rule 1: first character must be R or AL (an AN first character means
    // the label began with a digit, which rule 1 forbids for RTL labels).
    if !matches!(classes[0], BidiClass::R | BidiClass::Al) {
        return false;
    }
    // Rule 2: only R, AL, AN, EN, ES, CS, ET, ON, BN, NSM.
    if classes.iter().any(|c| matches!(c, BidiClass::L)) {
        return false;
    }
    // Rule 3: last non-NSM character must be R, AL, AN, or EN.
    let last = classes
        .iter()
        .rev()
        .find(|c| !matches!(c, BidiClass::Nsm));
    if !matches!(
        last,
        Some(BidiClass::R) | Some(BidiClass::Al) | Some(BidiClass::An) | Some(BidiClass::En)
    ) {
        return false;
    }
    // Rule 4: EN and AN may not mix.
    let has_en = classes.iter().any(|c| matches!(c, BidiClass::En));
    let has_an = classes.iter().any(|c| matches!(c, BidiClass::An));
    !(has_en && has_an)
}
