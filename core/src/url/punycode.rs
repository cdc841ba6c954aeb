/*
 * punycode.rs
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

//! Punycode (RFC 3492) bootstring codec for IDN labels.

pub const PREFIX: &str = "xn--";

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;

fn adapt(delta: u32, num_points: u32, first_time: bool) -> u32 {
    let mut delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn encode_digit(d: u32) -> char {
    if d < 26 {
        (b'a' + d as u8) as char
    } else {
        (b'0' + (d - 26) as u8) as char
    }
}

fn decode_digit(c: char) -> Option<u32> {
    match c {
        'a'..='z' => Some(c as u32 - 'a' as u32),
        'A'..='Z' => Some(c as u32 - 'A' as u32),
        '0'..='9' => Some(c as u32 - '0' as u32 + 26),
        _ => None,
    }
}

/// Encode one label's code points to the punycode tail (no `xn--` prefix).
/// None on overflow.
fn encode_label(input: &[char]) -> Option<String> {
    let mut output = String::new();
    let mut basic = 0u32;
    for &c in input {
        if (c as u32) < 0x80 {
            output.push(c);
            basic += 1;
        }
    }
    let mut h = basic;
    if basic > 0 && (basic as usize) < input.len() {
        output.push('-');
    }

    let mut n = INITIAL_N;
    let mut delta = 0u32;
    let mut bias = INITIAL_BIAS;

    while (h as usize) < input.len() {
        let m = input
            .iter()
            .map(|&c| c as u32)
            .filter(|&c| c >= n)
            .min()
            .unwrap();
        delta = delta.checked_add((m - n).checked_mul(h + 1)?)?;
        n = m;
        for &c in input {
            let c = c as u32;
            if c < n {
                delta = delta.checked_add(1)?;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = if k <= bias {
                        TMIN
                    } else if k >= bias + TMAX {
                        TMAX
                    } else {
                        k - bias
                    };
                    if q < t {
                        break;
                    }
                    output.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(encode_digit(q));
                bias = adapt(delta, h + 1, h == basic);
                delta = 0;
                h += 1;
            }
        }
        delta = delta.checked_add(1)?;
        n = n.checked_add(1)?;
    }
    Some(output)
}

/// Decode a punycode tail (no `xn--` prefix) back to code points.
/// None on malformed digits, overflow, or a code point outside Unicode.
fn decode_label(input: &str) -> Option<String> {
    let chars: Vec<char> = input.chars().collect();
    if chars.iter().any(|&c| (c as u32) >= 0x80) {
        return None;
    }
    let mut output: Vec<char> = Vec::new();
    let mut pos = 0;
    if let Some(delim) = chars.iter().rposition(|&c| c == '-') {
        for &c in &chars[..delim] {
            output.push(c);
        }
        pos = delim + 1;
    }

    let mut n = INITIAL_N;
    let mut i = 0u32;
    let mut bias = INITIAL_BIAS;

    while pos < chars.len() {
        let old_i = i;
        let mut w = 1u32;
        let mut k = BASE;
        loop {
            if pos >= chars.len() {
                return None;
            }
            let digit = decode_digit(chars[pos])?;
            pos += 1;
            i = i.checked_add(digit.checked_mul(w)?)?;
            let t = if k <= bias {
                TMIN
            } else if k >= bias + TMAX {
                TMAX
            } else {
                k - bias
            };
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t)?;
            k += BASE;
        }
        let len = output.len() as u32 + 1;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len)?;
        i %= len;
        let c = char::from_u32(n)?;
        output.insert(i as usize, c);
        i += 1;
    }
    Some(output.into_iter().collect())
}

/// Encode a label or dot-joined domain. Labels containing non-ASCII become
/// `xn--<tail>`; pure-ASCII labels pass through. None on overflow.
pub fn encode(input: &str) -> Option<String> {
    let mut out = Vec::new();
    for label in input.split('.') {
        if label.is_ascii() {
            out.push(label.to_string());
        } else {
            let chars: Vec<char> = label.chars().collect();
            out.push(format!("{}{}", PREFIX, encode_label(&chars)?));
        }
    }
    Some(out.join("."))
}

/// Decode a label or dot-joined domain. Labels beginning with `xn--`
/// (case-insensitive) are decoded; None if any such label is malformed.
pub fn decode(input: &str) -> Option<String> {
    let mut out = Vec::new();
    for label in input.split('.') {
        if label.len() >= PREFIX.len() && label[..PREFIX.len()].eq_ignore_ascii_case(PREFIX) {
            out.push(decode_label(&label[PREFIX.len()..])?);
        } else {
            out.push(label.to_string());
        }
    }
    Some(out.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sample strings from RFC 3492 section 7.1.
    #[test]
    fn rfc3492_egyptian() {
        let unicode = "\u{644}\u{64A}\u{647}\u{645}\u{627}\u{628}\u{62A}\u{643}\u{644}\u{645}\u{648}\u{634}\u{639}\u{631}\u{628}\u{64A}\u{61F}";
        let ascii = "xn--egbpdaj6bu4bxfgehfvwxn";
        assert_eq!(encode(unicode).unwrap(), ascii);
        assert_eq!(decode(ascii).unwrap(), unicode);
    }

    #[test]
    fn rfc3492_chinese_simplified() {
        let unicode = "\u{4ED6}\u{4EEC}\u{4E3A}\u{4EC0}\u{4E48}\u{4E0D}\u{8BF4}\u{4E2D}\u{6587}";
        let ascii = "xn--ihqwcrb4cv8a8dqg056pqjye";
        assert_eq!(encode(unicode).unwrap(), ascii);
        assert_eq!(decode(ascii).unwrap(), unicode);
    }

    #[test]
    fn mixed_basic_and_extended() {
        // RFC 3492 7.1 (L): 3<nen>B<gumi><kinpachi><sensei>
        let unicode = "3\u{5E74}B\u{7D44}\u{91D1}\u{516B}\u{5148}\u{751F}";
        let ascii = "xn--3B-ww4c5e180e575a65lsy2b";
        assert_eq!(encode(unicode).unwrap(), ascii);
        assert_eq!(decode(ascii).unwrap(), unicode);
    }

    #[test]
    fn multi_label_domain() {
        assert_eq!(encode("bücher.de").unwrap(), "xn--bcher-kva.de");
        assert_eq!(decode("xn--bcher-kva.de").unwrap(), "bücher.de");
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode("example.com").unwrap(), "example.com");
        assert_eq!(decode("example.com").unwrap(), "example.com");
    }

    #[test]
    fn malformed_tail_fails() {
        assert!(decode("xn--a%").is_none());
        assert!(decode("xn--\u{e9}").is_none());
    }

    #[test]
    fn decode_preserves_basic_case() {
        // Digits decode case-insensitively; basic code points keep their case.
        assert_eq!(decode("XN--BCHER-KVA.DE").unwrap(), "BüCHER.DE");
    }
}
