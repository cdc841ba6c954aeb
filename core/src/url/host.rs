/*
 * host.rs
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

//! Host canonicalization: IPv4 dotted quads, IPv6 literals in RFC 5952
//! canonical text, and IDNA A-label domain names.

use super::idna;
use super::percent::parse_hex_digit;

/// Canonicalize percent-decoded host text. Brackets around an IPv6 literal
/// are consumed and not part of the result. None when the host is invalid.
pub fn canonicalize_host(host: &str) -> Option<String> {
    if host.is_empty() {
        return None;
    }
    if let Some(inner) = host.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        let address = decode_ipv6(inner)?;
        return Some(format_ipv6(&address));
    }
    if host.contains(':') {
        // Unbracketed IPv6, e.g. from a cookie domain attribute.
        let address = decode_ipv6(host)?;
        return Some(format_ipv6(&address));
    }
    if host.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        let quad = decode_ipv4(host)?;
        return Some(format_ipv4(&quad));
    }
    idna::to_ascii(host)
}

/// True when the text parses as an IPv4 or IPv6 address (brackets allowed).
pub fn can_parse_as_ip_address(host: &str) -> bool {
    if let Some(inner) = host.strip_prefix('[') {
        return match inner.strip_suffix(']') {
            Some(inner) => decode_ipv6(inner).is_some(),
            None => false,
        };
    }
    if host.contains(':') {
        return decode_ipv6(host).is_some();
    }
    decode_ipv4(host).is_some()
}

/// Strict dotted-quad: four decimal groups 0..=255, no leading zeros.
fn decode_ipv4(input: &str) -> Option<[u8; 4]> {
    let mut address = [0u8; 4];
    if !decode_ipv4_into(input.as_bytes(), 0, input.len(), &mut address) {
        return None;
    }
    Some(address)
}

fn decode_ipv4_into(input: &[u8], pos: usize, limit: usize, address: &mut [u8; 4]) -> bool {
    let mut b = 0usize;
    let mut i = pos;
    while i < limit {
        if b == address.len() {
            return false;
        }
        if b != 0 {
            if input[i] != b'.' {
                return false;
            }
            i += 1;
        }
        let mut value: u32 = 0;
        let group_offset = i;
        while i < limit {
            let c = input[i];
            if !c.is_ascii_digit() {
                break;
            }
            if value == 0 && group_offset != i {
                return false; // leading zero
            }
            value = value * 10 + (c - b'0') as u32;
            if value > 255 {
                return false;
            }
            i += 1;
        }
        if i == group_offset {
            return false; // no digits
        }
        address[b] = value as u8;
        b += 1;
    }
    b == address.len()
}

fn format_ipv4(address: &[u8; 4]) -> String {
    format!("{}.{}.{}.{}", address[0], address[1], address[2], address[3])
}

/// Parse an IPv6 literal (no brackets) into 16 bytes. Accepts `::`
/// compression anywhere once and an embedded IPv4 suffix.
fn decode_ipv6(input: &str) -> Option<[u8; 16]> {
    let bytes = input.as_bytes();
    let limit = bytes.len();
    let mut address = [0u8; 16];
    let mut b = 0usize;
    let mut compress: i32 = -1;
    let mut group_offset: usize = 0;
    let mut i = 0usize;

    while i < limit {
        if b == address.len() {
            return None; // too many groups
        }

        if i + 2 <= limit && bytes[i] == b':' && bytes[i + 1] == b':' {
            if compress != -1 {
                return None; // multiple "::"
            }
            i += 2;
            compress = b as i32;
            if i == limit {
                break;
            }
        } else if b != 0 {
            if bytes[i] == b':' {
                i += 1;
            } else if bytes[i] == b'.' {
                // Rewind to the start of the previous group and parse IPv4.
                if b < 2 {
                    return None;
                }
                let mut quad = [0u8; 4];
                if !decode_ipv4_into(bytes, group_offset, limit, &mut quad) {
                    return None;
                }
                address[b - 2..b + 2].copy_from_slice(&quad);
                b += 2;
                break;
            } else {
                return None;
            }
        }

        let mut value: u32 = 0;
        group_offset = i;
        while i < limit {
            let digit = parse_hex_digit(bytes[i]);
            if digit == -1 {
                break;
            }
            value = (value << 4) + digit as u32;
            i += 1;
        }
        let group_length = i - group_offset;
        if group_length == 0 || group_length > 4 {
            return None;
        }
        address[b] = (value >> 8) as u8;
        address[b + 1] = (value & 0xff) as u8;
        b += 2;
    }

    if b != address.len() {
        if compress == -1 {
            return None;
        }
        let compress = compress as usize;
        let len = address.len();
        // Shift the post-compression groups to the end and zero the gap.
        address.copy_within(compress..b, len - (b - compress));
        for byte in &mut address[compress..compress + (len - b)] {
            *byte = 0;
        }
    }
    Some(address)
}

/// RFC 5952 canonical text: lowercase hex, no leading zeros, the single
/// longest zero run (two or more groups) collapsed to `::`, leftmost on
/// ties, and the IPv4-mapped form spelled with a dotted quad.
fn format_ipv6(address: &[u8; 16]) -> String {
    if address[..10].iter().all(|&b| b == 0) && address[10] == 0xff && address[11] == 0xff {
        return format!(
            "::ffff:{}.{}.{}.{}",
            address[12], address[13], address[14], address[15]
        );
    }

    let groups: Vec<u16> = (0..8)
        .map(|i| ((address[i * 2] as u16) << 8) | address[i * 2 + 1] as u16)
        .collect();

    let mut run_start = -1i32;
    let mut run_length = 0i32;
    let mut i = 0;
    while i < 8 {
        if groups[i] == 0 {
            let start = i;
            while i < 8 && groups[i] == 0 {
                i += 1;
            }
            let length = (i - start) as i32;
            if length > run_length && length >= 2 {
                run_start = start as i32;
                run_length = length;
            }
        } else {
            i += 1;
        }
    }

    let mut out = String::new();
    let mut g = 0;
    while g < 8 {
        if g as i32 == run_start {
            out.push_str("::");
            g += run_length as usize;
        } else {
            if g > 0 && !out.ends_with(':') {
                out.push(':');
            }
            out.push_str(&format!("{:x}", groups[g]));
            g += 1;
        }
    }
    out
}
