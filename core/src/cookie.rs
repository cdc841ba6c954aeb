/*
 * cookie.rs
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

//! Cookies (RFC 6265): Set-Cookie parsing with the permissive expires
//! grammar, domain and path matching, serialization, and the jar contract.

use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::trace;

use crate::date::{format_http_date, MAX_DATE};
use crate::error::Error;
use crate::headers::Headers;
use crate::url::{host, percent, public_suffix, HttpUrl};

/// An immutable HTTP cookie. Equality compares every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires_at: i64,
    domain: String,
    path: String,
    secure: bool,
    http_only: bool,
    persistent: bool,
    host_only: bool,
    same_site: Option<String>,
}

impl Cookie {
    pub fn builder() -> CookieBuilder {
        CookieBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry in epoch millis, clamped to `[i64::MIN, MAX_DATE]`.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    /// True when an Expires or Max-Age attribute was present.
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    /// True when the cookie matches only its exact host.
    pub fn host_only(&self) -> bool {
        self.host_only
    }

    pub fn same_site(&self) -> Option<&str> {
        self.same_site.as_deref()
    }

    pub fn expired(&self, now_millis: i64) -> bool {
        self.expires_at <= now_millis
    }

    /// True when this cookie should be sent on a request to `url`.
    pub fn matches(&self, url: &HttpUrl) -> bool {
        let domain_ok = if self.host_only {
            url.host() == self.domain
        } else {
            domain_match(url.host(), &self.domain)
        };
        if !domain_ok {
            return false;
        }
        if !path_match(url, &self.path) {
            return false;
        }
        !self.secure || url.is_https()
    }
}

impl fmt::Display for Cookie {
    /// Set-Cookie serialization of this cookie.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if self.persistent {
            if self.expires_at == i64::MIN {
                write!(f, "; max-age=0")?;
            } else {
                write!(f, "; expires={}", format_http_date(self.expires_at))?;
            }
        }
        if !self.host_only {
            write!(f, "; domain={}", self.domain)?;
        }
        write!(f, "; path={}", self.path)?;
        if self.secure {
            write!(f, "; secure")?;
        }
        if self.http_only {
            write!(f, "; httponly")?;
        }
        if let Some(same_site) = &self.same_site {
            write!(f, "; samesite={}", same_site)?;
        }
        Ok(())
    }
}

/// Suffix rule: the host equals the domain, or ends with `.domain` and is
/// not an IP address.
fn domain_match(url_host: &str, domain: &str) -> bool {
    if url_host == domain {
        return true;
    }
    url_host.ends_with(domain)
        && url_host.as_bytes()[url_host.len() - domain.len() - 1] == b'.'
        && !host::can_parse_as_ip_address(url_host)
}

/// Path-match per RFC 6265 section 5.1.4.
fn path_match(url: &HttpUrl, path: &str) -> bool {
    let url_path = url.encoded_path();
    if url_path == path {
        return true;
    }
    if url_path.starts_with(path) {
        if path.ends_with('/') {
            return true;
        }
        if url_path.as_bytes()[path.len()] == b'/' {
            return true;
        }
    }
    false
}

/// Parse one Set-Cookie value against the URL it arrived from. None when
/// the cookie is malformed or not applicable to the URL.
pub fn parse_cookie(now_millis: i64, url: &HttpUrl, set_cookie: &str) -> Option<Cookie> {
    let pair_end = set_cookie.find(';').unwrap_or(set_cookie.len());
    let equals = set_cookie[..pair_end].find('=')?;

    let name = set_cookie[..equals].trim();
    if name.is_empty() || has_control_or_non_ascii(name) {
        return None;
    }
    let value = set_cookie[equals + 1..pair_end].trim();
    if has_control_or_non_ascii(value) {
        return None;
    }

    let mut expires_at = MAX_DATE;
    let mut delta_seconds: i64 = -1;
    let mut domain: Option<String> = None;
    let mut path: Option<String> = None;
    let mut secure = false;
    let mut http_only = false;
    let mut host_only = true;
    let mut persistent = false;
    let mut same_site: Option<String> = None;

    let mut pos = pair_end.saturating_add(1);
    let limit = set_cookie.len();
    while pos < limit {
        let attribute_end = set_cookie[pos..].find(';').map(|i| pos + i).unwrap_or(limit);
        let attribute_equals = set_cookie[pos..attribute_end]
            .find('=')
            .map(|i| pos + i)
            .unwrap_or(attribute_end);
        let attribute_name = set_cookie[pos..attribute_equals].trim();
        let attribute_value = if attribute_equals < attribute_end {
            set_cookie[attribute_equals + 1..attribute_end].trim()
        } else {
            ""
        };

        if attribute_name.eq_ignore_ascii_case("expires") {
            if let Some(parsed) = parse_expires(attribute_value) {
                expires_at = parsed;
                persistent = true;
            }
        } else if attribute_name.eq_ignore_ascii_case("max-age") {
            if let Some(parsed) = parse_max_age(attribute_value) {
                delta_seconds = parsed;
                persistent = true;
            }
        } else if attribute_name.eq_ignore_ascii_case("domain") {
            match parse_domain(attribute_value) {
                Some(parsed) => {
                    domain = Some(parsed);
                    host_only = false;
                }
                None => {
                    trace!("rejecting cookie {}: bad domain {:?}", name, attribute_value);
                    return None;
                }
            }
        } else if attribute_name.eq_ignore_ascii_case("path") {
            path = Some(attribute_value.to_string());
        } else if attribute_name.eq_ignore_ascii_case("secure") {
            secure = true;
        } else if attribute_name.eq_ignore_ascii_case("httponly") {
            http_only = true;
        } else if attribute_name.eq_ignore_ascii_case("samesite") {
            same_site = Some(attribute_value.to_string());
        }

        pos = attribute_end + 1;
    }

    // Max-Age wins over Expires regardless of attribute order.
    if delta_seconds == i64::MIN {
        expires_at = i64::MIN;
    } else if delta_seconds != -1 {
        let delta_millis = delta_seconds.saturating_mul(1000);
        expires_at = now_millis.saturating_add(delta_millis);
        if expires_at > MAX_DATE {
            expires_at = MAX_DATE;
        }
    }

    // The domain must cover the URL host.
    let url_host = url.host();
    let domain = match domain {
        None => url_host.to_string(),
        Some(domain) => {
            if !domain_match(url_host, &domain) {
                trace!(
                    "rejecting cookie {}: domain {} does not match host {}",
                    name,
                    domain,
                    url_host
                );
                return None;
            }
            domain
        }
    };

    // A cookie for a whole public suffix would be sent to every site
    // under it.
    if url_host.len() != domain.len() {
        if let Some(matcher) = public_suffix::global() {
            if matcher.effective_tld_plus_one(&domain).is_none() {
                trace!("rejecting cookie {}: domain {} is a public suffix", name, domain);
                return None;
            }
        }
    }

    // Default path: the request path up to its last slash.
    let path = match path {
        Some(p) if p.starts_with('/') => p,
        _ => {
            let encoded_path = url.encoded_path();
            match encoded_path.rfind('/') {
                Some(last_slash) if last_slash > 0 => encoded_path[..last_slash].to_string(),
                _ => "/".to_string(),
            }
        }
    };

    Some(Cookie {
        name: name.to_string(),
        value: value.to_string(),
        expires_at,
        domain,
        path,
        secure,
        http_only,
        persistent,
        host_only,
        same_site,
    })
}

/// All cookies from a response's Set-Cookie headers.
pub fn parse_all_cookies(now_millis: i64, url: &HttpUrl, headers: &Headers) -> Vec<Cookie> {
    headers
        .values("Set-Cookie")
        .into_iter()
        .filter_map(|value| parse_cookie(now_millis, url, value))
        .collect()
}

fn has_control_or_non_ascii(s: &str) -> bool {
    s.bytes().any(|b| b < 0x20 || b >= 0x7f)
}

/// Domain attribute: strip one leading dot, percent-decode, canonicalize.
/// A trailing dot is invalid.
fn parse_domain(value: &str) -> Option<String> {
    if value.is_empty() || value.ends_with('.') {
        return None;
    }
    let value = value.strip_prefix('.').unwrap_or(value);
    let decoded = percent::percent_decode_str(value, false);
    host::canonicalize_host(&decoded)
}

/// Max-Age attribute: decimal seconds. Overflow saturates to i64::MAX;
/// zero or negative means expire immediately (i64::MIN). None when the
/// text is not a number (the attribute is then ignored).
fn parse_max_age(value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }
    let (digits, negative) = match value.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (value, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match value.parse::<i64>() {
        Ok(n) if n <= 0 => Some(i64::MIN),
        Ok(n) => Some(n),
        // Numeric but out of range: saturate.
        Err(_) => Some(if negative { i64::MIN } else { i64::MAX }),
    }
}

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Expires attribute per the RFC 6265 section 5.1.1 permissive grammar:
/// scan date tokens in any order, allowing arbitrary delimiters.
fn parse_expires(value: &str) -> Option<i64> {
    let mut hour: i32 = -1;
    let mut minute: i32 = -1;
    let mut second: i32 = -1;
    let mut day_of_month: i32 = -1;
    let mut month: i32 = -1;
    let mut year: i32 = -1;

    for token in value.split(is_date_delimiter).filter(|t| !t.is_empty()) {
        if hour == -1 {
            if let Some((h, m, s)) = match_time(token) {
                hour = h;
                minute = m;
                second = s;
                continue;
            }
        }
        if day_of_month == -1 {
            if let Some(d) = match_digits(token, 1, 2) {
                day_of_month = d;
                continue;
            }
        }
        if month == -1 {
            if let Some(m) = match_month(token) {
                month = m;
                continue;
            }
        }
        if year == -1 {
            if let Some(y) = match_digits(token, 2, 4) {
                year = y;
                continue;
            }
        }
    }

    if (70..=99).contains(&year) {
        year += 1900;
    } else if (0..=69).contains(&year) {
        year += 2000;
    }

    if year < 1601 || month == -1 || !(1..=31).contains(&day_of_month) {
        return None;
    }
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) || !(0..=59).contains(&second) {
        return None;
    }

    let date = chrono::NaiveDate::from_ymd_opt(year, month as u32, day_of_month as u32)?;
    let time = date.and_hms_opt(hour as u32, minute as u32, second as u32)?;
    let millis = time.and_utc().timestamp_millis();
    Some(millis.min(MAX_DATE))
}

/// Date delimiters per RFC 6265: %x09 / %x20-2F / %x3B-40 / %x5B-60 / %x7B-7E.
fn is_date_delimiter(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x20..=0x2f | 0x3b..=0x40 | 0x5b..=0x60 | 0x7b..=0x7e)
}

/// `hh:mm:ss` with one or two digits per field. `:` is not a date
/// delimiter, so the whole time arrives as one token.
fn match_time(token: &str) -> Option<(i32, i32, i32)> {
    let mut parts = token.splitn(3, ':');
    let h = match_digits(parts.next()?, 1, 2)?;
    let m = match_digits(parts.next()?, 1, 2)?;
    let s = match_digits(parts.next()?, 1, 2)?;
    Some((h, m, s))
}

/// A token that begins with `min..=max` digits, not followed by a digit.
fn match_digits(token: &str, min: usize, max: usize) -> Option<i32> {
    let digits: &str = {
        let end = token
            .as_bytes()
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(token.len());
        &token[..end]
    };
    if digits.len() < min || digits.len() > max {
        return None;
    }
    // Trailing non-digits are tolerated (e.g. "1994GMT").
    digits.parse::<i32>().ok()
}

fn match_month(token: &str) -> Option<i32> {
    if token.len() < 3 {
        return None;
    }
    let prefix = token[..3].to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as i32 + 1)
}

/// Builder for synthetic cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieBuilder {
    name: Option<String>,
    value: Option<String>,
    expires_at: Option<i64>,
    domain: Option<String>,
    host_only: bool,
    path: String,
    secure: bool,
    http_only: bool,
    same_site: Option<String>,
}

impl CookieBuilder {
    /// Cookie name; must already be trimmed.
    pub fn name(&mut self, name: &str) -> Result<&mut Self, Error> {
        if name.trim() != name {
            return Err(Error::BadRequest("cookie name is not trimmed".to_string()));
        }
        self.name = Some(name.to_string());
        Ok(self)
    }

    /// Cookie value; must already be trimmed.
    pub fn value(&mut self, value: &str) -> Result<&mut Self, Error> {
        if value.trim() != value {
            return Err(Error::BadRequest("cookie value is not trimmed".to_string()));
        }
        self.value = Some(value.to_string());
        Ok(self)
    }

    /// Expiry in epoch millis. Values at or below zero expire immediately;
    /// values beyond MAX_DATE clamp. Setting any expiry makes the cookie
    /// persistent.
    pub fn expires_at(&mut self, millis: i64) -> &mut Self {
        self.expires_at = Some(if millis <= 0 {
            i64::MIN
        } else {
            millis.min(MAX_DATE)
        });
        self
    }

    /// Domain the cookie is valid for, including subdomains.
    pub fn domain(&mut self, domain: &str) -> Result<&mut Self, Error> {
        self.set_domain(domain, false)
    }

    /// Domain the cookie is valid for, with no subdomain matching.
    pub fn host_only_domain(&mut self, domain: &str) -> Result<&mut Self, Error> {
        self.set_domain(domain, true)
    }

    fn set_domain(&mut self, domain: &str, host_only: bool) -> Result<&mut Self, Error> {
        match host::canonicalize_host(domain) {
            Some(canonical) => {
                self.domain = Some(canonical);
                self.host_only = host_only;
                Ok(self)
            }
            None => Err(Error::InvalidUrlHost(domain.to_string())),
        }
    }

    pub fn path(&mut self, path: &str) -> Result<&mut Self, Error> {
        if !path.starts_with('/') {
            return Err(Error::BadRequest("cookie path must start with '/'".to_string()));
        }
        self.path = path.to_string();
        Ok(self)
    }

    pub fn secure(&mut self) -> &mut Self {
        self.secure = true;
        self
    }

    pub fn http_only(&mut self) -> &mut Self {
        self.http_only = true;
        self
    }

    /// SameSite attribute value; must be trimmed and non-empty.
    pub fn same_site(&mut self, same_site: &str) -> Result<&mut Self, Error> {
        if same_site.trim() != same_site || same_site.is_empty() {
            return Err(Error::BadRequest("invalid sameSite value".to_string()));
        }
        self.same_site = Some(same_site.to_string());
        Ok(self)
    }

    pub fn build(&self) -> Result<Cookie, Error> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| Error::BadRequest("cookie has no name".to_string()))?;
        let value = self
            .value
            .clone()
            .ok_or_else(|| Error::BadRequest("cookie has no value".to_string()))?;
        let domain = self
            .domain
            .clone()
            .ok_or_else(|| Error::BadRequest("cookie has no domain".to_string()))?;
        Ok(Cookie {
            name,
            value,
            expires_at: self.expires_at.unwrap_or(MAX_DATE),
            domain,
            path: if self.path.is_empty() { "/".to_string() } else { self.path.clone() },
            secure: self.secure,
            http_only: self.http_only,
            persistent: self.expires_at.is_some(),
            host_only: self.host_only,
            same_site: self.same_site.clone(),
        })
    }
}

/// Supplies cookies for requests and accepts cookies from responses.
/// Both operations are invoked serially within one call.
pub trait CookieJar: Send + Sync {
    /// Cookies to attach to a request. Ordering is the jar's choice.
    fn load_for_request(&self, url: &HttpUrl) -> Vec<Cookie>;

    /// Store cookies from a response, at the jar's discretion.
    fn save_from_response(&self, url: &HttpUrl, cookies: Vec<Cookie>);
}

/// A jar that never saves or sends anything.
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn load_for_request(&self, _url: &HttpUrl) -> Vec<Cookie> {
        Vec::new()
    }

    fn save_from_response(&self, _url: &HttpUrl, _cookies: Vec<Cookie>) {}
}

/// In-memory jar: replaces on (name, domain, path), drops expired cookies
/// on load, keeps request-insertion order. Never persists.
#[derive(Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Vec<Cookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> MemoryCookieJar {
        MemoryCookieJar::default()
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl CookieJar for MemoryCookieJar {
    fn load_for_request(&self, url: &HttpUrl) -> Vec<Cookie> {
        let now = Self::now_millis();
        let mut cookies = self.cookies.lock().unwrap();
        cookies.retain(|c| !c.expired(now));
        cookies.iter().filter(|c| c.matches(url)).cloned().collect()
    }

    fn save_from_response(&self, _url: &HttpUrl, new_cookies: Vec<Cookie>) {
        let mut cookies = self.cookies.lock().unwrap();
        for cookie in new_cookies {
            cookies.retain(|c| {
                !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
            });
            cookies.push(cookie);
        }
    }
}
