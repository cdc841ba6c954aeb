/*
 * error.rs
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

//! Client and parser errors.
//!
//! Parsers whose contract is "null on malformed input" (cookie parse, HTTP
//! date parse, `HttpUrl::parse_or_none`, `resolve` with an unsupported
//! scheme) return `Option` instead; everything else fails with `Error`.

use std::fmt;
use std::io;

/// Errors from URL building, message assembly, the interceptor chain, and
/// body streaming.
#[derive(Debug)]
pub enum Error {
    /// URL text has no scheme, or a scheme other than http/https.
    InvalidUrlScheme(String),
    /// Host portion of a URL failed canonicalization. Carries the offending text.
    InvalidUrlHost(String),
    /// Port is not a decimal number in 1..65535.
    InvalidUrlPort(String),
    /// Builder was asked to build without a required field (scheme or host).
    UrlIncomplete(&'static str),
    /// Header name or value contains forbidden characters.
    BadHeader(String),
    /// Media type text does not parse as type/subtype.
    BadMediaType(String),
    /// Request method/body combination is invalid.
    BadRequest(String),
    /// Redirect follow-up count exceeded the hard cap.
    TooManyFollowUps(u32),
    /// Streamed body length disagreed with the declared Content-Length.
    ContentLengthMismatch { expected: i64, actual: i64 },
    /// gzip() applied to a request that is already gzip-encoded.
    DuplicateGzip,
    /// gzip() applied to a request without a body.
    GzipWithoutBody,
    /// A one-shot request body was opened for reading a second time.
    BodyAlreadyRead,
    /// Read from the body of a network/cache/prior response.
    UnreadableResponseBody,
    /// Read from a response body after close().
    ResponseBodyClosed,
    /// The call-level execute timeout elapsed.
    TimedOut,
    /// The call was cancelled before completion.
    Cancelled,
    /// Transport or stream failure.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidUrlScheme(s) => write!(f, "invalid URL scheme: {}", s),
            Error::InvalidUrlHost(h) => write!(f, "invalid URL host: \"{}\"", h),
            Error::InvalidUrlPort(p) => write!(f, "invalid URL port: {}", p),
            Error::UrlIncomplete(field) => write!(f, "url missing required {}", field),
            Error::BadHeader(m) => write!(f, "bad header: {}", m),
            Error::BadMediaType(m) => write!(f, "bad media type: {}", m),
            Error::BadRequest(m) => write!(f, "{}", m),
            Error::TooManyFollowUps(n) => write!(f, "Too many follow-up requests: {}", n),
            Error::ContentLengthMismatch { expected, actual } => {
                write!(f, "content-length {} but body was {} bytes", expected, actual)
            }
            Error::DuplicateGzip => write!(f, "request is already gzip-encoded"),
            Error::GzipWithoutBody => write!(f, "gzip requires a request body"),
            Error::BodyAlreadyRead => write!(f, "one-shot body was already read"),
            Error::UnreadableResponseBody => {
                write!(f, "cannot read the body of a network, cache, or prior response")
            }
            Error::ResponseBodyClosed => write!(f, "response body is closed"),
            Error::TimedOut => write!(f, "call timed out"),
            Error::Cancelled => write!(f, "call was cancelled"),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
