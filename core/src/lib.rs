/*
 * lib.rs
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

//! Corriere core: a portable HTTP/1.1 client.
//!
//! The value of this crate is correctness on the hard edges of HTTP --
//! URLs, cookies, cache-control, dates, redirects, streaming bodies --
//! not socket I/O. The network transport is abstract: implementations of
//! [`Transport`] plug in under the interceptor chain, which composes user
//! interceptors with the built-in follow-up (redirects) and bridge
//! (headers, cookies) interceptors.

pub mod body;
pub mod cache_control;
pub mod client;
pub mod cookie;
pub mod date;
pub mod error;
pub mod gzip;
pub mod headers;
pub mod media_type;
pub mod protocol;
pub mod request;
pub mod response;
pub mod url;

pub use body::{
    AsyncSource, BufferSource, BytesRequestBody, FileRequestBody, FileSystem, ReaderSource,
    RequestBody, ResponseBody, StreamingRequestBody, TokioFileSystem,
};
pub use cache_control::{CacheControl, CacheControlBuilder};
pub use client::chain::{Chain, Interceptor};
pub use client::follow_up::MAX_FOLLOW_UPS;
pub use client::{
    Clock, HttpClient, HttpClientBuilder, RequestOptions, SystemClock, Transport,
};
pub use cookie::{
    parse_all_cookies, parse_cookie, Cookie, CookieBuilder, CookieJar, MemoryCookieJar, NoCookies,
};
pub use date::{format_http_date, parse_http_date, MAX_DATE};
pub use error::Error;
pub use gzip::{GzipRequestBody, GzipSource};
pub use headers::{Headers, HeadersBuilder};
pub use media_type::MediaType;
pub use protocol::Protocol;
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
pub use url::public_suffix::{PublicSuffixList, PublicSuffixMatcher};
pub use url::{HttpUrl, HttpUrlBuilder};
