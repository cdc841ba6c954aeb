/*
 * request.rs
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

//! Immutable HTTP requests and their builder.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::body::RequestBody;
use crate::cache_control::CacheControl;
use crate::error::Error;
use crate::gzip::GzipRequestBody;
use crate::headers::{Headers, HeadersBuilder};
use crate::url::HttpUrl;

/// True when the method may carry a request body.
pub(crate) fn permits_request_body(method: &str) -> bool {
    !matches!(method, "GET" | "HEAD")
}

/// True when the method must carry a request body.
pub(crate) fn requires_request_body(method: &str) -> bool {
    matches!(method, "POST" | "PUT" | "PATCH" | "PROPPATCH" | "QUERY" | "REPORT")
}

/// True when a redirect of this method keeps the method and body.
pub(crate) fn redirects_with_body(method: &str) -> bool {
    method == "PROPFIND"
}

/// True when a redirect of this method becomes a bodiless GET.
pub(crate) fn redirects_to_get(method: &str) -> bool {
    method != "PROPFIND"
}

/// An immutable request: URL, method, headers, and an optional body.
#[derive(Clone)]
pub struct Request {
    url: HttpUrl,
    method: String,
    headers: Headers,
    body: Option<Arc<dyn RequestBody>>,
    cache_url_override: Option<HttpUrl>,
    cache_control: OnceLock<CacheControl>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn url(&self) -> &HttpUrl {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Last header value for a case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> Option<&Arc<dyn RequestBody>> {
        self.body.as_ref()
    }

    /// URL to use as the cache key instead of the request URL.
    pub fn cache_url_override(&self) -> Option<&HttpUrl> {
        self.cache_url_override.as_ref()
    }

    /// Cache directives from the headers, computed once on first use.
    pub fn cache_control(&self) -> &CacheControl {
        self.cache_control
            .get_or_init(|| CacheControl::parse(&self.headers))
    }

    pub fn new_builder(&self) -> RequestBuilder {
        RequestBuilder {
            url: Some(self.url.clone()),
            method: self.method.clone(),
            headers: self.headers.new_builder(),
            body: self.body.clone(),
            cache_url_override: self.cache_url_override.clone(),
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Request{{method={}, url={}}}", self.method, self.url)
    }
}

/// Mutable builder for [`Request`].
pub struct RequestBuilder {
    url: Option<HttpUrl>,
    method: String,
    headers: HeadersBuilder,
    body: Option<Arc<dyn RequestBody>>,
    cache_url_override: Option<HttpUrl>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> RequestBuilder {
        RequestBuilder {
            url: None,
            method: "GET".to_string(),
            headers: HeadersBuilder::new(),
            body: None,
            cache_url_override: None,
        }
    }

    pub fn url(&mut self, url: HttpUrl) -> &mut Self {
        self.url = Some(url);
        self
    }

    /// Parse and set the URL. `ws:` and `wss:` URLs are exchanged for
    /// their HTTP equivalents.
    pub fn url_str(&mut self, url: &str) -> Result<&mut Self, Error> {
        let normalized = if url.len() >= 3 && url[..3].eq_ignore_ascii_case("ws:") {
            format!("http:{}", &url[3..])
        } else if url.len() >= 4 && url[..4].eq_ignore_ascii_case("wss:") {
            format!("https:{}", &url[4..])
        } else {
            url.to_string()
        };
        self.url = Some(HttpUrl::parse(&normalized)?);
        Ok(self)
    }

    pub fn get(&mut self) -> &mut Self {
        self.method("GET", None).unwrap()
    }

    pub fn head(&mut self) -> &mut Self {
        self.method("HEAD", None).unwrap()
    }

    pub fn post(&mut self, body: Arc<dyn RequestBody>) -> &mut Self {
        self.method("POST", Some(body)).unwrap()
    }

    pub fn put(&mut self, body: Arc<dyn RequestBody>) -> &mut Self {
        self.method("PUT", Some(body)).unwrap()
    }

    pub fn patch(&mut self, body: Arc<dyn RequestBody>) -> &mut Self {
        self.method("PATCH", Some(body)).unwrap()
    }

    pub fn delete(&mut self, body: Option<Arc<dyn RequestBody>>) -> &mut Self {
        self.method("DELETE", body).unwrap()
    }

    /// Set an arbitrary method and body. The method must be non-empty;
    /// body requirements are enforced at build time.
    pub fn method(
        &mut self,
        method: &str,
        body: Option<Arc<dyn RequestBody>>,
    ) -> Result<&mut Self, Error> {
        if method.is_empty() {
            return Err(Error::BadRequest("method is empty".to_string()));
        }
        self.method = method.to_string();
        self.body = body;
        Ok(self)
    }

    /// Set a header, replacing any prior values for the name.
    pub fn header(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    /// Add a header without replacing prior values.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        self.headers.add(name, value)?;
        Ok(self)
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove_all(name);
        self
    }

    pub fn headers(&mut self, headers: &Headers) -> &mut Self {
        self.headers = headers.new_builder();
        self
    }

    /// Set the Cache-Control header from directives; an empty rendering
    /// removes the header.
    pub fn cache_control(&mut self, cache_control: &CacheControl) -> Result<&mut Self, Error> {
        let value = cache_control.to_string();
        if value.is_empty() {
            self.headers.remove_all("Cache-Control");
            Ok(self)
        } else {
            self.header("Cache-Control", &value)
        }
    }

    pub fn cache_url_override(&mut self, url: Option<HttpUrl>) -> &mut Self {
        self.cache_url_override = url;
        self
    }

    /// Transmit the body gzip-encoded. Fails without a body or when the
    /// request is already gzip-encoded.
    pub fn gzip(&mut self) -> Result<&mut Self, Error> {
        let body = match self.body.take() {
            Some(body) => body,
            None => return Err(Error::GzipWithoutBody),
        };
        if self
            .headers
            .get("Content-Encoding")
            .is_some_and(|v| v.eq_ignore_ascii_case("gzip"))
        {
            self.body = Some(body);
            return Err(Error::DuplicateGzip);
        }
        self.body = Some(Arc::new(GzipRequestBody::new(body)));
        self.headers.set("Content-Encoding", "gzip")?;
        Ok(self)
    }

    pub fn build(&self) -> Result<Request, Error> {
        let url = self
            .url
            .clone()
            .ok_or_else(|| Error::BadRequest("request has no URL".to_string()))?;
        if self.body.is_some() && !permits_request_body(&self.method) {
            return Err(Error::BadRequest(format!(
                "method {} must not have a request body",
                self.method
            )));
        }
        if self.body.is_none() && requires_request_body(&self.method) {
            return Err(Error::BadRequest(format!(
                "method {} must have a request body",
                self.method
            )));
        }
        Ok(Request {
            url,
            method: self.method.clone(),
            headers: self.headers.build(),
            body: self.body.clone(),
            cache_url_override: self.cache_url_override.clone(),
            cache_control: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BytesRequestBody;

    fn body() -> Arc<dyn RequestBody> {
        Arc::new(BytesRequestBody::from_text("x", None))
    }

    #[test]
    fn get_request() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        let request = b.build().unwrap();
        assert_eq!(request.method(), "GET");
        assert!(request.body().is_none());
    }

    #[test]
    fn ws_urls_normalize() {
        let mut b = Request::builder();
        b.url_str("ws://example.com/socket").unwrap();
        assert_eq!(b.build().unwrap().url().scheme(), "http");
        let mut b = Request::builder();
        b.url_str("WSS://example.com/socket").unwrap();
        assert_eq!(b.build().unwrap().url().scheme(), "https");
    }

    #[test]
    fn body_requirements() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        assert!(b.method("POST", None).unwrap().build().is_err());

        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.method("GET", Some(body())).unwrap();
        assert!(b.build().is_err());

        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.post(body());
        assert!(b.build().is_ok());

        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        assert!(b.method("", None).is_err());
    }

    #[test]
    fn delete_body_is_optional() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.delete(None);
        assert!(b.build().is_ok());
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.delete(Some(body()));
        assert!(b.build().is_ok());
    }

    #[test]
    fn header_set_and_add() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.add_header("Accept", "text/html").unwrap();
        b.add_header("Accept", "text/plain").unwrap();
        b.header("User-Agent", "test").unwrap();
        b.header("User-Agent", "test2").unwrap();
        let request = b.build().unwrap();
        assert_eq!(request.headers().values("Accept").len(), 2);
        assert_eq!(request.header("User-Agent"), Some("test2"));
    }

    #[test]
    fn cache_control_lazy() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.header("Cache-Control", "max-age=60, public").unwrap();
        let request = b.build().unwrap();
        assert_eq!(request.cache_control().max_age_seconds(), 60);
        assert!(request.cache_control().is_public());
    }

    #[test]
    fn cache_control_setter_removes_when_empty() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.header("Cache-Control", "no-store").unwrap();
        b.cache_control(&CacheControl::default()).unwrap();
        assert_eq!(b.build().unwrap().header("Cache-Control"), None);
    }

    #[test]
    fn gzip_wraps_body() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.post(body());
        b.gzip().unwrap();
        let request = b.build().unwrap();
        assert_eq!(request.header("Content-Encoding"), Some("gzip"));
        assert_eq!(request.body().unwrap().content_length(), -1);
    }

    #[test]
    fn gzip_without_body_fails() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        assert!(matches!(b.gzip(), Err(Error::GzipWithoutBody)));
    }

    #[test]
    fn duplicate_gzip_fails() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.post(body());
        b.gzip().unwrap();
        assert!(matches!(b.gzip(), Err(Error::DuplicateGzip)));
    }

    #[test]
    fn new_builder_copies() {
        let mut b = Request::builder();
        b.url_str("http://example.com/").unwrap();
        b.header("X-A", "1").unwrap();
        let request = b.build().unwrap();
        let mut b2 = request.new_builder();
        b2.header("X-B", "2").unwrap();
        let request2 = b2.build().unwrap();
        assert_eq!(request2.header("X-A"), Some("1"));
        assert_eq!(request2.header("X-B"), Some("2"));
        assert_eq!(request.header("X-B"), None);
    }
}
