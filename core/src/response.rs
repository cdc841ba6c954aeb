/*
 * response.rs
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

//! HTTP responses: status, headers, a one-shot streaming body, and links
//! to the network, cache, and prior responses that produced this one.
//! Linked responses carry body-stripped placeholders and no further links.

use std::fmt;

use crate::body::ResponseBody;
use crate::error::Error;
use crate::headers::{Headers, HeadersBuilder};
use crate::protocol::Protocol;
use crate::request::Request;

/// An HTTP response. The caller owns it and must close the body (dropping
/// closes too).
pub struct Response {
    request: Request,
    protocol: Protocol,
    code: u16,
    message: String,
    headers: Headers,
    body: ResponseBody,
    network_response: Option<Box<Response>>,
    cache_response: Option<Box<Response>>,
    prior_response: Option<Box<Response>>,
    sent_request_at_millis: i64,
    received_response_at_millis: i64,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Last header value for a case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// The raw response from the network, body-stripped. None when this
    /// response was served without the network.
    pub fn network_response(&self) -> Option<&Response> {
        self.network_response.as_deref()
    }

    /// The raw response from the cache, body-stripped.
    pub fn cache_response(&self) -> Option<&Response> {
        self.cache_response.as_deref()
    }

    /// The response that triggered this one (redirect or auth challenge),
    /// body-stripped.
    pub fn prior_response(&self) -> Option<&Response> {
        self.prior_response.as_deref()
    }

    pub fn sent_request_at_millis(&self) -> i64 {
        self.sent_request_at_millis
    }

    pub fn received_response_at_millis(&self) -> i64 {
        self.received_response_at_millis
    }

    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// True for the codes the follow-up interceptor treats as redirects.
    pub fn is_redirect(&self) -> bool {
        matches!(self.code, 300 | 301 | 302 | 303 | 307 | 308)
    }

    /// Declared Content-Length, or -1 when absent or malformed.
    pub fn header_content_length(&self) -> i64 {
        self.header("Content-Length")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1)
    }

    /// True when the response is expected to carry body bytes: everything
    /// except HEAD responses and 1xx/204/304 without explicit framing.
    pub fn promises_body(&self) -> bool {
        if self.request.method() == "HEAD" {
            return false;
        }
        let informational = (100..200).contains(&self.code);
        if !informational && self.code != 204 && self.code != 304 {
            return true;
        }
        self.header_content_length() != -1
            || self
                .header("Transfer-Encoding")
                .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    }

    /// Close the response body. Idempotent.
    pub fn close(&mut self) {
        self.body.close();
    }

    /// Replace the body with an unreadable placeholder keeping content
    /// type and length. Links (including a prior chain) are preserved.
    pub fn strip_body(mut self) -> Response {
        let content_type = self.body.content_type().cloned();
        let content_length = self.body.content_length();
        self.body.close();
        Response {
            body: ResponseBody::unreadable(content_type, content_length),
            ..self
        }
    }

    /// A builder carrying all of this response's fields, consuming it.
    pub fn into_builder(self) -> ResponseBuilder {
        ResponseBuilder {
            request: Some(self.request),
            protocol: Some(self.protocol),
            code: Some(self.code),
            message: self.message,
            headers: self.headers.new_builder(),
            body: Some(self.body),
            network_response: self.network_response,
            cache_response: self.cache_response,
            prior_response: self.prior_response,
            sent_request_at_millis: self.sent_request_at_millis,
            received_response_at_millis: self.received_response_at_millis,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response{{protocol={}, code={}, message={}, url={}}}",
            self.protocol,
            self.code,
            self.message,
            self.request.url()
        )
    }
}

/// Mutable builder for [`Response`].
pub struct ResponseBuilder {
    request: Option<Request>,
    protocol: Option<Protocol>,
    code: Option<u16>,
    message: String,
    headers: HeadersBuilder,
    body: Option<ResponseBody>,
    network_response: Option<Box<Response>>,
    cache_response: Option<Box<Response>>,
    prior_response: Option<Box<Response>>,
    sent_request_at_millis: i64,
    received_response_at_millis: i64,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    pub fn new() -> ResponseBuilder {
        ResponseBuilder {
            request: None,
            protocol: None,
            code: None,
            message: String::new(),
            headers: HeadersBuilder::new(),
            body: None,
            network_response: None,
            cache_response: None,
            prior_response: None,
            sent_request_at_millis: 0,
            received_response_at_millis: 0,
        }
    }

    pub fn request(&mut self, request: Request) -> &mut Self {
        self.request = Some(request);
        self
    }

    pub fn protocol(&mut self, protocol: Protocol) -> &mut Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn code(&mut self, code: u16) -> &mut Self {
        self.code = Some(code);
        self
    }

    pub fn message(&mut self, message: &str) -> &mut Self {
        self.message = message.to_string();
        self
    }

    pub fn headers(&mut self, headers: &Headers) -> &mut Self {
        self.headers = headers.new_builder();
        self
    }

    /// Set a header, replacing prior values for the name.
    pub fn header(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self, Error> {
        self.headers.add(name, value)?;
        Ok(self)
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove_all(name);
        self
    }

    pub fn body(&mut self, body: ResponseBody) -> &mut Self {
        self.body = Some(body);
        self
    }

    pub fn network_response(&mut self, response: Option<Response>) -> Result<&mut Self, Error> {
        check_leaf("networkResponse", response.as_ref())?;
        self.network_response = response.map(Box::new);
        Ok(self)
    }

    pub fn cache_response(&mut self, response: Option<Response>) -> Result<&mut Self, Error> {
        check_leaf("cacheResponse", response.as_ref())?;
        self.cache_response = response.map(Box::new);
        Ok(self)
    }

    /// A prior response must be body-stripped; it may itself carry a
    /// prior chain.
    pub fn prior_response(&mut self, response: Option<Response>) -> Result<&mut Self, Error> {
        if let Some(response) = &response {
            if !response.body.is_stripped() {
                return Err(Error::BadRequest(
                    "priorResponse must have a stripped body".to_string(),
                ));
            }
        }
        self.prior_response = response.map(Box::new);
        Ok(self)
    }

    pub fn sent_request_at_millis(&mut self, millis: i64) -> &mut Self {
        self.sent_request_at_millis = millis;
        self
    }

    pub fn received_response_at_millis(&mut self, millis: i64) -> &mut Self {
        self.received_response_at_millis = millis;
        self
    }

    pub fn build(&mut self) -> Result<Response, Error> {
        let request = self
            .request
            .take()
            .ok_or_else(|| Error::BadRequest("response has no request".to_string()))?;
        let protocol = self
            .protocol
            .ok_or_else(|| Error::BadRequest("response has no protocol".to_string()))?;
        let code = self
            .code
            .ok_or_else(|| Error::BadRequest("response has no code".to_string()))?;
        Ok(Response {
            request,
            protocol,
            code,
            message: std::mem::take(&mut self.message),
            headers: self.headers.build(),
            body: self.body.take().unwrap_or_else(ResponseBody::empty),
            network_response: self.network_response.take(),
            cache_response: self.cache_response.take(),
            prior_response: self.prior_response.take(),
            sent_request_at_millis: self.sent_request_at_millis,
            received_response_at_millis: self.received_response_at_millis,
        })
    }
}

/// Network and cache responses must be body-stripped leaves.
fn check_leaf(name: &str, response: Option<&Response>) -> Result<(), Error> {
    if let Some(response) = response {
        if !response.body.is_stripped() {
            return Err(Error::BadRequest(format!("{} must have a stripped body", name)));
        }
        if response.network_response.is_some()
            || response.cache_response.is_some()
            || response.prior_response.is_some()
        {
            return Err(Error::BadRequest(format!(
                "{} must not link to further responses",
                name
            )));
        }
    }
    Ok(())
}
