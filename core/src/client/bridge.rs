/*
 * bridge.rs
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

//! Bridge from application code to the network: fills in body framing
//! headers, Host, User-Agent, and the cookie jar on the way out, and
//! hands response cookies back to the jar on the way in.

use std::sync::Arc;

use async_trait::async_trait;
use log::trace;

use super::chain::{Chain, Interceptor};
use super::Clock;
use crate::cookie::{parse_all_cookies, Cookie, CookieJar};
use crate::error::Error;
use crate::response::Response;
use crate::url::{default_port, HttpUrl};

pub struct BridgeInterceptor {
    cookie_jar: Arc<dyn CookieJar>,
    user_agent: String,
    clock: Arc<dyn Clock>,
}

impl BridgeInterceptor {
    pub fn new(
        cookie_jar: Arc<dyn CookieJar>,
        user_agent: String,
        clock: Arc<dyn Clock>,
    ) -> BridgeInterceptor {
        BridgeInterceptor { cookie_jar, user_agent, clock }
    }
}

#[async_trait]
impl Interceptor for BridgeInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response, Error> {
        let user_request = chain.request().clone();
        let mut builder = user_request.new_builder();

        if let Some(body) = user_request.body() {
            if let Some(content_type) = body.content_type() {
                builder.header("Content-Type", &content_type.to_string())?;
            }
            let content_length = body.content_length();
            if content_length >= 0 {
                builder.header("Content-Length", &content_length.to_string())?;
            } else {
                builder.remove_header("Content-Length");
            }
        }

        if user_request.header("Host").is_none() {
            builder.header("Host", &host_header(user_request.url()))?;
        }

        let cookies = self.cookie_jar.load_for_request(user_request.url());
        if !cookies.is_empty() {
            builder.header("Cookie", &cookie_header(&cookies))?;
        }

        if user_request.header("User-Agent").is_none() {
            builder.header("User-Agent", &self.user_agent)?;
        }

        let network_request = builder.build()?;
        let response = chain.proceed(network_request.clone()).await?;

        // Cookies are parsed against the URL the network request used.
        let received = parse_all_cookies(
            self.clock.now_millis(),
            network_request.url(),
            response.headers(),
        );
        if !received.is_empty() {
            trace!("saving {} cookie(s) for {}", received.len(), network_request.url().redact());
            self.cookie_jar
                .save_from_response(network_request.url(), received);
        }

        Ok(response)
    }
}

/// Host header value: bracketed for IPv6, port only when non-default.
fn host_header(url: &HttpUrl) -> String {
    let host = if url.host().contains(':') {
        format!("[{}]", url.host())
    } else {
        url.host().to_string()
    };
    if url.port() != default_port(url.scheme()) {
        format!("{}:{}", host, url.port())
    } else {
        host
    }
}

/// Cookie header value: `a=b; c=d` in jar order.
fn cookie_header(cookies: &[Cookie]) -> String {
    let mut out = String::new();
    for (i, cookie) in cookies.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(cookie.name());
        out.push('=');
        out.push_str(cookie.value());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_header_forms() {
        let url = HttpUrl::parse("http://example.com/").unwrap();
        assert_eq!(host_header(&url), "example.com");
        let url = HttpUrl::parse("http://example.com:8080/").unwrap();
        assert_eq!(host_header(&url), "example.com:8080");
        let url = HttpUrl::parse("https://[::1]/").unwrap();
        assert_eq!(host_header(&url), "[::1]");
        let url = HttpUrl::parse("https://[::1]:8443/").unwrap();
        assert_eq!(host_header(&url), "[::1]:8443");
    }

    #[test]
    fn cookie_header_joins() {
        let url = HttpUrl::parse("https://example.com/").unwrap();
        let cookies = vec![
            crate::cookie::parse_cookie(0, &url, "a=b").unwrap(),
            crate::cookie::parse_cookie(0, &url, "c=d").unwrap(),
        ];
        assert_eq!(cookie_header(&cookies), "a=b; c=d");
    }
}
