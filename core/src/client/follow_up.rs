/*
 * follow_up.rs
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

//! Bounded redirect follow-up: rewrites the method and headers per the
//! 3xx code, refuses to replay one-shot bodies, scrubs credentials across
//! origins, and chains superseded responses as body-stripped priors.

use async_trait::async_trait;
use log::debug;

use super::chain::{Chain, Interceptor};
use super::RequestOptions;
use crate::error::Error;
use crate::request::{permits_request_body, redirects_to_get, redirects_with_body, Request};
use crate::response::Response;
use crate::url::HttpUrl;

/// Hard cap on redirects per call.
pub const MAX_FOLLOW_UPS: u32 = 20;

pub struct FollowUpInterceptor;

#[async_trait]
impl Interceptor for FollowUpInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response, Error> {
        let options = *chain.options();
        let mut request = chain.request().clone();
        let mut prior_response: Option<Response> = None;
        let mut follow_up_count: u32 = 0;

        loop {
            let response = chain.proceed(request.clone()).await?;

            // Attach the chain of superseded responses, bodies stripped.
            let mut response = match prior_response.take() {
                Some(prior) => {
                    let mut builder = response.into_builder();
                    builder.prior_response(Some(prior.strip_body()))?;
                    builder.build()?
                }
                None => response,
            };

            // Rebuild from this hop's request as the caller wrote it, not
            // the network request the bridge derived from it.
            let follow_up = follow_up_request(&response, &request, &options)?;
            let next = match follow_up {
                Some(next) => next,
                None => return Ok(response),
            };

            if let Some(body) = next.body() {
                if body.is_one_shot() {
                    debug!("not following redirect: one-shot request body");
                    return Ok(response);
                }
            }

            follow_up_count += 1;
            if follow_up_count > MAX_FOLLOW_UPS {
                response.close();
                return Err(Error::TooManyFollowUps(follow_up_count));
            }

            debug!(
                "following {} redirect to {}",
                response.code(),
                next.url().redact()
            );
            response.close();
            prior_response = Some(response);
            request = next;
        }
    }
}

/// The request to issue next, or None when the response stands as-is.
fn follow_up_request(
    response: &Response,
    request: &Request,
    options: &RequestOptions,
) -> Result<Option<Request>, Error> {
    if !response.is_redirect() {
        return Ok(None);
    }
    if !options.follow_redirects {
        return Ok(None);
    }
    let location = match response.header("Location") {
        Some(location) => location,
        None => return Ok(None),
    };
    let url = match request.url().resolve(location) {
        Some(url) => url,
        None => return Ok(None), // malformed or unsupported scheme
    };
    if url.scheme() != request.url().scheme() && !options.follow_ssl_redirects {
        return Ok(None);
    }

    let mut builder = request.new_builder();
    let method = request.method().to_string();
    let code = response.code();

    if permits_request_body(&method) {
        let retains_status = code == 307 || code == 308;
        let maintain_body = redirects_with_body(&method) || retains_status;
        if redirects_to_get(&method) && !retains_status {
            builder.method("GET", None)?;
        } else {
            let body = if maintain_body { request.body().cloned() } else { None };
            builder.method(&method, body)?;
        }
        if !maintain_body {
            builder.remove_header("Transfer-Encoding");
            builder.remove_header("Content-Length");
            builder.remove_header("Content-Type");
        }
    }

    // Credentials do not cross to another origin.
    if !same_origin(request.url(), &url) {
        builder.remove_header("Authorization");
    }

    builder.url(url);
    Ok(Some(builder.build()?))
}

fn same_origin(a: &HttpUrl, b: &HttpUrl) -> bool {
    a.host() == b.host() && a.port() == b.port() && a.scheme() == b.scheme()
}
