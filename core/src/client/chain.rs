/*
 * chain.rs
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

//! Interceptor chain: an ordered list of interceptors composed
//! recursively around the terminal transport dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use log::trace;

use super::{RequestOptions, Transport};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Observes and rewrites a call. An interceptor may rewrite the request
/// before `proceed`, call `proceed` zero or more times, rewrite the
/// response, or fail the call.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response, Error>;
}

/// One step of the interceptor chain. Carries the request as interceptors
/// have rewritten it so far.
pub struct Chain<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    index: usize,
    request: Request,
    options: RequestOptions,
    transport: &'a dyn Transport,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn Interceptor>],
        transport: &'a dyn Transport,
        options: RequestOptions,
        request: Request,
    ) -> Chain<'a> {
        Chain { interceptors, index: 0, request, options, transport }
    }

    /// The request as it stands at this point of the chain.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Hand the request to the next interceptor, or to the transport when
    /// the interceptors are exhausted.
    pub async fn proceed(&self, request: Request) -> Result<Response, Error> {
        match self.interceptors.get(self.index) {
            Some(interceptor) => {
                trace!("chain[{}] {} {}", self.index, request.method(), request.url());
                let next = Chain {
                    interceptors: self.interceptors,
                    index: self.index + 1,
                    request,
                    options: self.options,
                    transport: self.transport,
                };
                interceptor.intercept(next).await
            }
            None => {
                trace!("dispatch {} {}", request.method(), request.url());
                self.transport.dispatch(request, &self.options).await
            }
        }
    }
}
