/*
 * mod.rs
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

//! The client facade: assembles the interceptor chain over an abstract
//! transport, dispatches calls as cancellable tasks, and bounds each call
//! with a timeout.

pub mod bridge;
pub mod chain;
pub mod follow_up;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::debug;

use crate::cookie::{CookieJar, NoCookies};
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use bridge::BridgeInterceptor;
use chain::{Chain, Interceptor};
use follow_up::FollowUpInterceptor;

/// Default bound on one `execute` call, headers and redirects included.
const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// The network transport. Implementations exchange one request for one
/// response; they must honor cancellation at their await points, and must
/// not follow redirects or manage cookies themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, request: Request, options: &RequestOptions)
        -> Result<Response, Error>;
}

/// Wall-clock source, abstract so tests control time.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Per-call redirect policy.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Follow 3xx redirects.
    pub follow_redirects: bool,
    /// Follow redirects that switch between http and https.
    pub follow_ssl_redirects: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions { follow_redirects: true, follow_ssl_redirects: true }
    }
}

/// An HTTP client: a frozen interceptor list, redirect policy, timeout,
/// and transport. Cheap to share; `new_builder` derives a variant.
pub struct HttpClient {
    interceptors: Vec<Arc<dyn Interceptor>>,
    options: RequestOptions,
    execute_timeout: Duration,
    cookie_jar: Arc<dyn CookieJar>,
    user_agent: String,
    clock: Arc<dyn Clock>,
    transport: Arc<dyn Transport>,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// A builder carrying a snapshot of this client's configuration.
    pub fn new_builder(&self) -> HttpClientBuilder {
        HttpClientBuilder {
            interceptors: self.interceptors.clone(),
            follow_redirects: self.options.follow_redirects,
            follow_ssl_redirects: self.options.follow_ssl_redirects,
            execute_timeout: self.execute_timeout,
            cookie_jar: self.cookie_jar.clone(),
            user_agent: self.user_agent.clone(),
            clock: self.clock.clone(),
            transport: Some(self.transport.clone()),
        }
    }

    /// Execute with the client's configured options and timeout.
    pub async fn execute(&self, request: Request) -> Result<Response, Error> {
        self.execute_with(request, self.options, self.execute_timeout)
            .await
    }

    /// Execute with explicit options and timeout. The timeout bounds the
    /// whole exchange through response headers, including redirect
    /// follow-ups; it does not bound the caller's subsequent body reads.
    /// On elapse the task is aborted so cancellation reaches the
    /// transport and any in-flight body read.
    pub async fn execute_with(
        &self,
        request: Request,
        options: RequestOptions,
        timeout: Duration,
    ) -> Result<Response, Error> {
        let mut interceptors = self.interceptors.clone();
        interceptors.push(Arc::new(FollowUpInterceptor));
        interceptors.push(Arc::new(BridgeInterceptor::new(
            self.cookie_jar.clone(),
            self.user_agent.clone(),
            self.clock.clone(),
        )));
        let transport = self.transport.clone();

        let sent_at = self.clock.now_millis();
        // The call runs as its own task on the I/O runtime so aborting it
        // propagates cancellation into the transport.
        let mut handle = tokio::spawn(async move {
            let chain = Chain::new(&interceptors, transport.as_ref(), options, request.clone());
            chain.proceed(request).await
        });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(result)) => {
                let response = result?;
                let received_at = self.clock.now_millis();
                let mut builder = response.into_builder();
                builder
                    .sent_request_at_millis(sent_at)
                    .received_response_at_millis(received_at);
                builder.build()
            }
            Ok(Err(join_error)) => {
                debug!("call task failed: {}", join_error);
                Err(Error::Cancelled)
            }
            Err(_) => {
                handle.abort();
                debug!("call timed out after {:?}", timeout);
                Err(Error::TimedOut)
            }
        }
    }
}

/// Mutable configuration for [`HttpClient`].
pub struct HttpClientBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    follow_redirects: bool,
    follow_ssl_redirects: bool,
    execute_timeout: Duration,
    cookie_jar: Arc<dyn CookieJar>,
    user_agent: String,
    clock: Arc<dyn Clock>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientBuilder {
    pub fn new() -> HttpClientBuilder {
        HttpClientBuilder {
            interceptors: Vec::new(),
            follow_redirects: true,
            follow_ssl_redirects: true,
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
            cookie_jar: Arc::new(NoCookies),
            user_agent: format!("corriere/{}", env!("CARGO_PKG_VERSION")),
            clock: Arc::new(SystemClock),
            transport: None,
        }
    }

    /// Append a user interceptor. User interceptors run before the
    /// built-in follow-up and bridge interceptors, outermost first.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn follow_redirects(&mut self, follow: bool) -> &mut Self {
        self.follow_redirects = follow;
        self
    }

    pub fn follow_ssl_redirects(&mut self, follow: bool) -> &mut Self {
        self.follow_ssl_redirects = follow;
        self
    }

    pub fn execute_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.execute_timeout = timeout;
        self
    }

    pub fn cookie_jar(&mut self, jar: Arc<dyn CookieJar>) -> &mut Self {
        self.cookie_jar = jar;
        self
    }

    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn clock(&mut self, clock: Arc<dyn Clock>) -> &mut Self {
        self.clock = clock;
        self
    }

    pub fn transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(&self) -> Result<HttpClient, Error> {
        let transport = self
            .transport
            .clone()
            .ok_or_else(|| Error::BadRequest("client has no transport".to_string()))?;
        Ok(HttpClient {
            interceptors: self.interceptors.clone(),
            options: RequestOptions {
                follow_redirects: self.follow_redirects,
                follow_ssl_redirects: self.follow_ssl_redirects,
            },
            execute_timeout: self.execute_timeout,
            cookie_jar: self.cookie_jar.clone(),
            user_agent: self.user_agent.clone(),
            clock: self.clock.clone(),
            transport,
        })
    }
}
