/*
 * client_test.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Integration tests for the HTTP client: the interceptor chain, the
 * bridge and follow-up interceptors, and call timeouts, driven by a
 * scripted in-memory transport instead of the network.
 *
 * Run with:
 *   cargo test -p corriere-core --test client_test
 */

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

use corriere_core::{
    parse_cookie, BufferSource, BytesRequestBody, Chain, CookieJar, Error, HttpClient,
    Interceptor, MemoryCookieJar, Protocol, Request, RequestOptions, Response, ResponseBody,
    StreamingRequestBody, Transport,
};

/// One scripted exchange: the response the transport will produce.
struct Script {
    code: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: &'static [u8],
}

impl Script {
    fn ok(body: &'static [u8]) -> Script {
        Script { code: 200, headers: vec![], body }
    }

    fn redirect(code: u16, location: &'static str) -> Script {
        Script { code, headers: vec![("Location", location)], body: b"" }
    }
}

/// Transport that replays a script and records every dispatched request.
/// When the script runs dry it repeats the last entry.
struct ScriptedTransport {
    script: Mutex<VecDeque<Script>>,
    repeat: Mutex<Option<Script>>,
    requests: Mutex<Vec<Request>>,
    read_bodies: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Script>) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport {
            script: Mutex::new(script.into()),
            repeat: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            read_bodies: Mutex::new(Vec::new()),
        })
    }

    fn repeating(script: Script) -> Arc<ScriptedTransport> {
        Arc::new(ScriptedTransport {
            script: Mutex::new(VecDeque::new()),
            repeat: Mutex::new(Some(script)),
            requests: Mutex::new(Vec::new()),
            read_bodies: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn read_bodies(&self) -> Vec<Vec<u8>> {
        self.read_bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn dispatch(
        &self,
        request: Request,
        _options: &RequestOptions,
    ) -> Result<Response, Error> {
        // Consume the request body the way a real transport would.
        if let Some(body) = request.body() {
            let mut source = body.open_read()?;
            let mut sink = BytesMut::new();
            while source.read(&mut sink, 8 * 1024).await? > 0 {}
            self.read_bodies.lock().unwrap().push(sink.to_vec());
        }
        self.requests.lock().unwrap().push(request.clone());

        let script = {
            let mut queue = self.script.lock().unwrap();
            match queue.pop_front() {
                Some(s) => s,
                None => {
                    let repeat = self.repeat.lock().unwrap();
                    let template = repeat.as_ref().expect("transport script exhausted");
                    Script {
                        code: template.code,
                        headers: template.headers.clone(),
                        body: template.body,
                    }
                }
            }
        };

        let mut builder = Response::builder();
        builder
            .request(request)
            .protocol(Protocol::Http11)
            .code(script.code)
            .message("scripted")
            .body(ResponseBody::from_bytes(script.body, None));
        for (name, value) in &script.headers {
            builder.add_header(name, value).unwrap();
        }
        builder.build()
    }
}

fn client(transport: Arc<ScriptedTransport>) -> HttpClient {
    let mut builder = HttpClient::builder();
    builder.transport(transport);
    builder.build().unwrap()
}

fn get(url: &str) -> Request {
    let mut builder = Request::builder();
    builder.url_str(url).unwrap();
    builder.build().unwrap()
}

#[tokio::test]
async fn simple_call_stamps_timestamps() {
    let transport = ScriptedTransport::new(vec![Script::ok(b"hello")]);
    let mut response = client(transport.clone())
        .execute(get("http://example.com/"))
        .await
        .unwrap();
    assert_eq!(response.code(), 200);
    assert!(response.sent_request_at_millis() > 0);
    assert!(response.received_response_at_millis() >= response.sent_request_at_millis());
    assert_eq!(&response.body_mut().bytes().await.unwrap()[..], b"hello");
}

#[tokio::test]
async fn redirect_chain_links_prior_responses() {
    let transport = ScriptedTransport::new(vec![
        Script::redirect(302, "/b"),
        Script::redirect(302, "/c"),
        Script::ok(b"done"),
    ]);
    let response = client(transport.clone())
        .execute(get("http://example.com/a"))
        .await
        .unwrap();

    assert_eq!(response.code(), 200);
    let prior = response.prior_response().unwrap();
    assert_eq!(prior.code(), 302);
    let prior_prior = prior.prior_response().unwrap();
    assert_eq!(prior_prior.code(), 302);
    assert!(prior_prior.prior_response().is_none());

    let paths: Vec<String> = transport
        .requests()
        .iter()
        .map(|r| r.url().encoded_path().to_string())
        .collect();
    assert_eq!(paths, vec!["/a", "/b", "/c"]);
}

#[tokio::test]
async fn follow_redirects_disabled_returns_redirect() {
    let transport = ScriptedTransport::new(vec![Script::redirect(302, "/b")]);
    let mut builder = HttpClient::builder();
    builder.transport(transport.clone()).follow_redirects(false);
    let response = builder
        .build()
        .unwrap()
        .execute(get("http://example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.code(), 302);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn cross_scheme_redirect_requires_ssl_redirects() {
    let transport = ScriptedTransport::new(vec![Script::redirect(302, "https://example.com/b")]);
    let mut builder = HttpClient::builder();
    builder
        .transport(transport.clone())
        .follow_ssl_redirects(false);
    let response = builder
        .build()
        .unwrap()
        .execute(get("http://example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.code(), 302);
}

#[tokio::test]
async fn too_many_follow_ups_fails() {
    let transport = ScriptedTransport::repeating(Script::redirect(302, "/loop"));
    let result = client(transport.clone())
        .execute(get("http://example.com/a"))
        .await;
    match result {
        Err(error @ Error::TooManyFollowUps(count)) => {
            assert_eq!(count, 21);
            assert_eq!(error.to_string(), "Too many follow-up requests: 21");
        }
        _ => panic!("expected TooManyFollowUps"),
    }
    // 21 requests were dispatched: the original plus twenty follow-ups.
    assert_eq!(transport.requests().len(), 21);
}

#[tokio::test]
async fn post_becomes_get_on_302() {
    let transport = ScriptedTransport::new(vec![Script::redirect(302, "/b"), Script::ok(b"")]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com/a").unwrap();
    builder.post(Arc::new(BytesRequestBody::from_text("payload", None)));
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].method(), "POST");
    assert_eq!(requests[1].method(), "GET");
    assert!(requests[1].body().is_none());
    assert_eq!(requests[1].header("Content-Length"), None);
    assert_eq!(requests[1].header("Content-Type"), None);
}

#[tokio::test]
async fn post_retains_method_and_body_on_307() {
    let transport = ScriptedTransport::new(vec![Script::redirect(307, "/b"), Script::ok(b"")]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com/a").unwrap();
    builder.post(Arc::new(BytesRequestBody::from_text("payload", None)));
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].method(), "POST");
    assert!(requests[1].body().is_some());
    assert_eq!(transport.read_bodies(), vec![b"payload".to_vec(), b"payload".to_vec()]);
}

#[tokio::test]
async fn one_shot_body_is_not_retransmitted() {
    let transport = ScriptedTransport::new(vec![Script::redirect(307, "/b"), Script::ok(b"")]);
    let body = StreamingRequestBody::new(
        Box::new(BufferSource::new(bytes::Bytes::from_static(b"once"))),
        None,
        4,
    );
    let mut builder = Request::builder();
    builder.url_str("http://example.com/a").unwrap();
    builder.post(Arc::new(body));
    let response = client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    assert_eq!(response.code(), 307);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn authorization_stripped_across_origins() {
    let transport = ScriptedTransport::new(vec![
        Script::redirect(302, "http://other.example/"),
        Script::ok(b""),
    ]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com/a").unwrap();
    builder.header("Authorization", "Basic dXNlcg==").unwrap();
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].header("Authorization"), Some("Basic dXNlcg=="));
    assert_eq!(requests[1].header("Authorization"), None);
}

#[tokio::test]
async fn authorization_kept_on_same_origin() {
    let transport = ScriptedTransport::new(vec![Script::redirect(302, "/b"), Script::ok(b"")]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com/a").unwrap();
    builder.header("Authorization", "Basic dXNlcg==").unwrap();
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[1].header("Authorization"), Some("Basic dXNlcg=="));
}

#[tokio::test]
async fn bridge_fills_in_request_headers() {
    let transport = ScriptedTransport::new(vec![Script::ok(b"")]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com:8080/").unwrap();
    builder.post(Arc::new(BytesRequestBody::from_text(
        "hi",
        corriere_core::MediaType::parse("text/plain; charset=utf-8"),
    )));
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let network_request = &transport.requests()[0];
    assert_eq!(network_request.header("Host"), Some("example.com:8080"));
    assert_eq!(
        network_request.header("Content-Type"),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(network_request.header("Content-Length"), Some("2"));
    let user_agent = network_request.header("User-Agent").unwrap();
    assert!(user_agent.starts_with("corriere/"));
    // the bridge never volunteers Accept-Encoding
    assert_eq!(network_request.header("Accept-Encoding"), None);
}

#[tokio::test]
async fn bridge_round_trips_cookies_through_jar() {
    let jar = Arc::new(MemoryCookieJar::new());
    let url = corriere_core::HttpUrl::parse("http://example.com/").unwrap();
    jar.save_from_response(&url, vec![parse_cookie(0, &url, "session=abc").unwrap()]);

    let transport = ScriptedTransport::new(vec![Script {
        code: 200,
        headers: vec![("Set-Cookie", "token=xyz")],
        body: b"",
    }]);
    let mut builder = HttpClient::builder();
    builder.transport(transport.clone()).cookie_jar(jar.clone());
    builder
        .build()
        .unwrap()
        .execute(get("http://example.com/"))
        .await
        .unwrap();

    assert_eq!(transport.requests()[0].header("Cookie"), Some("session=abc"));
    let loaded = jar.load_for_request(&url);
    assert!(loaded.iter().any(|c| c.name() == "token" && c.value() == "xyz"));
}

#[tokio::test]
async fn gzip_request_body_reaches_transport_compressed() {
    let transport = ScriptedTransport::new(vec![Script::ok(b"")]);
    let mut builder = Request::builder();
    builder.url_str("http://example.com/").unwrap();
    builder.post(Arc::new(BytesRequestBody::from_text("hello gzip", None)));
    builder.gzip().unwrap();
    client(transport.clone())
        .execute(builder.build().unwrap())
        .await
        .unwrap();

    let network_request = &transport.requests()[0];
    assert_eq!(network_request.header("Content-Encoding"), Some("gzip"));
    // unknown compressed length means no Content-Length header
    assert_eq!(network_request.header("Content-Length"), None);

    let sent = &transport.read_bodies()[0];
    let mut decoder = flate2::read::GzDecoder::new(&sent[..]);
    let mut plain = Vec::new();
    std::io::Read::read_to_end(&mut decoder, &mut plain).unwrap();
    assert_eq!(plain, b"hello gzip");
}

/// Interceptor that tags requests and responses to prove its position in
/// the chain.
struct TaggingInterceptor;

#[async_trait]
impl Interceptor for TaggingInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response, Error> {
        let mut builder = chain.request().clone().new_builder();
        builder.header("X-Tagged", "1").unwrap();
        let response = chain.proceed(builder.build()?).await?;
        let mut builder = response.into_builder();
        builder.header("X-Tagged-Response", "1").unwrap();
        builder.build()
    }
}

#[tokio::test]
async fn user_interceptor_wraps_the_call() {
    let transport = ScriptedTransport::new(vec![Script::ok(b"")]);
    let mut builder = HttpClient::builder();
    builder
        .transport(transport.clone())
        .add_interceptor(Arc::new(TaggingInterceptor));
    let response = builder
        .build()
        .unwrap()
        .execute(get("http://example.com/"))
        .await
        .unwrap();

    assert_eq!(transport.requests()[0].header("X-Tagged"), Some("1"));
    assert_eq!(response.header("X-Tagged-Response"), Some("1"));
}

/// Interceptor that answers without calling proceed.
struct ShortCircuitInterceptor;

#[async_trait]
impl Interceptor for ShortCircuitInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response, Error> {
        let mut builder = Response::builder();
        builder
            .request(chain.request().clone())
            .protocol(Protocol::Http11)
            .code(200)
            .message("intercepted")
            .body(ResponseBody::from_bytes(&b"local"[..], None));
        builder.build()
    }
}

#[tokio::test]
async fn interceptor_can_short_circuit() {
    let transport = ScriptedTransport::new(vec![]);
    let mut builder = HttpClient::builder();
    builder
        .transport(transport.clone())
        .add_interceptor(Arc::new(ShortCircuitInterceptor));
    let mut response = builder
        .build()
        .unwrap()
        .execute(get("http://example.com/"))
        .await
        .unwrap();

    assert_eq!(response.message(), "intercepted");
    assert_eq!(&response.body_mut().bytes().await.unwrap()[..], b"local");
    assert!(transport.requests().is_empty());
}

/// Transport that never completes until cancelled.
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn dispatch(
        &self,
        _request: Request,
        _options: &RequestOptions,
    ) -> Result<Response, Error> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(Error::Cancelled)
    }
}

#[tokio::test(start_paused = true)]
async fn execute_timeout_cancels_the_call() {
    let mut builder = HttpClient::builder();
    builder
        .transport(Arc::new(HangingTransport))
        .execute_timeout(Duration::from_millis(50));
    let result = builder
        .build()
        .unwrap()
        .execute(get("http://example.com/"))
        .await;
    assert!(matches!(result, Err(Error::TimedOut)));
}

#[tokio::test]
async fn execute_with_overrides_options() {
    let transport = ScriptedTransport::new(vec![Script::redirect(302, "/b"), Script::ok(b"")]);
    let client = client(transport.clone());
    let response = client
        .execute_with(
            get("http://example.com/a"),
            RequestOptions { follow_redirects: false, follow_ssl_redirects: false },
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(response.code(), 302);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn new_builder_snapshots_interceptors() {
    let transport = ScriptedTransport::new(vec![Script::ok(b""), Script::ok(b"")]);
    let mut builder = HttpClient::builder();
    builder.transport(transport.clone());
    let base = builder.build().unwrap();

    let mut derived_builder = base.new_builder();
    derived_builder.add_interceptor(Arc::new(TaggingInterceptor));
    let derived = derived_builder.build().unwrap();

    base.execute(get("http://example.com/")).await.unwrap();
    assert_eq!(transport.requests()[0].header("X-Tagged"), None);

    derived.execute(get("http://example.com/")).await.unwrap();
    assert_eq!(transport.requests()[1].header("X-Tagged"), Some("1"));
}
