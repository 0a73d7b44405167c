//! Fetch-through to the protected origin.
//!
//! Trusted requests are re-issued with the same method, headers and
//! streamed body; the origin's response is handed back untouched.

use axum::{
    body::Body,
    http::{HeaderValue, Request, Uri, Version, header::HOST, uri::PathAndQuery},
    response::Response,
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};

use tollgate_common::GateError;

/// Upstream origin client
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    origin: Uri,
    preserve_host: bool,
}

impl UpstreamClient {
    /// `origin` must be an absolute `http://` URI (validated by config).
    pub fn new(origin: Uri, preserve_host: bool) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            origin,
            preserve_host,
        }
    }

    /// Forward a request and return the origin's response verbatim.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response, GateError> {
        let (mut parts, body) = request.into_parts();

        let uri = self.upstream_uri(&parts.uri)?;

        if self.preserve_host {
            // HTTP/2 clients send :authority instead of Host.
            if !parts.headers.contains_key(HOST) {
                if let Some(authority) = parts.uri.authority() {
                    if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                        parts.headers.insert(HOST, value);
                    }
                }
            }
        } else {
            parts.headers.remove(HOST);
        }

        tracing::debug!(
            method = %parts.method,
            upstream = %uri,
            "Forwarding to upstream"
        );

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        let outbound = Request::from_parts(parts, body);

        let response = self.client.request(outbound).await.map_err(|e| {
            tracing::error!(error = %e, origin = %self.origin, "Upstream request failed");
            GateError::Upstream(e.to_string())
        })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Origin scheme and authority, origin base path, then the inbound path and query.
    fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, GateError> {
        let base = self.origin.path().trim_end_matches('/');
        let tail = inbound.path_and_query().map(PathAndQuery::as_str).unwrap_or("/");

        let path_and_query = format!("{}{}", base, tail);

        let mut parts = self.origin.clone().into_parts();
        parts.path_and_query = Some(
            path_and_query
                .parse()
                .map_err(|e| GateError::InvalidInput(format!("bad upstream path: {}", e)))?,
        );

        Uri::from_parts(parts).map_err(|e| GateError::Internal(format!("bad upstream uri: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(origin: &str, preserve_host: bool) -> UpstreamClient {
        UpstreamClient::new(origin.parse().unwrap(), preserve_host)
    }

    #[test]
    fn test_upstream_uri_joins_paths() {
        let root = client("http://10.0.0.5:3000", true);
        assert_eq!(
            root.upstream_uri(&"/a/b?c=1".parse().unwrap()).unwrap(),
            "http://10.0.0.5:3000/a/b?c=1"
        );

        let based = client("http://10.0.0.5:3000/app/", true);
        assert_eq!(
            based.upstream_uri(&"/a?x=y".parse().unwrap()).unwrap(),
            "http://10.0.0.5:3000/app/a?x=y"
        );
        assert_eq!(
            based.upstream_uri(&"http://gate.example/".parse().unwrap()).unwrap(),
            "http://10.0.0.5:3000/app/"
        );
    }

    #[tokio::test]
    async fn test_forward_is_verbatim() {
        let origin = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items/7"))
            .and(query_param("dry_run", "true"))
            .and(header("x-custom", "kept"))
            .and(body_string("payload"))
            .respond_with(
                ResponseTemplate::new(418)
                    .insert_header("x-origin", "teapot")
                    .set_body_string("short and stout"),
            )
            .expect(1)
            .mount(&origin)
            .await;

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/items/7?dry_run=true")
            .header("x-custom", "kept")
            .body(Body::from("payload"))
            .unwrap();

        let response = client(&origin.uri(), false).forward(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()["x-origin"], "teapot");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"short and stout");
    }

    #[tokio::test]
    async fn test_host_handling() {
        let origin = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&origin)
            .await;

        for preserve_host in [true, false] {
            let request = Request::builder()
                .uri("/")
                .header(HOST, "gate.example")
                .body(Body::empty())
                .unwrap();
            client(&origin.uri(), preserve_host).forward(request).await.unwrap();
        }

        let requests = origin.received_requests().await.unwrap();
        assert_eq!(requests[0].headers["host"], "gate.example");
        assert_ne!(requests[1].headers["host"], "gate.example");
    }

    #[tokio::test]
    async fn test_unreachable_origin() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let err = client(&format!("http://127.0.0.1:{}", port), true)
            .forward(request)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Upstream(_)));
    }
}
