//! Request transport.

#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;
use std::time::Instant;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result, ServiceError};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const STREAM_CLIENT: &str = concat!("stream-feeds-", env!("CARGO_PKG_VERSION"));
const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// One API call, relative to the API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Feed signature sent as the `Authorization` header.
    pub authorization: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> ApiRequest {
        ApiRequest {
            method,
            path: path.into(),
            query: vec![],
            body: None,
            authorization: None,
        }
    }
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> ApiRequest {
        self.query.push((key.into(), value.into()));
        self
    }
    pub fn body(mut self, body: Vec<u8>) -> ApiRequest {
        self.body = Some(body);
        self
    }
    pub fn authorization(mut self, authorization: Option<String>) -> ApiRequest {
        self.authorization = authorization;
        self
    }
}

/// Sends requests and hands back the response body.
///
/// Non-2xx responses must be reported as [`Error::Service`] and network
/// failures as [`Error::Transport`].
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<HttpTransport> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .gzip(true)
            .timeout(config.timeout())
            .build()?;
        Ok(HttpTransport {
            client,
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            authorization,
        } = request;

        let mut builder = self
            .client
            .request(method.clone(), format!("{}{path}", self.base_url))
            .query(&[("api_key", self.api_key.as_str())])
            .query(&query)
            .header(header::CONTENT_TYPE, APPLICATION_JSON)
            .header("X-Stream-Client", STREAM_CLIENT);
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        debug!(target: "stream", %method, %path, "sending request");
        let started = Instant::now();
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let mut error = ServiceError::from_response(status.as_u16(), &bytes);
            if error.duration.is_none() {
                error.duration = Some(format!("{}ms", started.elapsed().as_millis()));
            }
            warn!(
                target: "stream",
                %method,
                %path,
                status = error.status_code,
                exception = %error.exception,
                detail = %error.detail,
                "request failed"
            );
            return Err(Error::Service(error));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use reqwest::Method;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::{ApiRequest, HttpTransport, STREAM_CLIENT, Transport};
    use crate::config::ClientConfig;
    use crate::error::{Error, ServiceError};

    /// Answer one request with a canned response and hand back the request
    /// head as the server saw it.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> Result<(String, JoinHandle<Result<String>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}/api/v1.0/", listener.local_addr()?);
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await?;
            let mut head = Vec::<u8>::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await?;
            Ok::<_, anyhow::Error>(String::from_utf8_lossy(&head).to_ascii_lowercase())
        });
        Ok((base_url, server))
    }

    fn transport(base_url: String) -> Result<HttpTransport> {
        let mut config = ClientConfig::new("key", "secret");
        config.base_url = Some(base_url);
        Ok(HttpTransport::new(&config)?)
    }

    #[test]
    fn request_builder() {
        let request = ApiRequest::new(Method::DELETE, "feed/user/1/abc/")
            .query("foreign_id", "1")
            .authorization(Some("user1 token".into()));
        assert_eq!(request.path, "feed/user/1/abc/");
        assert_eq!(request.query, vec![("foreign_id".to_string(), "1".to_string())]);
        assert_eq!(request.body, None);
        assert_eq!(request.authorization.as_deref(), Some("user1 token"));
    }

    #[test]
    fn transport_uses_configured_base_url() -> Result<()> {
        let mut config = ClientConfig::new("key", "secret");
        config.location = Some("us-east".into());
        let transport = HttpTransport::new(&config)?;
        assert_eq!(
            transport.base_url(),
            "https://us-east-api.getstream.io/api/v1.0/"
        );
        Ok(())
    }

    #[tokio::test]
    async fn success_returns_body_and_sends_client_headers() -> Result<()> {
        let (base_url, server) = serve_once("200 OK", r#"{"results": []}"#).await?;
        let request = ApiRequest::new(Method::GET, "feed/user/1/")
            .query("limit", "5")
            .authorization(Some("user1 token".into()));

        let body = transport(base_url)?.send(request).await?;
        assert_eq!(body, br#"{"results": []}"#);

        let head = server.await??;
        assert!(
            head.starts_with("get /api/v1.0/feed/user/1/?api_key=key&limit=5 http/1.1\r\n"),
            "{head}"
        );
        assert!(head.contains("\r\nauthorization: user1 token\r\n"), "{head}");
        assert!(head.contains("\r\ncontent-type: application/json\r\n"), "{head}");
        assert!(
            head.contains(&format!("\r\nx-stream-client: {STREAM_CLIENT}\r\n")),
            "{head}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn error_response_becomes_service_error() -> Result<()> {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            r#"{"code": 4, "detail": "verb is required", "duration": "3ms", "exception": "InputException", "status_code": 400}"#,
        )
        .await?;
        let result = transport(base_url)?
            .send(ApiRequest::new(Method::DELETE, "feed/user/1/abc/"))
            .await;
        server.await??;

        let error = match result {
            Err(Error::Service(error)) => error,
            other => panic!("expected a service error, got {other:?}"),
        };
        assert_eq!(
            error,
            ServiceError {
                code: 4,
                status_code: 400,
                detail: "verb is required".into(),
                duration: Some("3ms".into()),
                exception: "InputException".into(),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_error_response_fills_status_and_duration() -> Result<()> {
        let (base_url, server) = serve_once("500 Internal Server Error", "").await?;
        let result = transport(base_url)?
            .send(ApiRequest::new(Method::GET, "feed/user/1/"))
            .await;
        server.await??;

        let error = match result {
            Err(Error::Service(error)) => error,
            other => panic!("expected a service error, got {other:?}"),
        };
        assert_eq!(error.status_code, 500);
        assert_eq!(error.code, 0);
        assert_eq!(error.detail, "");
        assert_eq!(error.exception, "");
        let duration = error.duration.unwrap_or_default();
        assert!(duration.ends_with("ms"), "{duration}");
        assert!(duration.trim_end_matches("ms").parse::<u128>().is_ok(), "{duration}");
        Ok(())
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() -> Result<()> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}/api/v1.0/", listener.local_addr()?);
        drop(listener);

        let result = transport(base_url)?
            .send(ApiRequest::new(Method::GET, "feed/user/1/"))
            .await;
        assert!(matches!(result, Err(Error::Transport(_))), "{result:?}");
        Ok(())
    }
}
