use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Credential placement for provider requests.
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    None,
    /// Appended as a query parameter, e.g. `apikey=...`.
    QueryParam { name: String, value: String },
    Header { name: String, value: String },
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::QueryParam { name, .. } => write!(f, "QueryParam({name}=<redacted>)"),
            Self::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
        }
    }
}

/// GET request used by adapter transport calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_auth(self, auth: &HttpAuth) -> Self {
        match auth {
            HttpAuth::None => self,
            HttpAuth::QueryParam { name, value } => self.with_query(name.clone(), value.clone()),
            HttpAuth::Header { name, value } => self.with_header(name.clone(), value.clone()),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Full URL with percent-encoded query string.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.url)
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// HTTP response returned by an adapter transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("vestval/", env!("CARGO_PKG_VERSION")))
                    .cookie_store(true)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(Duration::from_millis(request.timeout_ms));
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else if e.is_builder() {
                    HttpError::non_retryable(format!("invalid request: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug)]
struct Route {
    url_fragment: String,
    replies: VecDeque<Result<HttpResponse, HttpError>>,
}

/// Offline transport that replays canned replies.
///
/// Replies are matched by substring of the full URL, query included; the
/// first matching route wins. Each route
/// replays its replies in order and repeats the last one once exhausted.
/// Unmatched requests get a `404`. Every request is recorded.
#[derive(Debug, Default)]
pub struct StaticHttpClient {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StaticHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url_fragment: impl Into<String>, response: HttpResponse) -> Self {
        self.push(url_fragment.into(), Ok(response))
    }

    pub fn respond_json(self, url_fragment: impl Into<String>, body: impl Into<String>) -> Self {
        self.respond(url_fragment, HttpResponse::ok_json(body))
    }

    pub fn fail(self, url_fragment: impl Into<String>, error: HttpError) -> Self {
        self.push(url_fragment.into(), Err(error))
    }

    fn push(self, url_fragment: String, reply: Result<HttpResponse, HttpError>) -> Self {
        {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            match routes
                .iter_mut()
                .find(|route| route.url_fragment == url_fragment)
            {
                Some(route) => route.replies.push_back(reply),
                None => routes.push(Route {
                    url_fragment,
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reply_for(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let url = request.full_url();
        let Some(route) = routes
            .iter_mut()
            .find(|route| url.contains(&route.url_fragment))
        else {
            return Ok(HttpResponse::with_status(404, "{}"));
        };

        if route.replies.len() > 1 {
            if let Some(reply) = route.replies.pop_front() {
                return reply;
            }
        }
        route
            .replies
            .front()
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::with_status(404, "{}")))
    }
}

impl HttpClient for StaticHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let reply = self.reply_for(&request);
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(request);
            reply
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_auth_is_appended_and_encoded() {
        let request = HttpRequest::get("https://example.test/query")
            .with_query("symbol", "BRK.B")
            .with_query("note", "a b")
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: String::from("demo"),
            });

        assert_eq!(request.query_value("apikey"), Some("demo"));
        assert_eq!(
            request.full_url(),
            "https://example.test/query?symbol=BRK.B&note=a%20b&apikey=demo"
        );
    }

    #[test]
    fn header_auth_lowercases_name() {
        let request = HttpRequest::get("https://example.test/quote").with_auth(&HttpAuth::Header {
            name: String::from("X-API-Key"),
            value: String::from("demo"),
        });

        assert_eq!(
            request.headers.get("x-api-key").map(String::as_str),
            Some("demo")
        );
    }

    #[test]
    fn auth_debug_output_redacts_secret() {
        let auth = HttpAuth::QueryParam {
            name: String::from("apikey"),
            value: String::from("secret-key"),
        };
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret-key"));
    }

    #[tokio::test]
    async fn static_client_replays_in_order_then_repeats_last() {
        let client = StaticHttpClient::new()
            .respond("/chart/", HttpResponse::with_status(503, "busy"))
            .respond_json("/chart/", "{\"ok\":true}");

        let first = client
            .execute(HttpRequest::get("https://host/v8/finance/chart/META"))
            .await
            .expect("reply");
        let second = client
            .execute(HttpRequest::get("https://host/v8/finance/chart/META"))
            .await
            .expect("reply");
        let third = client
            .execute(HttpRequest::get("https://host/v8/finance/chart/META"))
            .await
            .expect("reply");
        let unmatched = client
            .execute(HttpRequest::get("https://host/other"))
            .await
            .expect("reply");

        assert_eq!(first.status, 503);
        assert!(second.is_success());
        assert_eq!(second, third);
        assert_eq!(unmatched.status, 404);
        assert_eq!(client.requests().len(), 4);
    }
}
