//! The seam between the API client and the network.
//!
//! [`Client`](crate::Client) never talks to `reqwest` directly; it asks a
//! [`Transport`] for the body of a GET request. [`HttpTransport`] is the real
//! thing, `MockTransport` (behind the `mock` feature) serves canned bodies
//! and records every URL it was asked for.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;

/// Performs authenticated, read-only GET requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` with `Authorization: Bearer <token>` and return the body.
    ///
    /// Non-2xx statuses and empty bodies are errors.
    async fn get(&self, url: &str, token: &str) -> Result<String>;
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}
impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shelfnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, token: &str) -> Result<String> {
        let response = self
            .inner
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .or_raise(|| ErrorKind::Transport(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Http { status: status.as_u16(), url: url.to_string() });
        }
        let body = response.text().await.or_raise(|| ErrorKind::Transport(url.to_string()))?;
        if body.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyBody(url.to_string()));
        }
        Ok(body)
    }
}

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockTransport;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::Transport;
    use crate::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    enum Canned {
        Body(String),
        Status(u16),
    }

    /// In-memory [`Transport`] for tests.
    ///
    /// Responses are keyed by the full URL. Unknown URLs answer with a 404.
    /// Every request is recorded, including the bearer token it carried.
    ///
    /// ```
    /// use shelfnote_remote::transport::{MockTransport, Transport};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let transport = MockTransport::default()
    ///     .with_body("https://abs.example.org/api/me", r#"{"bookmarks":[]}"#);
    /// let body = transport.get("https://abs.example.org/api/me", "token").await.unwrap();
    /// assert_eq!(body, r#"{"bookmarks":[]}"#);
    /// assert_eq!(transport.call_count().await, 1);
    /// # }
    /// ```
    #[derive(Default)]
    pub struct MockTransport {
        responses: HashMap<String, Canned>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockTransport {
        /// Answer `url` with a 200 and `body`.
        pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.responses.insert(url.into(), Canned::Body(body.into()));
            self
        }

        /// Answer `url` with an error status.
        pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
            self.responses.insert(url.into(), Canned::Status(status));
            self
        }

        /// Number of requests made so far.
        pub async fn call_count(&self) -> usize {
            self.calls.lock().await.len()
        }

        /// URLs requested so far, in order.
        pub async fn urls(&self) -> Vec<String> {
            self.calls.lock().await.iter().map(|(url, _)| url.clone()).collect()
        }

        /// Bearer tokens sent so far, in order.
        pub async fn tokens(&self) -> Vec<String> {
            self.calls.lock().await.iter().map(|(_, token)| token.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(&self, url: &str, token: &str) -> Result<String> {
            self.calls.lock().await.push((url.to_string(), token.to_string()));
            match self.responses.get(url) {
                Some(Canned::Body(body)) if body.trim().is_empty() => {
                    exn::bail!(ErrorKind::EmptyBody(url.to_string()))
                },
                Some(Canned::Body(body)) => Ok(body.clone()),
                Some(Canned::Status(status)) => exn::bail!(ErrorKind::Http { status: *status, url: url.to_string() }),
                None => exn::bail!(ErrorKind::Http { status: 404, url: url.to_string() }),
            }
        }
    }
}
