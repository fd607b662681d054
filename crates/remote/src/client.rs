use crate::error::{ErrorKind, Result};
use crate::models::{ItemList, LibraryItem, Me};
use crate::transport::TransportHandle;
use exn::ResultExt;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Read-only client for the handful of endpoints the importer needs.
///
/// Every request carries the configured API key as a bearer token. Requests
/// are issued one at a time; the client holds no state between them.
#[derive(Clone)]
pub struct Client {
    transport: TransportHandle,
    base_url: String,
    token: String,
}

impl Client {
    /// `host` is the server's host name as entered in the settings
    /// (`abs.example.org`). A host that already carries an `http://` or
    /// `https://` scheme is used as-is.
    pub fn new(transport: TransportHandle, host: &str, token: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url(host),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/libraries/{library}/items?sort=media.metadata.title`
    #[instrument(skip(self))]
    pub async fn library_items(&self, library: &str) -> Result<Vec<LibraryItem>> {
        let url = format!("{}/api/libraries/{library}/items?sort=media.metadata.title", self.base_url);
        let list: ItemList = self.get_json(&url).await?;
        Ok(list.results)
    }

    /// `GET /api/me`: the user's bookmarks and listening progress.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Me> {
        let url = format!("{}/api/me", self.base_url);
        self.get_json(&url).await
    }

    /// `GET /api/items/{id}?sort=publishedDate`, including podcast episodes.
    #[instrument(skip(self))]
    pub async fn item(&self, id: &str) -> Result<LibraryItem> {
        let url = format!("{}/api/items/{id}?sort=publishedDate", self.base_url);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url, "GET");
        let body = self.transport.get(url, &self.token).await?;
        serde_json::from_str(&body).or_raise(|| ErrorKind::Decode(url.to_string()))
    }
}

fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
