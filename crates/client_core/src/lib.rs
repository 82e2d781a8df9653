use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use catalog::{CatalogStore, FilterAction};
use reqwest::Client;
use shared::{domain::CatalogItem, error::ApiError, protocol::TUTORIALS_ROUTE};
use tracing::info;
use url::Url;

pub mod error;

pub use error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where the catalog comes from. One call per view mount.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<CatalogItem>>;
}

/// Fetches the catalog from the academy HTTP API.
#[derive(Clone)]
pub struct HttpCatalogSource {
    http: Client,
    base_url: Url,
}

impl HttpCatalogSource {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ClientError::Transport {
                url: server_url.to_string(),
                source,
            })?;
        Self::with_client(http, server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let mut base_url =
            Url::parse(server_url).map_err(|source| ClientError::InvalidServerUrl {
                url: server_url.to_string(),
                source,
            })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn tutorials_url(&self) -> Result<Url, ClientError> {
        let relative = TUTORIALS_ROUTE.trim_start_matches('/');
        self.base_url
            .join(relative)
            .map_err(|source| ClientError::InvalidServerUrl {
                url: self.base_url.to_string(),
                source,
            })
    }

    pub async fn get_tutorials(&self) -> Result<Vec<CatalogItem>, ClientError> {
        let url = self.tutorials_url()?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|source| ClientError::Transport {
                    url: url.to_string(),
                    source,
                })?;
            let api_error = serde_json::from_str::<ApiError>(&body).ok();
            let message = api_error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or(body);
            return Err(ClientError::Server {
                status,
                message,
                api_error,
            });
        }

        response
            .json()
            .await
            .map_err(|source| ClientError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_items(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.get_tutorials().await?)
    }
}

/// The tutorials page: owns the catalog store and fetches once on mount.
pub struct CatalogView<S: CatalogSource> {
    source: S,
    store: CatalogStore,
    mounted: bool,
}

impl<S: CatalogSource> CatalogView<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            store: CatalogStore::new(),
            mounted: false,
        }
    }

    /// Loads the catalog on the first call; later calls are no-ops. A
    /// failed fetch leaves the view with an empty catalog.
    pub async fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.store.begin_loading();
        let result = self.source.fetch_items().await;
        self.store.finish_loading(result);
        info!(items = self.store.items().len(), "tutorials view mounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn dispatch(&mut self, action: FilterAction) {
        self.store.dispatch(action);
    }

    pub fn visible(&self) -> Vec<&CatalogItem> {
        self.store.visible()
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
