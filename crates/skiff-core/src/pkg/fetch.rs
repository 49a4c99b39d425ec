//! Delivery-network content fetching.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use reqwest::Client;

use crate::error::{Error, Result};

/// Fetches registration-format package sources from the delivery network.
///
/// Only the registration strategy fetches package content itself; under the
/// direct strategy the engine's native loader does its own fetching.
pub trait RemoteFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String>>;
}

/// reqwest-backed fetcher used when the embedder supplies none.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("skiff/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String>> {
        Box::pin(async move {
            tracing::debug!(url, "fetching delivery-network artifact");
            let response = self.http.get(url).send().await?;

            if response.status() == reqwest::StatusCode::NOT_FOUND
                || response.status() == reqwest::StatusCode::GONE
            {
                return Err(Error::not_found(url));
            }
            if !response.status().is_success() {
                return Err(Error::Network(format!(
                    "Delivery network returned status {} for {url}",
                    response.status()
                )));
            }

            Ok(response.text().await?)
        })
    }
}
