//! HTTP implementation of the backend traits over reqwest.

use async_trait::async_trait;
use khata_core::{Customer, InventoryItem, LedgerEntry, SaleCommitRequest};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::api::{CatalogApi, LedgerApi, SaleApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{error_from_response, routes, LedgerBatch, LedgerReceipt, SaleReceipt};

/// Talks to the shop backend over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Builds a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends path segments to the base URL. Each segment is
    /// percent-encoded, so an id cannot add segments, a query or a fragment.
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.url(segments)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    async fn post<T, B>(&self, segments: &[&str], body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(error_from_response(status.as_u16(), &text));
        }

        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl SaleApi for HttpBackend {
    async fn commit_sale(&self, request: &SaleCommitRequest) -> ClientResult<SaleReceipt> {
        self.post(&[routes::SALES], request).await
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn fetch_inventory(&self) -> ClientResult<Vec<InventoryItem>> {
        self.get(&[routes::INVENTORY]).await
    }

    async fn fetch_customers(&self) -> ClientResult<Vec<Customer>> {
        self.get(&[routes::CUSTOMERS]).await
    }
}

#[async_trait]
impl LedgerApi for HttpBackend {
    async fn record_entries(&self, entries: &[LedgerEntry]) -> ClientResult<usize> {
        let batch = LedgerBatch {
            entries: entries.to_vec(),
        };
        let receipt: LedgerReceipt = self.post(&[routes::LEDGER], &batch).await?;
        Ok(receipt.recorded)
    }

    async fn customer_ledger(&self, customer_id: &str) -> ClientResult<Vec<LedgerEntry>> {
        self.get(&routes::customer_ledger(customer_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let mut config = ClientConfig::default();
        config.api.base_url = "https://shop.example.com/api/".to_string();

        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(
            backend.url(&[routes::SALES]).unwrap().as_str(),
            "https://shop.example.com/api/sales"
        );
        assert_eq!(
            backend.url(&routes::customer_ledger("c-1")).unwrap().as_str(),
            "https://shop.example.com/api/customers/c-1/ledger"
        );
    }

    #[test]
    fn test_customer_id_encoded_as_one_segment() {
        let mut config = ClientConfig::default();
        config.api.base_url = "https://shop.example.com/api".to_string();
        let backend = HttpBackend::new(&config).unwrap();

        let url = backend.url(&routes::customer_ledger("a/b?c#d e%")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://shop.example.com/api/customers/a%2Fb%3Fc%23d%20e%25/ledger"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path_segments().unwrap().count(), 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ClientConfig::default();
        config.api.base_url = "shop".to_string();
        assert!(HttpBackend::new(&config).is_err());
    }
}
