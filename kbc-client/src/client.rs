use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::error::Result;
use crate::http::{build_http_client, execute_with_retry, handle_empty_response, handle_response};
use crate::models::FormFields;
use crate::storage_api::StorageApi;

/// [`StorageApi`] over HTTP. Requests are authenticated with the configured Storage API token.
#[derive(Debug, Clone)]
pub struct KbcClient {
    client: Client,
    config: ClientConfig,
}

impl KbcClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn builder(host: impl Into<String>, token: impl Into<String>) -> KbcClientBuilder {
        KbcClientBuilder::new(host, token)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn storage_url(&self, path: &str) -> Result<Url> {
        Ok(self.config.storage_url.join(path)?)
    }

    fn import_url(&self, path: &str) -> Result<Url> {
        Ok(self.config.import_url.join(path)?)
    }
}

// Multipart bodies are consumed on send and creates are not idempotent, so only GET goes through
// `execute_with_retry`.
impl StorageApi for KbcClient {
    #[instrument(skip(self, fields))]
    async fn post_to_file_import<T>(&self, path: &str, fields: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.import_url(path)?;
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self.client.post(url).multipart(form).send().await?;
        handle_response(path, response).await
    }

    #[instrument(skip(self, form))]
    async fn post_to_storage<T>(&self, path: &str, form: FormFields) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.storage_url(path)?;

        let response = self.client.post(url).form(&form).send().await?;
        handle_response(path, response).await
    }

    #[instrument(skip(self))]
    async fn get_from_storage<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.storage_url(path)?;

        let response = execute_with_retry(&self.config, || self.client.get(url.clone()).send())
            .await?;
        handle_response(path, response).await
    }

    #[instrument(skip(self))]
    async fn delete_from_storage(&self, path: &str) -> Result<()> {
        let url = self.storage_url(path)?;

        let response = self.client.delete(url).send().await?;
        handle_empty_response(response).await
    }
}

pub struct KbcClientBuilder {
    config_builder: ClientConfigBuilder,
}

impl KbcClientBuilder {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            config_builder: ClientConfig::builder(host, token),
        }
    }

    pub fn import_url(mut self, url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.import_url(url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.connect_timeout(timeout);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config_builder = self.config_builder.max_retries(retries);
        self
    }

    pub fn retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.config_builder = self.config_builder.retry_delays(base, max);
        self
    }

    pub fn build(self) -> Result<KbcClient> {
        let config = self.config_builder.build()?;
        KbcClient::new(config)
    }
}
