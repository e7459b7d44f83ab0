use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_STACK_HOST: &str = "connection.keboola.com";

pub const HOST_ENV_VAR: &str = "KBC_STORAGE_API_HOST";
pub const TOKEN_ENV_VAR: &str = "KBC_STORAGE_API_TOKEN";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base for `storage/...` paths, always ending in `/v2/`.
    pub storage_url: Url,
    /// Base for file import paths such as `upload-file`.
    pub import_url: Url,
    pub token: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let storage_url = base_url(&host.into())?;
        let import_url = derive_import_url(&storage_url)?;
        let mut storage_url = storage_url;
        storage_url.set_path(&format!("{}v2/", storage_url.path()));

        Ok(Self {
            storage_url,
            import_url,
            token: token.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(10),
        })
    }

    /// Reads the stack host and token from `KBC_STORAGE_API_HOST` and `KBC_STORAGE_API_TOKEN`.
    /// The host falls back to [`DEFAULT_STACK_HOST`]; the token is required.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var(HOST_ENV_VAR).unwrap_or_else(|_| DEFAULT_STACK_HOST.to_string());
        let token = std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| Error::InvalidConfig(format!("{TOKEN_ENV_VAR} is not set")))?;
        ClientConfig::builder(host, token).build()
    }

    pub fn builder(host: impl Into<String>, token: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(host, token)
    }

    /// Linear backoff for the given retry attempt (1-based), capped at `retry_max_delay`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        (self.retry_base_delay * attempt).min(self.retry_max_delay)
    }
}

fn base_url(host: &str) -> Result<Url> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::InvalidConfig("stack host is empty".to_string()));
    }
    let base = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    let mut url = Url::parse(&base)?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

// connection.<stack> serves the Storage API, import.<stack> serves file uploads
fn derive_import_url(storage_url: &Url) -> Result<Url> {
    let mut import_url = storage_url.clone();
    if let Some(rest) = storage_url
        .host_str()
        .and_then(|h| h.strip_prefix("connection."))
    {
        import_url
            .set_host(Some(&format!("import.{rest}")))
            .map_err(Error::InvalidUrl)?;
    }
    Ok(import_url)
}

pub struct ClientConfigBuilder {
    host: String,
    token: String,
    import_url: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
    retry_max_delay: Duration,
}

impl ClientConfigBuilder {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            import_url: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(10),
        }
    }

    /// Overrides the file import URL derived from the stack host.
    pub fn import_url(mut self, url: impl Into<String>) -> Self {
        self.import_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        if self.token.is_empty() {
            return Err(Error::InvalidConfig("Storage API token is empty".to_string()));
        }
        let mut config = ClientConfig::new(self.host, self.token)?;
        if let Some(import_url) = self.import_url {
            config.import_url = base_url(&import_url)?;
        }
        config.timeout = self.timeout;
        config.connect_timeout = self.connect_timeout;
        config.max_retries = self.max_retries;
        config.retry_base_delay = self.retry_base_delay;
        config.retry_max_delay = self.retry_max_delay;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_storage_and_import_urls_from_stack_host() {
        let config = ClientConfig::builder("connection.eu-central-1.keboola.com", "token")
            .build()
            .unwrap();
        assert_eq!(
            config.storage_url.as_str(),
            "https://connection.eu-central-1.keboola.com/v2/"
        );
        assert_eq!(
            config.import_url.as_str(),
            "https://import.eu-central-1.keboola.com/"
        );
    }

    #[test]
    fn keeps_explicit_scheme_and_path() {
        let config = ClientConfig::builder("http://localhost:8080/kbc", "token")
            .build()
            .unwrap();
        assert_eq!(config.storage_url.as_str(), "http://localhost:8080/kbc/v2/");
        // no connection. prefix, so uploads go to the same host
        assert_eq!(config.import_url.as_str(), "http://localhost:8080/kbc/");
    }

    #[test]
    fn explicit_import_url_wins() {
        let config = ClientConfig::builder(DEFAULT_STACK_HOST, "token")
            .import_url("https://uploads.example.com/import")
            .build()
            .unwrap();
        assert_eq!(
            config.import_url.as_str(),
            "https://uploads.example.com/import/"
        );
    }

    #[test]
    fn rejects_empty_token_and_host() {
        assert!(matches!(
            ClientConfig::builder(DEFAULT_STACK_HOST, "").build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::builder("  ", "token").build(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn retry_delay_is_linear_and_capped() {
        let config = ClientConfig::builder(DEFAULT_STACK_HOST, "token")
            .retry_delays(Duration::from_millis(400), Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(config.retry_delay(1), Duration::from_millis(400));
        assert_eq!(config.retry_delay(2), Duration::from_millis(800));
        assert_eq!(config.retry_delay(3), Duration::from_secs(1));
    }
}
