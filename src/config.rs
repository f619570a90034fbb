use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.getstream.io/api/v1.0/";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_secret: SecretString,
    pub app_id: String,
    /// Region prefix, e.g. `us-east`.
    pub location: Option<String>,
    /// Overrides the URL derived from `location`.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// Fail decoding on malformed `to` entries instead of skipping them.
    pub strict_to_entries: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: SecretString::from(String::new()),
            app_id: String::new(),
            location: None,
            base_url: None,
            timeout_ms: 10_000,
            strict_to_entries: false,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> ClientConfig {
        ClientConfig {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            ..Default::default()
        }
    }

    pub fn from_toml_str(input: &str) -> Result<ClientConfig> {
        let config: ClientConfig =
            toml::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<ClientConfig> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to read {}: {e}", path.display())))?;
        ClientConfig::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key is required".into()));
        }
        if self.api_secret.expose_secret().is_empty() {
            return Err(Error::Config("api_secret is required".into()));
        }
        Ok(())
    }

    /// API root with a trailing slash; request paths are appended to it.
    pub fn base_url(&self) -> String {
        let url = match (&self.base_url, &self.location) {
            (Some(base_url), _) => base_url.clone(),
            (None, Some(location)) if !location.is_empty() => {
                format!("https://{location}-api.getstream.io/api/v1.0/")
            }
            _ => DEFAULT_BASE_URL.to_string(),
        };
        if url.ends_with('/') {
            url
        } else {
            format!("{url}/")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use secrecy::ExposeSecret;

    use super::ClientConfig;
    use crate::Error;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("key", "secret");
        assert_eq!(config.base_url(), "https://api.getstream.io/api/v1.0/");
        assert_eq!(config.timeout().as_secs(), 10);
        assert!(!config.strict_to_entries);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn location_and_override() {
        let mut config = ClientConfig::new("key", "secret");
        config.location = Some("us-east".into());
        assert_eq!(
            config.base_url(),
            "https://us-east-api.getstream.io/api/v1.0/"
        );
        config.base_url = Some("http://localhost:8000/api/v1.0".into());
        assert_eq!(config.base_url(), "http://localhost:8000/api/v1.0/");
    }

    #[test]
    fn parse_toml() -> Result<()> {
        let config = ClientConfig::from_toml_str(
            r#"
            api_key = "abc"
            api_secret = "def"
            app_id = "1"
            location = "eu-west"
            timeout_ms = 2500
            strict_to_entries = true
            "#,
        )?;
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.api_secret.expose_secret(), "def");
        assert_eq!(config.app_id, "1");
        assert_eq!(config.timeout().as_millis(), 2500);
        assert!(config.strict_to_entries);
        Ok(())
    }

    #[test]
    fn missing_credentials() {
        assert!(matches!(
            ClientConfig::from_toml_str("api_secret = \"x\""),
            Err(Error::Config(msg)) if msg.contains("api_key")
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("api_key = \"x\""),
            Err(Error::Config(msg)) if msg.contains("api_secret")
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("timeout_ms = \"soon\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "api_key = \"k\"\napi_secret = \"s\"")?;
        let config = ClientConfig::from_file(file.path())?;
        assert_eq!(config.api_key, "k");

        assert!(ClientConfig::from_file(file.path().with_extension("missing")).is_err());
        Ok(())
    }
}
