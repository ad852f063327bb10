use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use miette::Result;
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, SerDeError, WeaverError};

/// Top-level configuration for the media editing components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Media node schema options.
    pub schema: SchemaConfig,
    /// Link destination policy.
    pub links: LinkPolicyConfig,
    /// Upload pipeline options.
    pub upload: UploadConfig,
}

impl MediaConfig {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self> {
        loader
            .load()
            .await
            .map_err(|e| miette::Report::new(e).wrap_err("failed to load configuration"))
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<()> {
        saver
            .save(self)
            .await
            .map_err(|e| miette::Report::new(e).wrap_err("failed to save configuration"))
    }
}

/// Options for the linkable media node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Accept `data:` image sources when parsing HTML.
    pub allow_base64: bool,
    /// Attributes added to every serialized `<img>`. Node attributes win on conflict.
    pub html_attributes: BTreeMap<String, String>,
}

/// Protocol and domain rules for link destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPolicyConfig {
    /// Scheme prepended to destinations typed without one.
    pub default_protocol: String,
    /// Schemes a destination may use.
    pub allowed_protocols: Vec<String>,
    /// Schemes that are always rejected, even if listed as allowed.
    pub disallowed_protocols: Vec<String>,
    /// Hosts rejected for explicit link attachment.
    pub denied_domains: Vec<String>,
    /// Hosts never auto-linked while typing.
    pub autolink_denied_domains: Vec<String>,
}

impl Default for LinkPolicyConfig {
    fn default() -> Self {
        Self {
            default_protocol: "https".to_owned(),
            allowed_protocols: vec!["http".to_owned(), "https".to_owned()],
            disallowed_protocols: ["ftp", "file", "mailto", "javascript", "vbscript", "data"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            denied_domains: vec![
                "example-phishing.com".to_owned(),
                "malicious-site.net".to_owned(),
            ],
            autolink_denied_domains: vec!["example-phishing.com".to_owned()],
        }
    }
}

/// Upload pipeline options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Declared content types accepted for upload.
    pub accepted_types: Vec<String>,
    /// Upload endpoint for the HTTP transport.
    pub endpoint: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_types: ["image/png", "image/jpeg", "image/gif", "image/webp"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            endpoint: None,
        }
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = core::result::Result<MediaConfig, WeaverError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(
        &self,
        config: &MediaConfig,
    ) -> impl Future<Output = core::result::Result<(), WeaverError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`MediaConfig`] data is serialized according to the file extension,
    /// either `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }

    fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

impl Loader for FileStore {
    async fn load(&self) -> core::result::Result<MediaConfig, WeaverError> {
        match self.extension() {
            Some("json") => {
                let source = std::fs::read_to_string(&self.path)?;
                serde_json::from_str(&source)
                    .map_err(|e| ParseError::json(self.display_name(), source, e).into())
            }
            Some("toml") => {
                let source = std::fs::read_to_string(&self.path)?;
                toml::from_str(&source).map_err(|e| {
                    ParseError::toml(self.display_name(), source, e)
                        .with_advice("check the field against the documented defaults")
                        .into()
                })
            }
            other => Err(WeaverError::UnsupportedFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &MediaConfig) -> core::result::Result<(), WeaverError> {
        let rendered = match self.extension() {
            Some("json") => serde_json::to_string_pretty(config).map_err(SerDeError::from)?,
            Some("toml") => toml::to_string_pretty(config).map_err(SerDeError::from)?,
            other => {
                return Err(WeaverError::UnsupportedFormat(
                    other.unwrap_or_default().to_owned(),
                ));
            }
        };
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: MediaConfig = toml::from_str(
            r#"
            [links]
            default_protocol = "http"

            [schema]
            allow_base64 = true
            "#,
        )
        .unwrap();

        assert_eq!(config.links.default_protocol, "http");
        assert_eq!(config.links.allowed_protocols, vec!["http", "https"]);
        assert!(config.schema.allow_base64);
        assert_eq!(config.upload.accepted_types.len(), 4);
    }

    #[tokio::test]
    async fn file_store_round_trips_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MediaConfig::default();
        config
            .schema
            .html_attributes
            .insert("class".into(), "media".into());
        config.upload.endpoint = Some("https://files.example.com/upload".into());

        for name in ["media.toml", "media.json"] {
            let store = FileStore::new(dir.path().join(name));
            config.save(&store).await.unwrap();
            let loaded = MediaConfig::load(&store).await.unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("media.yaml"));
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, WeaverError::UnsupportedFormat(ext) if ext == "yaml"));
    }

    #[tokio::test]
    async fn malformed_toml_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("media.toml");
        std::fs::write(&path, "[upload]\naccepted_types = \"image/png\"\n").unwrap();
        let err = FileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, WeaverError::Parse(_)));
    }
}
