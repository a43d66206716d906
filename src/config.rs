//! Server configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StartupError;

/// Quickshare configuration. Read-only once the server has started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Files or directories to expose for download
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Accept uploads into the first shared directory
    #[serde(default)]
    pub receive: bool,

    /// Treat the first share as a continuously rewritten text clipboard
    #[serde(default)]
    pub clipboard: bool,

    /// Where the upload response sends the browser afterwards
    #[serde(default = "default_post_upload_redirect_url")]
    pub post_upload_redirect_url: String,

    /// Address displayed on the upload form
    #[serde(default)]
    pub share_address: String,

    /// Maximum request body size for uploads (in bytes)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,

    /// Directory served under /assets; relative paths resolve against
    /// the working directory, so deployments should set this absolute
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Optional HTTP Basic credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    /// Auth is enforced only when both halves are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// TLS material; supplied externally, never generated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

fn default_port() -> u16 {
    8331
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_post_upload_redirect_url() -> String {
    "/receive".to_string()
}

fn default_max_upload_size() -> usize {
    100 * 1024 * 1024 // 100 MB
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            paths: Vec::new(),
            receive: false,
            clipboard: false,
            post_upload_redirect_url: default_post_upload_redirect_url(),
            share_address: String::new(),
            max_upload_size: default_max_upload_size(),
            assets_dir: default_assets_dir(),
            auth: AuthConfig::default(),
            tls: None,
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, StartupError> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| StartupError::InvalidConfig(format!("{}: {}", path.display(), err)))?;
        toml::from_str(&content).map_err(|err| StartupError::InvalidConfig(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8331);
        assert!(!config.receive);
        assert!(config.auth.credentials().is_none());
        assert!(config.tls.is_none());
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let auth = AuthConfig {
            username: Some("u".to_string()),
            password: None,
        };
        assert!(auth.credentials().is_none());

        let auth = AuthConfig {
            username: Some("u".to_string()),
            password: Some("p".to_string()),
        };
        assert_eq!(auth.credentials(), Some(("u", "p")));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickshare.toml");
        std::fs::write(
            &path,
            r#"
port = 9000
receive = true
share_address = "http://192.168.1.5:9000"

[auth]
username = "alice"
password = "secret"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.receive);
        assert_eq!(config.auth.credentials(), Some(("alice", "secret")));
        // unset fields keep their defaults
        assert_eq!(config.post_upload_redirect_url, "/receive");
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(Path::new("/nonexistent/quickshare.toml"));
        assert!(matches!(result, Err(StartupError::InvalidConfig(_))));
    }
}
