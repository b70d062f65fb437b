use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    /// Page URL handed out when sharing an entry
    pub site_url: String,
    /// Maximum upload request size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Base URL this process is reachable at; prefixes local `/media` URLs.
    pub public_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Supabase,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub supabase: Option<SupabaseConfig>,
    pub bucket: String,
    /// Directory for the embedded database (local backend)
    pub data_dir: String,
    /// Directory for uploaded objects (local backend)
    pub local_storage_path: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

pub const DEFAULT_BUCKET: &str = "audio-submissions";

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Local,
            supabase: None,
            bucket: DEFAULT_BUCKET.to_string(),
            data_dir: "./data".to_string(),
            local_storage_path: "./files".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kind = match var("BACKEND")
            .unwrap_or_else(|| "supabase".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => BackendKind::Local,
            "supabase" => BackendKind::Supabase,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "BACKEND must be 'supabase' or 'local', got '{other}'"
                )))
            }
        };

        let supabase = match kind {
            BackendKind::Supabase => {
                let url = var("SUPABASE_URL").ok_or(ConfigError::MissingVar("SUPABASE_URL"))?;
                let anon_key =
                    var("SUPABASE_ANON_KEY").ok_or(ConfigError::MissingVar("SUPABASE_ANON_KEY"))?;
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key,
                })
            }
            BackendKind::Local => None,
        };

        let bind_address = var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let public_url = var("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://{bind_address}"))
            .trim_end_matches('/')
            .to_string();
        let site_url = var("SITE_URL").unwrap_or_else(|| public_url.clone());

        let max_upload_size = match var("MAX_UPLOAD_SIZE") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "MAX_UPLOAD_SIZE must be a byte count, got '{raw}'"
                ))
            })?,
            None => 50 * 1024 * 1024, // 50MB
        };

        let defaults = BackendConfig::default();
        let config = Config {
            backend: BackendConfig {
                kind,
                supabase,
                bucket: var("STORAGE_BUCKET").unwrap_or(defaults.bucket),
                data_dir: var("DATA_DIR").unwrap_or(defaults.data_dir),
                local_storage_path: var("LOCAL_STORAGE_PATH")
                    .unwrap_or(defaults.local_storage_path),
            },
            server: ServerConfig {
                bind_address,
                public_url,
            },
            site_url,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(supabase) = &self.backend.supabase {
            if !supabase.url.starts_with("http://") && !supabase.url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "SUPABASE_URL must be an http(s) URL, got '{}'",
                    supabase.url
                )));
            }
        }

        if self.backend.bucket.contains('/') {
            return Err(ConfigError::ValidationError(
                "STORAGE_BUCKET must not contain '/'".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn supabase_backend_requires_url() {
        let err = load(&[("SUPABASE_ANON_KEY", "anon")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("SUPABASE_URL")));
    }

    #[test]
    fn supabase_backend_requires_anon_key() {
        let err = load(&[("SUPABASE_URL", "https://demo.supabase.co")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("SUPABASE_ANON_KEY")));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let err = load(&[("SUPABASE_URL", "  "), ("SUPABASE_ANON_KEY", "anon")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("SUPABASE_URL")));
    }

    #[test]
    fn supabase_defaults() {
        let config = load(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();

        assert_eq!(config.backend.kind, BackendKind::Supabase);
        let supabase = config.backend.supabase.unwrap();
        assert_eq!(supabase.url, "https://demo.supabase.co");
        assert_eq!(supabase.anon_key, "anon");
        assert_eq!(config.backend.bucket, "audio-submissions");
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.server.public_url, "http://127.0.0.1:8080");
        assert_eq!(config.site_url, "http://127.0.0.1:8080");
        assert_eq!(config.max_upload_size, 52_428_800);
    }

    #[test]
    fn local_backend_needs_no_credentials() {
        let config = load(&[("BACKEND", "local"), ("SITE_URL", "https://remix.example")]).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Local);
        assert!(config.backend.supabase.is_none());
        assert_eq!(config.site_url, "https://remix.example");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(matches!(
            load(&[("BACKEND", "firebase")]),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_upload_size() {
        assert!(matches!(
            load(&[("BACKEND", "local"), ("MAX_UPLOAD_SIZE", "lots")]),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
