//! Bot configuration
//!
//! The config file is a flat mapping. YAML is the default format (JSON parses
//! as YAML too); a `.toml` extension selects TOML. Files are read into a
//! generic value and checked key by key so every error names its key.

use feed_client::ClientConfig;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Keys every config file must provide.
pub const REQUIRED_KEYS: [&str; 3] = [
    "number_of_users",
    "max_posts_per_user",
    "max_likes_per_user",
];

const OPTIONAL_KEYS: [&str; 7] = [
    "api_url",
    "request_timeout_secs",
    "seed",
    "post_content",
    "email_domain",
    "max_consecutive_like_faults",
    "post_concurrency",
];

/// Configuration errors. All of them are fatal and reported before any
/// request is sent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file does not exist
    #[error("Config does not exist: {0}")]
    NotFound(PathBuf),

    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Config file is not correct {format}: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },

    /// Top level of the file is not a mapping
    #[error("Config file must contain a mapping of keys to values")]
    NotAMapping,

    /// Required keys are absent
    #[error("Config is not full, missing: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// A key has a value of the wrong shape or range
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Configuration for one bot run. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// Accounts to sign up
    pub number_of_users: usize,
    /// Upper bound (inclusive) of posts per account
    pub max_posts_per_user: usize,
    /// Upper bound of likes per account
    pub max_likes_per_user: usize,
    /// Base URL of the feed service
    pub api_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Message body of every generated post
    pub post_content: String,
    /// Domain of generated email addresses
    pub email_domain: String,
    /// Consecutive failed likes after which a turn is abandoned
    pub max_consecutive_like_faults: usize,
    /// Accounts creating posts concurrently
    pub post_concurrency: usize,
}

impl BotConfig {
    /// Create a config with the three required limits and defaults elsewhere.
    pub fn new(number_of_users: usize, max_posts_per_user: usize, max_likes_per_user: usize) -> Self {
        Self {
            number_of_users,
            max_posts_per_user,
            max_likes_per_user,
            api_url: default_api_url(),
            request_timeout_secs: 30,
            seed: None,
            post_content: "Any text".to_string(),
            email_domain: "gmail.com".to_string(),
            max_consecutive_like_faults: 3,
            post_concurrency: 1,
        }
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse and validate YAML (or JSON) text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Malformed {
            format: "YAML",
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(text).map_err(|e| ConfigError::Malformed {
            format: "TOML",
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Build from an already parsed document.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let map = value.as_mapping().ok_or(ConfigError::NotAMapping)?;

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| map.get(*k).map_or(true, Value::is_null))
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        for key in map.keys() {
            let known = key
                .as_str()
                .is_some_and(|k| REQUIRED_KEYS.contains(&k) || OPTIONAL_KEYS.contains(&k));
            if !known {
                warn!(key = ?key, "Ignoring unknown config key");
            }
        }

        let mut config = Self::new(
            required_count(map, "number_of_users")?,
            required_count(map, "max_posts_per_user")?,
            required_count(map, "max_likes_per_user")?,
        );

        if let Some(url) = optional_string(map, "api_url")? {
            config.api_url = url;
        }
        if let Some(secs) = optional_count(map, "request_timeout_secs")? {
            config.request_timeout_secs = secs as u64;
        }
        if let Some(seed) = optional_u64(map, "seed")? {
            config.seed = Some(seed);
        }
        if let Some(content) = optional_string(map, "post_content")? {
            config.post_content = content;
        }
        if let Some(domain) = optional_string(map, "email_domain")? {
            config.email_domain = domain;
        }
        if let Some(n) = optional_count(map, "max_consecutive_like_faults")? {
            config.max_consecutive_like_faults = n;
        }
        if let Some(n) = optional_count(map, "post_concurrency")? {
            config.post_concurrency = n;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_users == 0 {
            return Err(invalid("number_of_users", "must be at least 1"));
        }
        if self.api_url.trim().is_empty() {
            return Err(invalid("api_url", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be at least 1"));
        }
        if self.post_content.is_empty() {
            return Err(invalid("post_content", "must not be empty"));
        }
        if self.email_domain.trim().is_empty() {
            return Err(invalid("email_domain", "must not be empty"));
        }
        if self.max_consecutive_like_faults == 0 {
            return Err(invalid("max_consecutive_like_faults", "must be at least 1"));
        }
        if self.post_concurrency == 0 {
            return Err(invalid("post_concurrency", "must be at least 1"));
        }
        Ok(())
    }

    /// Client settings derived from this config.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(_) => "a tagged value".to_string(),
    }
}

/// Accepts integers and integer strings, like `5` or `"5"`.
fn coerce_u64(key: &str, value: &Value) -> Result<u64, ConfigError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        invalid(
            key,
            format!("expected a non-negative integer, got {}", describe(value)),
        )
    })
}

fn coerce_count(key: &str, value: &Value) -> Result<usize, ConfigError> {
    let n = coerce_u64(key, value)?;
    usize::try_from(n).map_err(|_| invalid(key, format!("{} is too large", n)))
}

fn required_count(map: &Mapping, key: &str) -> Result<usize, ConfigError> {
    match map.get(key) {
        Some(value) => coerce_count(key, value),
        None => Err(ConfigError::MissingKeys(vec![key.to_string()])),
    }
}

fn optional_count(map: &Mapping, key: &str) -> Result<Option<usize>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_count(key, value).map(Some),
    }
}

fn optional_u64(map: &Mapping, key: &str) -> Result<Option<u64>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_u64(key, value).map(Some),
    }
}

fn optional_string(map: &Mapping, key: &str) -> Result<Option<String>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(
            key,
            format!("expected a string, got {}", describe(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml() {
        let config = BotConfig::from_yaml(
            "number_of_users: 3\nmax_posts_per_user: 0\nmax_likes_per_user: 5\n",
        )
        .unwrap();
        assert_eq!(config.number_of_users, 3);
        assert_eq!(config.max_posts_per_user, 0);
        assert_eq!(config.max_likes_per_user, 5);
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.post_content, "Any text");
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_integer_strings_are_coerced() {
        let config = BotConfig::from_yaml(
            "number_of_users: '4'\nmax_posts_per_user: \" 2 \"\nmax_likes_per_user: 1\n",
        )
        .unwrap();
        assert_eq!(config.number_of_users, 4);
        assert_eq!(config.max_posts_per_user, 2);
    }

    #[test]
    fn test_missing_keys_are_listed() {
        let err = BotConfig::from_yaml("number_of_users: 3\n").unwrap_err();
        match err {
            ConfigError::MissingKeys(keys) => {
                assert_eq!(keys, vec!["max_posts_per_user", "max_likes_per_user"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_value_counts_as_missing() {
        let err = BotConfig::from_yaml(
            "number_of_users: 3\nmax_posts_per_user:\nmax_likes_per_user: 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKeys(_)));
    }

    #[test]
    fn test_not_a_mapping() {
        assert!(matches!(
            BotConfig::from_yaml("- 1\n- 2\n"),
            Err(ConfigError::NotAMapping)
        ));
        assert!(matches!(
            BotConfig::from_yaml("just a sentence"),
            Err(ConfigError::NotAMapping)
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            BotConfig::from_yaml("number_of_users: [1, 2"),
            Err(ConfigError::Malformed { format: "YAML", .. })
        ));
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        for bad in ["-1", "2.5", "true", "[1]", "'many'"] {
            let yaml = format!(
                "number_of_users: 2\nmax_posts_per_user: {bad}\nmax_likes_per_user: 1\n"
            );
            let err = BotConfig::from_yaml(&yaml).unwrap_err();
            match err {
                ConfigError::InvalidValue { key, .. } => assert_eq!(key, "max_posts_per_user"),
                other => panic!("{bad}: unexpected error {other}"),
            }
        }
    }

    #[test]
    fn test_zero_users_rejected() {
        let err = BotConfig::from_yaml(
            "number_of_users: 0\nmax_posts_per_user: 1\nmax_likes_per_user: 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "number_of_users"));
    }

    #[test]
    fn test_optional_keys() {
        let config = BotConfig::from_yaml(
            r#"
number_of_users: 2
max_posts_per_user: 1
max_likes_per_user: 1
api_url: "http://feed.internal:9000"
request_timeout_secs: 5
seed: 42
post_content: "Hello"
email_domain: example.org
max_consecutive_like_faults: 2
post_concurrency: 4
"#,
        )
        .unwrap();
        assert_eq!(config.api_url, "http://feed.internal:9000");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.post_content, "Hello");
        assert_eq!(config.email_domain, "example.org");
        assert_eq!(config.max_consecutive_like_faults, 2);
        assert_eq!(config.post_concurrency, 4);
        assert_eq!(config.client_config().timeout_secs, 5);
    }

    #[test]
    fn test_json_is_accepted() {
        let config = BotConfig::from_yaml(
            r#"{"number_of_users": 5, "max_posts_per_user": 3, "max_likes_per_user": 2}"#,
        )
        .unwrap();
        assert_eq!(config.number_of_users, 5);
    }

    #[test]
    fn test_toml() {
        let config = BotConfig::from_toml(
            "number_of_users = 2\nmax_posts_per_user = 1\nmax_likes_per_user = 1\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(config.number_of_users, 2);
        assert_eq!(config.seed, Some(7));

        assert!(matches!(
            BotConfig::from_toml("number_of_users = "),
            Err(ConfigError::Malformed { format: "TOML", .. })
        ));
    }

    #[test]
    fn test_empty_post_content_rejected() {
        let err = BotConfig::from_yaml(
            "number_of_users: 1\nmax_posts_per_user: 1\nmax_likes_per_user: 1\npost_content: ''\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "post_content"));
    }
}
