//! Config file loading integration tests

use std::io::Write;

use feed_bot::{BotConfig, ConfigError};
use tempfile::{Builder, NamedTempFile};

fn config_file(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let err = BotConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref p) if p == &path));
    assert!(err.to_string().starts_with("Config does not exist"));
}

#[test]
fn test_load_yaml() {
    let file = config_file(
        ".yaml",
        "number_of_users: 10\nmax_posts_per_user: 4\nmax_likes_per_user: 3\nseed: 99\n",
    );

    let config = BotConfig::load(file.path()).unwrap();
    assert_eq!(config.number_of_users, 10);
    assert_eq!(config.max_posts_per_user, 4);
    assert_eq!(config.max_likes_per_user, 3);
    assert_eq!(config.seed, Some(99));
}

#[test]
fn test_load_json_as_yaml() {
    let file = config_file(
        ".json",
        r#"{"number_of_users": 2, "max_posts_per_user": "1", "max_likes_per_user": 0}"#,
    );

    let config = BotConfig::load(file.path()).unwrap();
    assert_eq!(config.number_of_users, 2);
    assert_eq!(config.max_posts_per_user, 1);
    assert_eq!(config.max_likes_per_user, 0);
}

#[test]
fn test_load_toml() {
    let file = config_file(
        ".toml",
        r#"
number_of_users = 5
max_posts_per_user = 2
max_likes_per_user = 1
api_url = "http://feed.test"
"#,
    );

    let config = BotConfig::load(file.path()).unwrap();
    assert_eq!(config.number_of_users, 5);
    assert_eq!(config.api_url, "http://feed.test");
    assert_eq!(config.client_config().base_url, "http://feed.test");
}

#[test]
fn test_malformed_toml() {
    let file = config_file(".toml", "number_of_users = [");

    let err = BotConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Malformed { format: "TOML", .. }));
}

#[test]
fn test_incomplete_file() {
    let file = config_file(".yml", "max_likes_per_user: 1\nextra: true\n");

    let err = BotConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Config is not full"));
    match err {
        ConfigError::MissingKeys(keys) => {
            assert_eq!(keys, vec!["number_of_users", "max_posts_per_user"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
