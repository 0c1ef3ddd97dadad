use crate::filter::{flag, optional_flag};
use crate::lifetime::Lifetime;
use crate::options::SameSite;
use serde::Deserialize;

/// Jar-wide cookie defaults, as read from configuration.
///
/// Keys are camelCase (`httpOnly`, `sameSite`), with `expire` accepted for `lifetime`. Flags take
/// booleans, integers or strings such as `"on"`. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JarConfig {
    #[serde(alias = "expire")]
    pub lifetime: Lifetime,
    pub path: Option<String>,
    pub domain: Option<String>,
    #[serde(deserialize_with = "optional_flag")]
    pub secure: Option<bool>,
    #[serde(alias = "http_only", alias = "httponly", deserialize_with = "flag")]
    pub http_only: bool,
    #[serde(deserialize_with = "flag")]
    pub raw: bool,
    #[serde(alias = "same_site", alias = "samesite")]
    pub same_site: Option<SameSite>,
    pub salt: Option<String>,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            lifetime: Lifetime::Seconds(3600),
            path: None,
            domain: None,
            secure: None,
            http_only: true,
            raw: false,
            same_site: None,
            salt: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config: JarConfig = serde_json::from_value(json!({})).unwrap();

        assert_eq!(config, JarConfig::default());
        assert_eq!(config.lifetime, Lifetime::Seconds(3600));
        assert!(config.http_only);
        assert!(!config.raw);
    }

    #[test]
    fn test_string_configuration() {
        let config: JarConfig = serde_json::from_value(json!({
            "value": null,
            "expire": "7200",
            "path": "/",
            "secure": "true",
            "httpOnly": "0",
            "raw": "yes",
            "sameSite": "strict",
            "salt": "_v1",
        }))
        .unwrap();

        assert_eq!(config.lifetime, Lifetime::Seconds(7200));
        assert_eq!(config.path.as_deref(), Some("/"));
        assert_eq!(config.secure, Some(true));
        assert!(!config.http_only);
        assert!(config.raw);
        assert_eq!(config.same_site, Some(SameSite::Strict));
        assert_eq!(config.salt.as_deref(), Some("_v1"));
    }

    #[test]
    fn test_lowercase_keys() {
        let config: JarConfig =
            serde_json::from_value(json!({"httponly": false, "samesite": "lax"})).unwrap();

        assert!(!config.http_only);
        assert_eq!(config.same_site, Some(SameSite::Lax));
    }
}
