/// Popup configuration, fixed at build time

// Extension code has no process environment at runtime, so credentials are
// baked in with `option_env!` when the wasm bundle is built.

/// Placeholder key shipped in templates; treated as "no key"
pub const FIREBASE_PLACEHOLDER_KEY: &str = "AIzaSy_Placeholder_Key";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PROJECT_ID: &str = "utubext-ai";
pub const DEFAULT_COLLECTION: &str = "analyses";

/// Analysis provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn new(api_key: Option<String>) -> ProviderConfig {
        ProviderConfig {
            api_key: non_empty(api_key),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
        }
    }
}

/// Remote history store settings
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteStoreConfig {
    /// Derived from credential presence; false means local-only history
    pub enabled: bool,
    pub api_key: String,
    pub project_id: String,
    pub collection: String,
}

impl RemoteStoreConfig {
    pub fn new(api_key: Option<String>, project_id: Option<String>) -> RemoteStoreConfig {
        let api_key = non_empty(api_key).filter(|key| key != FIREBASE_PLACEHOLDER_KEY);

        RemoteStoreConfig {
            enabled: api_key.is_some(),
            api_key: api_key.unwrap_or_default(),
            project_id: non_empty(project_id).unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string()),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn disabled() -> RemoteStoreConfig {
        RemoteStoreConfig::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub remote: RemoteStoreConfig,
}

impl AppConfig {
    pub fn from_build_env() -> AppConfig {
        let provider_key = option_env!("GEMINI_API_KEY")
            .or(option_env!("API_KEY"))
            .map(str::to_string);

        AppConfig {
            provider: ProviderConfig::new(provider_key),
            remote: RemoteStoreConfig::new(
                option_env!("FIREBASE_API_KEY").map(str::to_string),
                option_env!("FIREBASE_PROJECT_ID").map(str::to_string),
            ),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_enabled_with_key() {
        let config = RemoteStoreConfig::new(Some("AIzaRealKey".to_string()), Some("my-project".to_string()));

        assert!(config.enabled);
        assert_eq!(config.api_key, "AIzaRealKey");
        assert_eq!(config.project_id, "my-project");
        assert_eq!(config.collection, "analyses");
    }

    #[test]
    fn test_remote_disabled_without_key() {
        assert!(!RemoteStoreConfig::new(None, None).enabled);
        assert!(!RemoteStoreConfig::new(Some("  ".to_string()), None).enabled);
        assert!(!RemoteStoreConfig::disabled().enabled);
    }

    #[test]
    fn test_remote_disabled_with_placeholder() {
        let config = RemoteStoreConfig::new(Some(FIREBASE_PLACEHOLDER_KEY.to_string()), None);

        assert!(!config.enabled);
        assert_eq!(config.project_id, DEFAULT_PROJECT_ID);
    }

    #[test]
    fn test_provider_defaults() {
        let config = ProviderConfig::new(Some(String::new()));

        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_PROVIDER_BASE_URL);
    }
}
