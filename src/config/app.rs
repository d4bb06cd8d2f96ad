// src/config/app.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::blacklist::{parse_list, Blacklist};
use crate::decision::Thresholds;
use crate::heuristic::HeuristicParams;

use super::frontends::FrontendRouting;
use super::ConfigError;

pub const ENV_CLIENT_ID: &str = "CLASSIFIER_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CLASSIFIER_CLIENT_SECRET";
pub const ENV_FRONTENDS_CONFIG_PATH: &str = "FRONTENDS_CONFIG_PATH";

pub const DEFAULT_FRONTENDS_CONFIG_PATH: &str = "config/frontends.toml";
pub const DEFAULT_AUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_COMPLETIONS_URL: &str =
    "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
const DEFAULT_UA_BLACKLIST: &str = "python-requests,curl,headless";

/// Client id/secret for the token endpoint. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ClassifierCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClassifierCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub enabled: bool,
    pub credentials: ClassifierCredentials,
    pub scope: String,
    pub model: String,
    pub auth_url: String,
    pub completions_url: String,
    /// Cancellation deadline for the completion call.
    pub timeout: Duration,
}

impl ClassifierSettings {
    pub fn new(credentials: ClassifierCredentials) -> Self {
        Self {
            enabled: true,
            credentials,
            scope: "GIGACHAT_API_PERS".to_string(),
            model: "GigaChat".to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            completions_url: DEFAULT_COMPLETIONS_URL.to_string(),
            timeout: Duration::from_millis(15_000),
        }
    }
}

/// Process-wide configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub classifier: ClassifierSettings,
    pub heuristic: HeuristicParams,
    pub thresholds: Thresholds,
    pub blacklist: Blacklist,
    pub frontends: FrontendRouting,
}

impl AppConfig {
    /// Defaults everywhere except the mandatory credentials.
    pub fn new(credentials: ClassifierCredentials) -> Self {
        Self {
            port: 3000,
            classifier: ClassifierSettings::new(credentials),
            heuristic: HeuristicParams::default(),
            thresholds: Thresholds::default(),
            blacklist: Blacklist::new(Vec::new(), Vec::new(), parse_list(DEFAULT_UA_BLACKLIST)),
            frontends: FrontendRouting::default(),
        }
    }

    /// Read the process environment (call `dotenvy::dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key → value source; lets tests avoid touching the real env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let credentials = ClassifierCredentials {
            client_id: required(ENV_CLIENT_ID)?,
            client_secret: required(ENV_CLIENT_SECRET)?,
        };

        let mut cfg = Self::new(credentials);
        let num = |key: &str| parse_nonzero(lookup(key));

        if let Some(port) = num("PORT").and_then(|p| u16::try_from(p).ok()) {
            cfg.port = port;
        }

        let c = &mut cfg.classifier;
        c.enabled = lookup("CLASSIFIER_ENABLED")
            .map(|v| !matches!(v.trim(), "0" | "false" | "off"))
            .unwrap_or(true);
        if let Some(v) = non_empty(lookup("CLASSIFIER_SCOPE")) {
            c.scope = v;
        }
        if let Some(v) = non_empty(lookup("CLASSIFIER_MODEL")) {
            c.model = v;
        }
        if let Some(v) = non_empty(lookup("CLASSIFIER_AUTH_URL")) {
            c.auth_url = v;
        }
        if let Some(v) = non_empty(lookup("CLASSIFIER_COMPLETIONS_URL")) {
            c.completions_url = v;
        }
        if let Some(ms) = num("CLASSIFIER_TIMEOUT_MS").filter(|ms| *ms > 0) {
            c.timeout = Duration::from_millis(ms as u64);
        }

        if let Some(v) = num("QUIZ_MIN_DURATION_MS").filter(|v| *v > 0) {
            cfg.heuristic.min_duration_ms = v as u64;
        }
        if let Some(v) = num("QUIZ_MIN_AVG_INTERVAL_MS") {
            cfg.heuristic.min_avg_interval_ms = v as f64;
        }
        if let Some(v) = num("QUIZ_DENY_THRESHOLD") {
            cfg.thresholds.deny = v;
        }
        if let Some(v) = num("QUIZ_ALLOW_THRESHOLD") {
            cfg.thresholds.allow = v;
        }

        // Unset or blank falls back to the default list.
        let list = |key: &str, default: &str| {
            parse_list(&non_empty(lookup(key)).unwrap_or_else(|| default.to_string()))
        };
        cfg.blacklist = Blacklist::new(
            list("BLACKLIST_PHONES", ""),
            list("BLACKLIST_IPS", ""),
            list("BLACKLIST_UA", DEFAULT_UA_BLACKLIST),
        );

        let frontends_path = lookup(ENV_FRONTENDS_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FRONTENDS_CONFIG_PATH));
        cfg.frontends = FrontendRouting::load_or_empty(&frontends_path)?;

        Ok(cfg)
    }
}

// Unparseable and zero values fall back to the default.
fn parse_nonzero(raw: Option<String>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v != 0)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    fn creds() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_CLIENT_ID, "id"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_FRONTENDS_CONFIG_PATH, "/nonexistent/frontends.toml"),
        ]
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_CLIENT_ID, "id")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_CLIENT_SECRET)));

        let err = AppConfig::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "  "),
            (ENV_CLIENT_SECRET, "s"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_CLIENT_ID)));
    }

    #[test]
    fn defaults_apply() {
        let cfg = AppConfig::from_lookup(lookup_from(&creds())).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.heuristic, HeuristicParams::default());
        assert_eq!(cfg.thresholds, Thresholds::default());
        assert_eq!(cfg.classifier.scope, "GIGACHAT_API_PERS");
        assert_eq!(cfg.classifier.model, "GigaChat");
        assert_eq!(cfg.classifier.timeout, Duration::from_secs(15));
        assert!(cfg.classifier.enabled);
        assert!(cfg.blacklist.phones.is_empty());
        assert_eq!(
            cfg.blacklist.user_agents,
            vec!["python-requests", "curl", "headless"]
        );
        assert!(cfg.frontends.is_empty());
    }

    #[test]
    fn overrides_and_fallbacks() {
        let mut pairs = creds();
        pairs.extend([
            ("PORT", "8080"),
            ("QUIZ_MIN_DURATION_MS", "5000"),
            ("QUIZ_MIN_AVG_INTERVAL_MS", "abc"),
            ("QUIZ_DENY_THRESHOLD", "0"),
            ("QUIZ_ALLOW_THRESHOLD", "90"),
            ("BLACKLIST_PHONES", "+7900, +7901"),
            ("BLACKLIST_UA", ""),
            ("CLASSIFIER_ENABLED", "0"),
            ("CLASSIFIER_TIMEOUT_MS", "250"),
        ]);
        let cfg = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.heuristic.min_duration_ms, 5000);
        assert_eq!(cfg.heuristic.min_avg_interval_ms, 300.0);
        assert_eq!(cfg.thresholds.deny, 20);
        assert_eq!(cfg.thresholds.allow, 90);
        assert_eq!(cfg.blacklist.phones, vec!["+7900", "+7901"]);
        assert_eq!(
            cfg.blacklist.user_agents,
            vec!["python-requests", "curl", "headless"]
        );
        assert!(cfg.blacklist.is_blacklisted("", "", "curl/8.0"));
        assert!(!cfg.classifier.enabled);
        assert_eq!(cfg.classifier.timeout, Duration::from_millis(250));
    }

    #[test]
    fn debug_hides_secret() {
        let c = ClassifierCredentials {
            client_id: "id".into(),
            client_secret: "hunter2".into(),
        };
        let s = format!("{c:?}");
        assert!(!s.contains("hunter2"));
    }
}
