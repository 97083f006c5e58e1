// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for privacybot
//!
//! Runner pacing, session settings, check selection and the keyword tables
//! every built-in check draws its heuristics from.

use crate::error::{PrivacyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Check execution pacing
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Page inspection session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Which built-in checks to register
    #[serde(default)]
    pub checks: CheckSelection,

    /// Keyword and pattern tables used by the checks
    #[serde(default)]
    pub keywords: KeywordTables,
}

/// Delays applied by the check runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Wait after a fresh navigation before inspecting, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Delay between two checks, in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl RunnerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_pacing_ms() -> u64 {
    500
}

/// HTTP session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_user_agent() -> String {
    format!("privacybot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

/// Check selection. An empty `enabled` list means every built-in check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckSelection {
    #[serde(default)]
    pub enabled: Vec<String>,

    #[serde(default)]
    pub disabled: Vec<String>,
}

impl CheckSelection {
    /// Whether a check id passes the selection
    pub fn includes(&self, id: &str) -> bool {
        let enabled = self.enabled.is_empty() || self.enabled.iter().any(|e| e == id);
        enabled && !self.disabled.iter().any(|d| d == id)
    }
}

/// A privacy policy section and the phrase that identifies it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    /// Lowercase phrase searched for in the policy text
    pub key: String,
    /// Name reported when the section is missing
    pub name: String,
}

/// Keyword tables shared by all checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    pub privacy_link_terms: Vec<String>,
    pub cookie_banner_selectors: Vec<String>,
    /// Elements that usually hold a consent prompt
    pub consent_element_selectors: Vec<String>,
    pub cookie_policy_link_terms: Vec<String>,
    pub accept_terms: Vec<String>,
    pub reject_terms: Vec<String>,
    pub more_info_terms: Vec<String>,
    pub consent_checkbox_terms: Vec<String>,
    pub dsar_terms: Vec<String>,
    pub tracker_domains: Vec<String>,
    pub tracking_cookie_names: Vec<String>,
    pub tracking_script_terms: Vec<String>,
    pub third_party_disclosure_terms: Vec<String>,
    pub retention_terms: Vec<String>,
    pub legal_basis_terms: Vec<String>,
    pub retention_period_terms: Vec<String>,
    pub cookie_retention_terms: Vec<String>,
    pub transfer_terms: Vec<String>,
    pub safeguard_terms: Vec<String>,
    pub third_party_service_domains: Vec<String>,
    pub security_headers: Vec<String>,
    pub breach_terms: Vec<String>,
    pub breach_requirement_terms: Vec<String>,
    pub dpo_terms: Vec<String>,
    pub cmp_vendors: Vec<String>,
    pub cookie_policy_sections: Vec<String>,
    pub sensitive_markers: Vec<String>,
    pub contact_terms: Vec<String>,
    pub settings_terms: Vec<String>,
    pub consent_cookie_terms: Vec<String>,
    /// Array of tables; must remain the last field for TOML output
    pub policy_sections: Vec<PolicySection>,
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            privacy_link_terms: terms(&["privacy", "datenschutz", "gdpr", "data protection"]),
            cookie_banner_selectors: terms(&[
                r#"div[class*="cookie"][class*="banner"], div[class*="cookie"][class*="notice"]"#,
                r#"div[id*="cookie"][id*="banner"], div[id*="cookie"][id*="notice"]"#,
                r#"div[class*="cc-banner"], div[class*="cookieconsent"]"#,
                r#"div[class*="gdpr"], div[class*="cc-window"]"#,
                "#cookie-law-info-bar, #onetrust-consent-sdk",
                ".cc-window, #cookieConsent, #cookie-notice",
                "#CybotCookiebotDialog, #cookie-notification",
                "#ccc-notify, #cookieChoiceInfo, #cookie-law",
                "#cookie-consent, #cookie-warning, #cookie_consent",
            ]),
            consent_element_selectors: terms(&[
                r#"[id*="cookie"]"#,
                r#"[class*="cookie"]"#,
                r#"[id*="consent"]"#,
                r#"[class*="consent"]"#,
            ]),
            cookie_policy_link_terms: terms(&["cookie policy", "cookie notice", "cookie-policy"]),
            accept_terms: terms(&[
                "accept", "agree", "allow all", "got it", "i accept", "consent", "okay", "ok",
                "continue", "confirm my choices", "save preferences",
            ]),
            reject_terms: terms(&[
                "reject", "decline", "deny", "necessary only", "only necessary", "customize",
                "settings", "preferences", "no thanks",
            ]),
            more_info_terms: terms(&[
                "learn more", "more info", "read more", "cookie policy", "privacy policy",
                "cookie settings", "preferences", "customize", "manage cookies", "cookie notice",
                "cookie information", "how we use cookies",
            ]),
            consent_checkbox_terms: terms(&["consent", "agree", "accept", "gdpr"]),
            dsar_terms: terms(&[
                "data subject", "access request", "right to access", "right to be forgotten",
                "right to erasure", "right to rectification", "data portability",
                "privacy request", "gdpr request", "dsar", "subject access request",
            ]),
            tracker_domains: terms(&[
                "google-analytics.com", "googletagmanager.com", "googleadservices.com",
                "doubleclick.net", "facebook.com/tr", "facebook.net", "analytics.twitter.com",
                "linkedin.com/analytics", "hotjar.com", "mouseflow.com", "crazyegg.com",
                "mixpanel.com", "amplitude.com", "segment.com", "googlesyndication.com",
                "ads-twitter.com", "ads.linkedin.com", "bing.com/ads", "pubmatic.com",
                "rubiconproject.com", "openx.net", "criteo.com", "taboola.com", "outbrain.com",
                "addthis.com", "sharethis.com", "addtoany.com", "tealium.com", "ensighten.com",
            ]),
            tracking_cookie_names: terms(&[
                "_ga", "_gid", "_gat", "_fbp", "_hjid", "_ym_", "yandexuid", "datr",
                "personalization_id", "guest_id",
            ]),
            tracking_script_terms: terms(&[
                "analytics", "track", "pixel", "facebook", "google-analytics", "gtag", "ga(",
            ]),
            third_party_disclosure_terms: terms(&[
                "third party", "third-party", "service provider", "data processor",
                "analytics", "advertising", "google analytics", "facebook pixel",
                "social media", "partners",
            ]),
            retention_terms: terms(&[
                "retention", "store data", "keep information", "data retention",
                "period of retention", "how long we keep", "data storage",
                "retain personal data", "data minimization", "storage limitation",
            ]),
            legal_basis_terms: terms(&[
                "legal basis", "legitimate interest", "legal obligation", "vital interests",
                "public task", "article 6", "lawful basis",
            ]),
            retention_period_terms: terms(&[
                "months", "years", "days", "weeks", "as long as", "for the duration",
                "after which", "retention period", "storage period",
            ]),
            cookie_retention_terms: terms(&[
                "expires", "duration", "how long", "stored for", "persistent",
                "session cookie", "lifetime", "valid for",
            ]),
            transfer_terms: terms(&[
                "international transfer", "cross-border", "outside eea", "outside eu",
                "outside europe", "third countries", "standard contractual clauses",
                "binding corporate rules", "adequacy decision", "data transfer",
                "transfer impact assessment", "outside nigeria",
            ]),
            safeguard_terms: terms(&[
                "standard contractual clauses", "sccs", "binding corporate rules",
                "adequacy decision", "data privacy framework", "approved code of conduct",
                "certification mechanism", "derogations", "article 49", "explicit consent",
                "transfer impact assessment",
            ]),
            third_party_service_domains: terms(&[
                "google-analytics.com", "googletagmanager.com", "facebook.com", "facebook.net",
                "doubleclick.net", "youtube.com", "vimeo.com", "twitter.com", "linkedin.com",
                "licdn.com", "hotjar.com", "hubspot.com", "hs-scripts.com", "salesforce.com",
                "stripe.com", "paypal.com", "addthis.com", "sharethis.com", "amazonaws.com",
                "azure.com", "googleapis.com", "gstatic.com",
            ]),
            security_headers: terms(&[
                "strict-transport-security", "x-frame-options", "x-content-type-options",
                "content-security-policy", "referrer-policy", "permissions-policy",
            ]),
            breach_terms: terms(&[
                "data breach", "security breach", "personal data breach", "breach notification",
                "article 33", "article 34", "72 hour", "72-hour", "seventy-two hour",
                "report a breach", "breach response", "security incident", "data incident",
            ]),
            breach_requirement_terms: terms(&[
                "72 hour", "72-hour", "seventy-two hour", "without undue delay",
                "supervisory authority", "data protection authority", "affected individuals",
                "breach response plan", "ndpc",
            ]),
            dpo_terms: terms(&["data protection officer", "dpo", "privacy officer"]),
            cmp_vendors: terms(&[
                "onetrust", "trustarc", "truste", "cookiebot", "cookie-law", "cookieconsent",
                "quantcast", "sirdata", "didomi", "usercentrics", "cookiefirst", "cookiepro",
            ]),
            cookie_policy_sections: terms(&[
                "what are cookies", "types of cookies", "how we use cookies",
                "managing cookies", "third-party cookies",
            ]),
            sensitive_markers: terms(&["patient", "dob", "date of birth", "diagnosis", "bvn"]),
            contact_terms: terms(&[
                "contact", "get in touch", "reach us", "data protection officer", "dpo",
            ]),
            settings_terms: terms(&["settings", "preferences", "customize", "manage"]),
            consent_cookie_terms: terms(&["consent", "gdpr", "euconsent", "cookieyes"]),
            policy_sections: vec![
                section("data collection", "information we collect"),
                section("data usage", "how we use your information"),
                section("data sharing", "sharing your information"),
                section("cookies", "cookies and tracking"),
                section("rights", "your rights"),
                section("gdpr", "gdpr"),
                section("contact", "contact us"),
            ],
        }
    }
}

fn section(key: &str, name: &str) -> PolicySection {
    PolicySection {
        key: key.to_string(),
        name: name.to_string(),
    }
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("privacybot")
        .join("config.toml")
}

/// Load configuration from a TOML or YAML file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    if is_toml(path) {
        toml::from_str(&content)
            .map_err(|e| PrivacyError::Config(format!("TOML parse error: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| PrivacyError::Config(format!("YAML parse error: {}", e)))
    }
}

/// Write the default configuration, creating parent directories as needed
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config)
            .map_err(|e| PrivacyError::Config(format!("TOML serialize error: {}", e)))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Path::new("/nonexistent/privacybot.toml")).unwrap();
        assert_eq!(config.runner.settle_ms, 2000);
        assert_eq!(config.runner.pacing_ms, 500);
        assert!(config.checks.enabled.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[runner]\npacing_ms = 0\n\n[keywords]\naccept_terms = [\"jawohl\"]\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.runner.pacing_ms, 0);
        assert_eq!(config.runner.settle_ms, 2000);
        assert_eq!(config.keywords.accept_terms, vec!["jawohl".to_string()]);
        assert!(!config.keywords.reject_terms.is_empty());
    }

    #[test]
    fn test_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "checks:\n  disabled:\n    - data_breach\n").unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.checks.includes("data_breach"));
        assert!(config.checks.includes("cookie_banner_check"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[runner\nsettle_ms = ").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, PrivacyError::Config(_)));
    }

    #[test]
    fn test_write_default_config_round_trips() {
        let dir = TempDir::new().unwrap();
        for name in ["nested/config.toml", "config.yaml"] {
            let path = dir.path().join(name);
            write_default_config(&path).unwrap();
            let config = load_config(&path).unwrap();
            assert_eq!(config.keywords.policy_sections.len(), 7);
            assert_eq!(config.session.timeout_secs, 30);
        }
    }

    #[test]
    fn test_selection_enabled_list() {
        let selection = CheckSelection {
            enabled: vec!["privacy_policy_check".to_string()],
            disabled: vec![],
        };
        assert!(selection.includes("privacy_policy_check"));
        assert!(!selection.includes("cookie_banner_check"));
    }
}
