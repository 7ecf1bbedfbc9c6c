use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_COMPOSIO_API_KEY: &str = "COMPOSIO_API_KEY";
pub const ENV_GITHUB_AUTH_CONFIG_ID: &str = "COMPOSIO_GITHUB_AUTH_CONFIG_ID";
pub const ENV_USER_ID: &str = "COMPOSIO_USER_ID";
pub const ENV_OPENAI_MODEL: &str = "REPOCRAFT_OPENAI_MODEL";
pub const ENV_OPENAI_API_BASE: &str = "REPOCRAFT_OPENAI_API_BASE";
pub const ENV_COMPOSIO_API_BASE: &str = "REPOCRAFT_COMPOSIO_API_BASE";
pub const ENV_LINK_TIMEOUT_SECS: &str = "REPOCRAFT_LINK_TIMEOUT_SECS";
pub const ENV_STATE_ROOT: &str = "REPOCRAFT_STATE_ROOT";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPOSIO_API_BASE: &str = "https://backend.composio.dev/api/v3";
pub const DEFAULT_TOOL_SLUG: &str = "GITHUB_CREATE_A_REPOSITORY_FOR_THE_AUTHENTICATED_USER";
pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LINK_POLL_INTERVAL_MILLIS: u64 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub openai_api_base: Option<String>,
    #[serde(default)]
    pub composio_api_base: Option<String>,
    #[serde(default)]
    pub tool_slug: Option<String>,
    #[serde(default)]
    pub link_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub link_poll_interval_millis: Option<u64>,
    #[serde(default)]
    pub state_root: Option<PathBuf>,
}

impl SettingsFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    pub openai_api_key: Option<String>,
    pub model: String,
    pub openai_api_base: String,
    pub offline: bool,
}

impl ParserSettings {
    pub fn resolve<F>(file: &SettingsFile, lookup: F, offline: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| non_blank(lookup(key));
        let openai_api_key = if offline {
            lookup(ENV_OPENAI_API_KEY)
        } else {
            Some(required(&lookup, ENV_OPENAI_API_KEY)?)
        };

        let settings = Self {
            openai_api_key,
            model: lookup(ENV_OPENAI_MODEL)
                .or_else(|| file.model.clone())
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            openai_api_base: lookup(ENV_OPENAI_API_BASE)
                .or_else(|| file.openai_api_base.clone())
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            offline,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.offline
            && self
                .openai_api_key
                .as_deref()
                .map_or(true, |key| key.trim().is_empty())
        {
            return Err(ConfigError::Settings(
                "openai api key is required unless running offline".to_string(),
            ));
        }
        if self.model.trim().is_empty() || self.openai_api_base.trim().is_empty() {
            return Err(ConfigError::Settings(
                "model and openai api base must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub parser: ParserSettings,
    pub composio_api_key: String,
    pub github_auth_config_id: String,
    pub user_id: String,
    pub composio_api_base: String,
    pub tool_slug: String,
    pub link_timeout: Duration,
    pub link_poll_interval: Duration,
    pub state_root: PathBuf,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

impl Settings {
    pub fn resolve<F>(
        file: SettingsFile,
        lookup: F,
        default_state_root: PathBuf,
        offline: bool,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| non_blank(lookup(key));
        let parser = ParserSettings::resolve(&file, &lookup, offline)?;

        let link_timeout_seconds = match lookup(ENV_LINK_TIMEOUT_SECS) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidEnvVar {
                    key: ENV_LINK_TIMEOUT_SECS.to_string(),
                    value: raw.clone(),
                    reason: err.to_string(),
                })?,
            None => file
                .link_timeout_seconds
                .unwrap_or(DEFAULT_LINK_TIMEOUT_SECS),
        };

        let settings = Self {
            parser,
            composio_api_key: required(&lookup, ENV_COMPOSIO_API_KEY)?,
            github_auth_config_id: required(&lookup, ENV_GITHUB_AUTH_CONFIG_ID)?,
            user_id: required(&lookup, ENV_USER_ID)?,
            composio_api_base: lookup(ENV_COMPOSIO_API_BASE)
                .or(file.composio_api_base)
                .unwrap_or_else(|| DEFAULT_COMPOSIO_API_BASE.to_string()),
            tool_slug: file
                .tool_slug
                .unwrap_or_else(|| DEFAULT_TOOL_SLUG.to_string()),
            link_timeout: Duration::from_secs(link_timeout_seconds),
            link_poll_interval: Duration::from_millis(
                file.link_poll_interval_millis
                    .unwrap_or(DEFAULT_LINK_POLL_INTERVAL_MILLIS),
            ),
            state_root: lookup(ENV_STATE_ROOT)
                .map(PathBuf::from)
                .or(file.state_root)
                .unwrap_or(default_state_root),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        for (label, value) in [
            ("composio api key", &self.composio_api_key),
            ("github auth config id", &self.github_auth_config_id),
            ("user id", &self.user_id),
            ("composio api base", &self.composio_api_base),
            ("tool slug", &self.tool_slug),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Settings(format!("{label} must not be empty")));
            }
        }
        if self.link_timeout.is_zero() {
            return Err(ConfigError::Settings(
                "link timeout must be greater than zero".to_string(),
            ));
        }
        if self.link_poll_interval.is_zero() {
            return Err(ConfigError::Settings(
                "link poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> BTreeMap<String, String> {
        env(&[
            (ENV_OPENAI_API_KEY, "sk-test"),
            (ENV_COMPOSIO_API_KEY, "cmp-test"),
            (ENV_GITHUB_AUTH_CONFIG_ID, "ac_github"),
            (ENV_USER_ID, "user-1"),
        ])
    }

    #[test]
    fn resolve_applies_defaults_when_only_credentials_are_set() {
        let vars = full_env();
        let settings = Settings::resolve(
            SettingsFile::default(),
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            false,
        )
        .expect("settings");

        assert_eq!(settings.parser.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.parser.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(settings.tool_slug, DEFAULT_TOOL_SLUG);
        assert_eq!(
            settings.link_timeout,
            Duration::from_secs(DEFAULT_LINK_TIMEOUT_SECS)
        );
        assert_eq!(settings.state_root, PathBuf::from("/tmp/state"));
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut vars = full_env();
        vars.insert(ENV_OPENAI_MODEL.to_string(), "gpt-4o".to_string());
        vars.insert(ENV_LINK_TIMEOUT_SECS.to_string(), "45".to_string());
        let file = SettingsFile {
            model: Some("from-file".to_string()),
            link_timeout_seconds: Some(10),
            tool_slug: Some("CUSTOM_SLUG".to_string()),
            ..SettingsFile::default()
        };

        let settings = Settings::resolve(
            file,
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            false,
        )
        .expect("settings");
        assert_eq!(settings.parser.model, "gpt-4o");
        assert_eq!(settings.link_timeout, Duration::from_secs(45));
        assert_eq!(settings.tool_slug, "CUSTOM_SLUG");
    }

    #[test]
    fn missing_credentials_are_reported_by_key() {
        let mut vars = full_env();
        vars.remove(ENV_USER_ID);
        let err = Settings::resolve(
            SettingsFile::default(),
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            false,
        )
        .expect_err("missing user id");
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == ENV_USER_ID));
    }

    #[test]
    fn offline_mode_does_not_require_openai_key() {
        let mut vars = full_env();
        vars.remove(ENV_OPENAI_API_KEY);
        let settings = Settings::resolve(
            SettingsFile::default(),
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            true,
        )
        .expect("offline settings");
        assert!(settings.parser.offline);
        assert!(settings.parser.openai_api_key.is_none());
    }

    #[test]
    fn parser_settings_need_only_the_openai_key() {
        let vars = env(&[(ENV_OPENAI_API_KEY, " sk-test ")]);
        let parser = ParserSettings::resolve(
            &SettingsFile::default(),
            |key| vars.get(key).cloned(),
            false,
        )
        .expect("parser settings");
        assert_eq!(parser.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(parser.openai_api_base, DEFAULT_OPENAI_API_BASE);

        let empty = BTreeMap::<String, String>::new();
        let err = ParserSettings::resolve(
            &SettingsFile::default(),
            |key| empty.get(key).cloned(),
            false,
        )
        .expect_err("missing key");
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == ENV_OPENAI_API_KEY));
    }

    #[test]
    fn zero_link_timeout_is_rejected() {
        let mut vars = full_env();
        vars.insert(ENV_LINK_TIMEOUT_SECS.to_string(), "0".to_string());
        let err = Settings::resolve(
            SettingsFile::default(),
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            false,
        )
        .expect_err("zero timeout");
        assert!(err.to_string().contains("link timeout"));
    }

    #[test]
    fn non_numeric_link_timeout_is_rejected() {
        let mut vars = full_env();
        vars.insert(ENV_LINK_TIMEOUT_SECS.to_string(), "soon".to_string());
        let err = Settings::resolve(
            SettingsFile::default(),
            |key| vars.get(key).cloned(),
            PathBuf::from("/tmp/state"),
            false,
        )
        .expect_err("invalid timeout");
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }
}
