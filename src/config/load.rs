use super::{
    default_global_config_path, default_state_root, ConfigError, ParserSettings, Settings,
    SettingsFile,
};
use std::path::Path;

pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::DotEnv(err.to_string())),
    }
}

pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    SettingsFile::from_path(path)
}

pub fn load_global_settings(offline: bool) -> Result<Settings, ConfigError> {
    load_dotenv()?;
    let file = load_settings_file(&default_global_config_path()?)?;
    Settings::resolve(
        file,
        |key| std::env::var(key).ok(),
        default_state_root()?,
        offline,
    )
}

pub fn load_parser_settings(offline: bool) -> Result<ParserSettings, ConfigError> {
    load_dotenv()?;
    let file = load_settings_file(&default_global_config_path()?)?;
    ParserSettings::resolve(&file, |key| std::env::var(key).ok(), offline)
}
