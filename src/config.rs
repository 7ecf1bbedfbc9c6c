pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_dotenv, load_global_settings, load_parser_settings, load_settings_file};
pub use paths::{default_global_config_path, default_state_root};
pub use settings::{ParserSettings, Settings, SettingsFile};
