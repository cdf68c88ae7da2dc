pub mod backup;
pub mod cli;
pub mod errors;
pub mod notification;
pub mod odoo_conf;
pub mod pyright;
pub mod settings;

pub use errors::{ConfigError, ConfigResult};
pub use settings::Settings;
