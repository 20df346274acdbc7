mod loader;
mod types;
mod validator;

pub use loader::{from_toml_str, load_from_path};
pub use types::{CaptureConfig, Config, LinkLayer, LoggingConfig};
pub use validator::validate;
