use std::fs;
use std::path::Path;

use crate::config::{validate, Config};
use crate::error::{Result, RxTapError};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| RxTapError::Config(format!("Failed to read config file: {e}")))?;
    from_toml_str(&txt)
}

pub fn from_toml_str(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)
        .map_err(|e| RxTapError::Config(format!("Failed to parse config: {e}")))?;

    validate(&cfg).map_err(RxTapError::Config)?;

    Ok(cfg)
}
