use crate::config::types::Config;

pub fn validate(config: &Config) -> Result<(), String> {
    if config.capture.interface.trim().is_empty() {
        return Err("capture.interface cannot be empty".into());
    }
    if config.capture.read_timeout_ms == 0 {
        return Err("capture.read_timeout_ms must be > 0".into());
    }
    if config.capture.report_queue == 0 {
        return Err("capture.report_queue must be > 0".into());
    }
    Ok(())
}
