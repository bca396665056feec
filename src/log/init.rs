use super::Config;
use crate::error::LogError;
use tracing::Level;

/// Target used for raw handshake and frame dumps.
pub const WIRE_TARGET: &str = "knot_ws::wire";

/// Installs the global subscriber. Installing twice is reported as
/// [`LogError::Install`] and leaves the first subscriber in place.
pub fn init(cfg: &Config) -> Result<(), LogError> {
    let level = cfg
        .level
        .parse::<Level>()
        .map_err(|_| LogError::InvalidLevel(cfg.level.clone()))?;

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_line_number(cfg.with_line);

    let installed = match cfg.console {
        true => builder.try_init(),
        false => builder.json().try_init(),
    };

    installed.map_err(LogError::Install)
}

pub fn init_default() {
    let cfg = Config::default();
    _ = init(&cfg);
}
