use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize logging/tracing for the bot.
///
/// `debug` raises the default level for our crates; `RUST_LOG` still wins.
pub fn init(service_name: &str, debug: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, debug)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::External(format!("logging init failed: {e}")))
}

/// Filter used when `RUST_LOG` is unset: info overall, `debug` raises our crates.
fn default_directives(service_name: &str, debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    format!("info,retg={level},retg_core={level},retg_telegram={level},{service_name}={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info() {
        assert_eq!(
            default_directives("retg", false),
            "info,retg=info,retg_core=info,retg_telegram=info,retg=info"
        );
    }

    #[test]
    fn debug_only_raises_our_crates() {
        let directives = default_directives("retg", true);
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("retg_core=debug"));
        assert!(directives.contains("retg_telegram=debug"));
    }
}
