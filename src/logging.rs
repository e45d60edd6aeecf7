//! Tracing subscriber setup.

use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when RUST_LOG is not set. Dev runs the crate and the
/// HTTP layer at debug; prod keeps everything outside the crate at warn.
fn default_directives(env: &Environment) -> EnvFilter {
    let (crate_level, rest) = if env.is_prod() {
        ("info", "warn")
    } else {
        ("debug", "info")
    };
    EnvFilter::new(format!(
        "buildledger_backend={crate_level},tower_http={crate_level},{rest}"
    ))
}

/// Install the global subscriber: JSON output in prod, pretty output with
/// source locations everywhere else.
pub fn init(env: &Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(env));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(env.is_dev())
        .with_line_number(env.is_dev());

    let registry = tracing_subscriber::registry().with(filter);
    if env.is_prod() {
        registry.with(fmt_layer.json()).init();
    } else {
        registry.with(fmt_layer.pretty()).init();
    }

    tracing::info!(env = ?env, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_default_keeps_crate_at_debug() {
        let filter = default_directives(&Environment::Dev).to_string();
        assert!(filter.contains("buildledger_backend=debug"));
        assert!(filter.contains("tower_http=debug"));
    }

    #[test]
    fn prod_default_quiets_dependencies() {
        let filter = default_directives(&Environment::Prod).to_string();
        assert!(filter.contains("buildledger_backend=info"));
        assert!(filter.ends_with("warn"));
    }
}
