use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "GAVAGAI_LOG";
const FALLBACK_LOG_ENV_VAR: &str = "RUST_LOG";

/// Directives for the `gavagai` binary: `GAVAGAI_LOG`, then `RUST_LOG`, else `warn`.
fn gavagai_log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn log_directives_from_env() -> Option<String> {
    [LOG_ENV_VAR, FALLBACK_LOG_ENV_VAR]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Logs go to stderr so `gavagai insights` keeps stdout for the render state.
pub(crate) fn init_tracing() {
    let env_filter = gavagai_log_filter(log_directives_from_env().as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::gavagai_log_filter;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn unit_log_filter_defaults_to_warn() {
        assert_eq!(gavagai_log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            gavagai_log_filter(Some("")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn functional_log_filter_honors_crate_directives() {
        let filter = gavagai_log_filter(Some("gavagai_panel=debug,gavagai_proxy=info"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
