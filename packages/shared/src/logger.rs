//! Logging setup utilities for the Kotoba chat client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given targets.
///
/// Crate names are normalized the way `tracing` reports them (`-` becomes `_`).
pub fn default_directive(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logs are written to stderr so they do not interleave with the chat
/// transcript printed on stdout. The log level can be overridden using the
/// `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `targets` - Crates and binaries whose logs are enabled (e.g. `["kotoba-client"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use kotoba_shared::logger::setup_logger;
///
/// setup_logger(&["kotoba-client"], "info");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_normalizes_crate_names() {
        // テスト項目: クレート名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let targets = ["kotoba-client", "kotoba-shared"];

        // when (操作):
        let directive = default_directive(&targets, "info");

        // then (期待する結果):
        assert_eq!(directive, "kotoba_client=info,kotoba_shared=info");
    }

    #[test]
    fn test_default_directive_with_no_targets() {
        // テスト項目: ターゲットが空の場合、空のディレクティブになる
        // given (前提条件):
        let targets: [&str; 0] = [];

        // when (操作):
        let directive = default_directive(&targets, "debug");

        // then (期待する結果):
        assert!(directive.is_empty());
    }
}
