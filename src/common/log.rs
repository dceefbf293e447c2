use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Honours `RUST_LOG`; `verbose` lowers the
/// default level to `debug` for this crate.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose {
        format!("{DEFAULT_FILTER},wingroups=debug")
    } else {
        DEFAULT_FILTER.to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let tree = HierarchicalLayer::default()
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_indent_amount(2)
        .with_targets(true);

    // A subscriber may already be installed when running under a test harness.
    _ = Registry::default().with(filter).with(tree).try_init();
}
