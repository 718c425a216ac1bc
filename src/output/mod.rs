mod exports;
mod styling;
mod summary;
mod tables;

pub use exports::{export_deployment, export_feed};
use styling::{banner, muted};
pub use summary::{print_deployment_summary, print_feed_summary};

/// Prints the `glactivity` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        banner("🗒  glactivity"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("GitLab activity feeds and deployment status")
    );
}
