//! Serve command implementation: plain, unbounded sharing.

use anyhow::Result;

use shaloc_core::session::DownloadLimit;

use super::ServeArgs;

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = super::load_config().share;
    super::share::serve_source(&args.source, &args.bind, &config, DownloadLimit::Unbounded, None)
        .await
}
