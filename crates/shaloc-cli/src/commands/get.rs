//! Get command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use shaloc_core::crypto::decrypt_file;
use shaloc_core::fetch::{download, output_name_from_url};
use shaloc_core::file::format_size;

use super::GetArgs;

/// Run the get command.
pub async fn run(args: GetArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(output_name_from_url(&args.url)));

    let passphrase = if args.aes {
        Some(crate::prompt::confirmed_passphrase()?)
    } else {
        None
    };

    let written = download(&args.url, &output).await?;
    println!(
        "Downloaded {} from {} ({})",
        output.display(),
        args.url,
        format_size(written)
    );

    if let Some(passphrase) = passphrase {
        let decrypted = decrypt_file(&output, &passphrase)
            .await
            .with_context(|| format!("Failed to decrypt {}", output.display()))?;
        tokio::fs::rename(&decrypted, &output)
            .await
            .with_context(|| format!("Failed to replace {}", output.display()))?;
        println!("Decrypted {}", output.display());
    }

    Ok(())
}
