//! Decrypt command implementation.

use anyhow::{Context, Result};

use shaloc_core::crypto::decrypt_file;

use super::DecryptArgs;

/// Run the decrypt command: `FILE` becomes `FILE.dec`.
pub async fn run(args: DecryptArgs) -> Result<()> {
    shaloc_core::file::check_regular_file(&args.file)?;
    let passphrase = crate::prompt::passphrase()?;

    let decrypted = decrypt_file(&args.file, &passphrase)
        .await
        .with_context(|| format!("Failed to decrypt {}", args.file.display()))?;

    tokio::fs::remove_file(&args.file)
        .await
        .with_context(|| format!("Failed to remove {}", args.file.display()))?;

    println!(
        "Decrypted {} in {}",
        args.file.display(),
        decrypted.display()
    );
    Ok(())
}
