//! Clean command implementation.

use anyhow::Result;

use shaloc_core::file::{clean_temp_artifacts, TEMP_PREFIX};

/// Run the clean command.
pub fn run() -> Result<()> {
    let temp_dir = std::env::temp_dir();
    let removed = clean_temp_artifacts(&temp_dir)?;

    if removed.is_empty() {
        println!("Nothing to clean in {}", temp_dir.display());
        return Ok(());
    }

    for path in &removed {
        println!("Removed {}", path.display());
    }
    println!(
        "Removed {} temporary {}* entr{} from {}",
        removed.len(),
        TEMP_PREFIX,
        if removed.len() == 1 { "y" } else { "ies" },
        temp_dir.display()
    );
    Ok(())
}
