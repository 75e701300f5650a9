//! Passphrase prompts.

use anyhow::Result;
use zeroize::Zeroizing;

use shaloc_core::crypto::Passphrase;
use shaloc_core::Error;

/// Ask for a passphrase once.
pub fn passphrase() -> Result<Passphrase> {
    let pass = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
    Ok(Passphrase::from(pass.as_str()))
}

/// Ask for a passphrase twice and make sure both entries match.
pub fn confirmed_passphrase() -> Result<Passphrase> {
    let pass1 = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
    let pass2 = Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?);

    if pass1 != pass2 {
        return Err(Error::PassphraseMismatch.into());
    }
    if pass1.is_empty() {
        tracing::warn!("Empty passphrase, the file is only obfuscated");
    }

    Ok(Passphrase::from(pass1.as_str()))
}
