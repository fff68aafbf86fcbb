use anyhow::{Result, bail};

/// Validate a kubeconfig context name received from a client.
/// Rules: non-empty, max 253 chars, no whitespace or control characters.
pub fn validate_context_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("context name must not be empty");
    }
    if name.len() > 253 {
        bail!("context name exceeds 253 characters (got {})", name.len());
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        bail!("context name '{}' must not contain whitespace or control characters", name.escape_debug());
    }
    Ok(())
}
