const VISIBLE_PREFIX: usize = 6;

/// Mask a credential for log output, keeping a short prefix.
pub fn mask_token(token: &str) -> String {
    let total = token.chars().count();
    if total <= VISIBLE_PREFIX {
        return "[MASKED]".to_string();
    }
    let prefix: String = token.chars().take(VISIBLE_PREFIX).collect();
    format!("{prefix}…[MASKED {} chars]", total - VISIBLE_PREFIX)
}
