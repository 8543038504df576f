use std::time::Duration;

use rand::{TryRngCore, rngs::OsRng};

use crate::error::AuthError;

/// Length of the state token issued per authorization attempt.
pub const STATE_TOKEN_LENGTH: usize = 32;

/// Generates an unpredictable hex string of exactly `length` characters.
///
/// Bytes come from the operating system RNG. If it cannot supply them the
/// call fails with [`AuthError::Entropy`] rather than falling back to a
/// weaker source.
pub fn generate_state(length: usize) -> Result<String, AuthError> {
    let mut bytes = vec![0u8; length.div_ceil(2)];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;

    let mut state = hex::encode(bytes);
    state.truncate(length);
    Ok(state)
}

/// Masks a secret for display.
///
/// Up to 8 characters are fully replaced by asterisks. Longer values keep
/// their first and last 4 characters. The output always has the same
/// character count as the input. Never use the result for comparisons.
pub fn mask_string(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

/// Human readable form of a wait budget, e.g. `5 minutes` or `30 seconds`.
pub fn format_duration(duration: &Duration) -> String {
    let secs = duration.as_secs();
    let whole = duration.subsec_nanos() == 0;

    if whole && secs >= 60 && secs % 60 == 0 {
        plural(secs / 60, "minute")
    } else if whole && secs > 0 {
        plural(secs, "second")
    } else {
        format!("{} milliseconds", duration.as_millis())
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
