//! Display formatting for the HUD
//!
//! Balance abbreviation and the free-reward countdown.

/// Scale suffixes, one per power of 1000
const SUFFIXES: [&str; 7] = ["", "K", "M", "B", "T", "Qa", "Qi"];

/// Format a balance with a scale suffix (`999`, `1.5K`, `2.35M`)
///
/// Values are truncated, never rounded up, so the display never shows more
/// than the player holds. At most two decimals are kept.
pub fn format_balance(balance: u64) -> String {
    if balance < 1000 {
        return balance.to_string();
    }

    let mut scale = 0;
    let mut divisor = 1u64;
    while scale + 1 < SUFFIXES.len() && balance / divisor >= 1000 {
        divisor *= 1000;
        scale += 1;
    }

    let whole = balance / divisor;
    // Hundredths of a unit at this scale, truncated
    let hundredths = (balance % divisor) / (divisor / 100);

    let text = if hundredths == 0 {
        whole.to_string()
    } else if hundredths % 10 == 0 {
        format!("{}.{}", whole, hundredths / 10)
    } else {
        format!("{}.{:02}", whole, hundredths)
    };
    format!("{}{}", text, SUFFIXES[scale])
}

/// Format milliseconds as `MM:SS`
pub fn format_countdown(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}
