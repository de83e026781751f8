//! Rejections for player actions
//!
//! Every variant is a deterministic refusal: the action had no effect on the
//! balance or the simulation.

/// Why a drop, redemption, or ad request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// Bet is below the table minimum
    BetBelowMinimum { bet: u64, minimum: u64 },
    /// Drop request asked for zero balls
    NoBalls,
    /// Balance does not cover the requested amount
    InsufficientBalance { required: u64, available: u64 },
    /// Balance has not reached the redemption threshold
    BelowRedeemThreshold { balance: u64, minimum: u64 },
    /// Player declined the redemption prompt
    RedeemDeclined,
    /// Ad reward still cooling down
    AdCooldown { remaining_ms: u64 },
    /// An ad is already playing
    AdInProgress,
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::BetBelowMinimum { bet, minimum } => {
                write!(f, "bet {} is below the minimum of {}", bet, minimum)
            }
            GameError::NoBalls => write!(f, "at least one ball must be dropped"),
            GameError::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "insufficient balance: {} required, {} available",
                required, available
            ),
            GameError::BelowRedeemThreshold { balance, minimum } => write!(
                f,
                "balance {} is below the redemption minimum of {}",
                balance, minimum
            ),
            GameError::RedeemDeclined => write!(f, "redemption declined"),
            GameError::AdCooldown { remaining_ms } => write!(
                f,
                "next ad available in {}",
                crate::format::format_countdown(*remaining_ms)
            ),
            GameError::AdInProgress => write!(f, "an ad is already playing"),
        }
    }
}

impl std::error::Error for GameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = GameError::InsufficientBalance {
            required: 100,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: 100 required, 40 available"
        );

        let err = GameError::AdCooldown {
            remaining_ms: 65_000,
        };
        assert_eq!(err.to_string(), "next ad available in 01:05");
    }
}
