use crate::config::clamp_u32;

const BACKOFF_BASE_MIN_MS: u32 = 10;
const BACKOFF_MAX_CAP_MS: u32 = 300_000;

/// Delay applied before re-associating after a disconnection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Re-associate as soon as the disconnection is seen.
    #[default]
    Immediate,
    /// Doubles per consecutive disconnection, starting at `base_ms`, capped at `max_ms`.
    Backoff { base_ms: u32, max_ms: u32 },
}

impl RetryPolicy {
    pub const fn sanitized(self) -> Self {
        match self {
            Self::Immediate => Self::Immediate,
            Self::Backoff { base_ms, max_ms } => {
                let base_ms = clamp_u32(base_ms, BACKOFF_BASE_MIN_MS, BACKOFF_MAX_CAP_MS);
                let max_ms = clamp_u32(max_ms, base_ms, BACKOFF_MAX_CAP_MS);
                Self::Backoff { base_ms, max_ms }
            }
        }
    }

    /// `streak` counts consecutive disconnections without an address in between, from 1.
    pub fn delay_ms(self, streak: u32) -> u32 {
        match self {
            Self::Immediate => 0,
            Self::Backoff { base_ms, max_ms } => {
                let shift = streak.saturating_sub(1).min(31);
                base_ms
                    .checked_mul(1u32 << shift)
                    .unwrap_or(u32::MAX)
                    .min(max_ms)
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Backoff { .. } => "backoff",
        }
    }
}
