//! Analysis tiers and tier selection

use serde::{Deserialize, Serialize};

/// Named analysis mode, trading completeness for latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Structure + text, large schema, single long attempt
    Full,
    /// Truncated text, small schema
    Lite,
    /// Truncated text, two-field schema
    #[serde(rename = "superlite")]
    SuperLite,
    /// Short excerpt, two-field schema
    #[serde(rename = "ultralite")]
    UltraLite,
}

impl Tier {
    /// Label used in user-facing messages
    pub fn label(self) -> &'static str {
        match self {
            Tier::Full => "Full",
            Tier::Lite => "Lite",
            Tier::SuperLite => "Super-lite",
            Tier::UltraLite => "Instant",
        }
    }

    /// Message attached to a successful model analysis
    pub fn success_message(self) -> &'static str {
        match self {
            Tier::Full => "Analysis complete.",
            Tier::Lite => "Lite analysis complete.",
            Tier::SuperLite => "Super-lite analysis complete.",
            Tier::UltraLite => "Instant analysis complete.",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Full => "full",
            Tier::Lite => "lite",
            Tier::SuperLite => "superlite",
            Tier::UltraLite => "ultralite",
        };
        f.write_str(name)
    }
}

/// Tier-forcing signals, from a request body or from the environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFlags {
    #[serde(default)]
    pub ultralite: bool,
    #[serde(default)]
    pub superlite: bool,
    #[serde(default)]
    pub lite: bool,
}

impl TierFlags {
    /// Combine two signal sources; a tier requested by either is requested
    pub fn merge(self, other: TierFlags) -> TierFlags {
        TierFlags {
            ultralite: self.ultralite || other.ultralite,
            superlite: self.superlite || other.superlite,
            lite: self.lite || other.lite,
        }
    }

    /// Cheapest requested tier wins: ultralite > superlite > lite > full
    pub fn select(self) -> Tier {
        if self.ultralite {
            Tier::UltraLite
        } else if self.superlite {
            Tier::SuperLite
        } else if self.lite {
            Tier::Lite
        } else {
            Tier::Full
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_selects_full() {
        assert_eq!(TierFlags::default().select(), Tier::Full);
    }

    #[test]
    fn test_ultralite_beats_superlite() {
        let flags = TierFlags {
            ultralite: true,
            superlite: true,
            lite: false,
        };
        assert_eq!(flags.select(), Tier::UltraLite);
    }

    #[test]
    fn test_superlite_beats_lite() {
        let flags = TierFlags {
            ultralite: false,
            superlite: true,
            lite: true,
        };
        assert_eq!(flags.select(), Tier::SuperLite);
    }

    #[test]
    fn test_merge_environment_and_request() {
        let env = TierFlags {
            lite: true,
            ..Default::default()
        };
        let request = TierFlags {
            ultralite: true,
            ..Default::default()
        };
        assert_eq!(env.merge(request).select(), Tier::UltraLite);
        assert_eq!(env.merge(TierFlags::default()).select(), Tier::Lite);
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_value(Tier::SuperLite).unwrap(), "superlite");
        assert_eq!(serde_json::to_value(Tier::UltraLite).unwrap(), "ultralite");
        assert_eq!(Tier::SuperLite.to_string(), "superlite");
    }
}
