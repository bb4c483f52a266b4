//! How a run ended and what to tell the player

use serde::{Deserialize, Serialize};

use crate::tuning::EndingTiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Closing message bracket, keyed on final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndingTier {
    Modest,
    Solid,
    Stellar,
}

impl EndingTier {
    pub fn for_score(score: u64, tiers: &EndingTiers) -> Self {
        if score < tiers.modest_below {
            EndingTier::Modest
        } else if score < tiers.solid_below {
            EndingTier::Solid
        } else {
            EndingTier::Stellar
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            EndingTier::Modest => "You barely made it! Better luck next time!",
            EndingTier::Solid => "You made it! Nice job!",
            EndingTier::Stellar => "Amazing! You saved the Earth with style!",
        }
    }
}

/// Final result of a terminal run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    pub outcome: Outcome,
    pub tier: EndingTier,
    pub score: u64,
}

impl Ending {
    pub fn message(&self) -> &'static str {
        self.tier.message()
    }
}
