//! Pre-planting coordination: which farmers plan a product and which traders
//! want it.

use std::collections::HashSet;

use catalog::{Product, Role};
use records::{DemandRecord, FarmPlantingRecord, UserRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrength {
    /// Two or more farmers and two or more traders.
    Perfect,
    /// At least one on each side.
    Good,
    /// One side is empty.
    Potential,
}

impl MatchStrength {
    pub fn for_counts(farmers: usize, traders: usize) -> Self {
        match (farmers, traders) {
            (0, _) | (_, 0) => MatchStrength::Potential,
            (f, t) if f >= 2 && t >= 2 => MatchStrength::Perfect,
            _ => MatchStrength::Good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub product: Product,
    pub farmers: Vec<UserRef>,
    pub traders: Vec<UserRef>,
    pub match_strength: MatchStrength,
}

impl Match {
    pub fn has_participants(&self) -> bool {
        !self.farmers.is_empty() || !self.traders.is_empty()
    }
}

/// One [`Match`] per requested product, participants in user-list order.
pub fn compute_matches(
    products: &[Product],
    users: &[UserRef],
    farm_records: &[FarmPlantingRecord],
    demand_records: &[DemandRecord],
) -> Vec<Match> {
    products
        .iter()
        .map(|&product| {
            let planting: HashSet<&str> = farm_records
                .iter()
                .filter(|r| r.crop == product)
                .map(|r| r.user_id.as_str())
                .collect();
            let demanding: HashSet<&str> = demand_records
                .iter()
                .filter(|r| r.product == product)
                .map(|r| r.user_id.as_str())
                .collect();

            let farmers = participants(users, Role::Farmer, &planting);
            let traders = participants(users, Role::Trader, &demanding);
            Match {
                product,
                match_strength: MatchStrength::for_counts(farmers.len(), traders.len()),
                farmers,
                traders,
            }
        })
        .collect()
}

fn participants(users: &[UserRef], role: Role, ids: &HashSet<&str>) -> Vec<UserRef> {
    let mut seen = HashSet::new();
    users
        .iter()
        .filter(|u| u.role == role && ids.contains(u.id.as_str()))
        .filter(|u| seen.insert(u.id.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub perfect: usize,
    pub good: usize,
    pub potential: usize,
}

pub fn summarize(matches: &[Match]) -> MatchSummary {
    let mut summary = MatchSummary::default();
    for m in matches {
        match m.match_strength {
            MatchStrength::Perfect => summary.perfect += 1,
            MatchStrength::Good => summary.good += 1,
            MatchStrength::Potential => summary.potential += 1,
        }
    }
    summary
}
