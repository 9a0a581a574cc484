use serde::{Deserialize, Serialize};

use catalog::Role;

use crate::{DemandRecord, FarmPlantingRecord, RecordSet, UserRef};

const UNKNOWN_OWNER: &str = "Unknown";

/// A record shown to an administrator together with its owner's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listed<T> {
    #[serde(flatten)]
    pub record: T,
    pub user_name: String,
}

/// Head-count figures shown above the admin listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
    pub total_users: usize,
    pub farmers: usize,
    pub traders: usize,
    /// Unapproved farm and demand records together.
    pub pending: usize,
    pub approved_farm_records: usize,
    pub approved_demand_records: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationQueue {
    pub stats: ModerationStats,
    pub users: Vec<UserRef>,
    pub farm_records: Vec<Listed<FarmPlantingRecord>>,
    pub demand_records: Vec<Listed<DemandRecord>>,
}

impl RecordSet {
    pub fn moderation_stats(&self) -> ModerationStats {
        let with_role = |role| self.users.iter().filter(|u| u.role == role).count();
        let approved_farm_records = self.farm_records.iter().filter(|r| r.approved).count();
        let approved_demand_records = self.demand_records.iter().filter(|r| r.approved).count();
        ModerationStats {
            total_users: self.users.len(),
            farmers: with_role(Role::Farmer),
            traders: with_role(Role::Trader),
            pending: self.farm_records.len() - approved_farm_records
                + self.demand_records.len()
                - approved_demand_records,
            approved_farm_records,
            approved_demand_records,
        }
    }

    pub fn moderation_queue(&self) -> ModerationQueue {
        let owner = |user_id: &str| {
            self.user(user_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
        };
        ModerationQueue {
            stats: self.moderation_stats(),
            users: self.users.clone(),
            farm_records: self
                .farm_records
                .iter()
                .map(|r| Listed {
                    user_name: owner(&r.user_id),
                    record: r.clone(),
                })
                .collect(),
            demand_records: self
                .demand_records
                .iter()
                .map(|r| Listed {
                    user_name: owner(&r.user_id),
                    record: r.clone(),
                })
                .collect(),
        }
    }
}
