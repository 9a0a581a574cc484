//! Market matching & balance engine over an injected [`RecordStore`].
//!
//! Every call reads the store afresh; nothing is cached between calls.

use catalog::{Product, Season};
use chrono::{DateTime, Utc};
use market::{MarketSnapshot, MarketSummary, SeasonOutlook, TraderAlert};
use matching::{Match, MatchSummary};
use records::RecordStore;
use risk::{FarmReport, Recommendation};
use tracing::debug;

pub use records::RecordSet;

pub struct MarketEngine<S> {
    store: S,
}

impl<S: RecordStore> MarketEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Balance row for every catalog product, in catalog order.
    pub fn market_snapshot(&self) -> Vec<MarketSnapshot> {
        let farms = self.store.farm_records();
        let demands = self.store.demand_records();
        debug!(
            farm_records = farms.len(),
            demand_records = demands.len(),
            "computing market snapshot"
        );
        market::market_snapshot(&farms, &demands)
    }

    pub fn market_summary(&self) -> MarketSummary {
        market::summarize(&self.market_snapshot())
    }

    pub fn seasonal_summary(&self) -> Vec<SeasonOutlook> {
        market::seasonal_summary(&self.store.farm_records())
    }

    pub fn recommendation(&self, crop: Product, season: Season) -> Recommendation {
        risk::recommendation(crop, season)
    }

    /// One match per catalog product, including products nobody trades.
    pub fn matches(&self) -> Vec<Match> {
        let users = self.store.users();
        let farms = self.store.farm_records();
        let demands = self.store.demand_records();
        debug!(users = users.len(), "computing matches");
        matching::compute_matches(Product::ALL, &users, &farms, &demands)
    }

    pub fn match_summary(&self) -> MatchSummary {
        matching::summarize(&self.matches())
    }

    pub fn trader_alerts(&self, user_id: &str) -> Vec<TraderAlert> {
        market::trader_alerts(
            user_id,
            &self.store.farm_records(),
            &self.store.demand_records(),
        )
    }

    pub fn trader_total_demand(&self, user_id: &str) -> u64 {
        market::trader_total_demand(user_id, &self.store.demand_records())
    }

    /// Report for one planting record; `None` when the record is gone.
    pub fn farm_report(&self, farm_id: &str, generated_at: DateTime<Utc>) -> Option<FarmReport> {
        let farm = self
            .store
            .farm_records_where(|r| r.id == farm_id)
            .into_iter()
            .next()?;
        let owner = self
            .store
            .users()
            .into_iter()
            .find(|u| u.id == farm.user_id)
            .map(|u| u.name)
            .unwrap_or_else(|| "Unknown".to_string());
        Some(FarmReport::new(&owner, farm, generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Period, Role};
    use market::BalanceStatus;
    use matching::MatchStrength;
    use records::{DemandRecord, FarmPlantingRecord, UserRef};
    use risk::RiskLevel;

    fn store() -> RecordSet {
        let user = |id: &str, name: &str, role| UserRef {
            id: id.into(),
            name: name.into(),
            role,
            region: "Asir".into(),
            phone: "0500".into(),
        };
        let farm = |id: &str, user_id: &str, crop, season| FarmPlantingRecord {
            id: id.into(),
            user_id: user_id.into(),
            crop,
            area: "5".into(),
            season,
            submitted_at_ms: 0,
            approved: false,
        };
        let demand = |id: &str, user_id: &str, product, quantity: &str| DemandRecord {
            id: id.into(),
            user_id: user_id.into(),
            product,
            quantity: quantity.into(),
            period: Period::Monthly,
            submitted_at_ms: 0,
            approved: false,
        };
        RecordSet {
            users: vec![
                user("u1", "Fahad", Role::Farmer),
                user("u2", "Lama", Role::Farmer),
                user("u3", "Omar", Role::Trader),
            ],
            farm_records: vec![
                farm("f1", "u1", Product::Wheat, Season::Winter),
                farm("f2", "u2", Product::Wheat, Season::Winter),
                farm("f3", "missing", Product::Dates, Season::Summer),
            ],
            demand_records: vec![
                demand("d1", "u3", Product::Wheat, "100"),
                demand("d2", "u3", Product::Dates, "12"),
            ],
        }
    }

    #[test]
    fn snapshot_over_an_empty_store() {
        let engine = MarketEngine::new(RecordSet::default());
        let rows = engine.market_snapshot();
        assert_eq!(rows.len(), 8);
        assert!(rows.iter().all(|r| r.status == BalanceStatus::Balance));
        assert_eq!(engine.market_summary().balanced, 8);
        assert_eq!(engine.matches().len(), 8);
    }

    #[test]
    fn snapshot_and_matches_follow_store_contents() {
        let engine = MarketEngine::new(store());
        let rows = engine.market_snapshot();
        assert_eq!(rows[0].product, Product::Wheat);
        assert_eq!(rows[0].supply, 20);
        assert_eq!(rows[0].status, BalanceStatus::Shortage);
        assert_eq!(rows[2].status, BalanceStatus::Balance);

        let matches = engine.matches();
        assert_eq!(matches[0].match_strength, MatchStrength::Good);
        assert_eq!(matches[0].farmers.len(), 2);
        assert_eq!(matches[2].match_strength, MatchStrength::Potential);
        assert_eq!(engine.match_summary().good, 1);

        let seasons = engine.seasonal_summary();
        assert_eq!(seasons[1].plantings, 1);
        assert_eq!(seasons[3].plantings, 2);
    }

    #[test]
    fn calls_are_repeatable() {
        let set = store();
        let engine = MarketEngine::new(&set);
        let a = serde_json::to_string(&engine.market_snapshot()).unwrap();
        let b = serde_json::to_string(&engine.market_snapshot()).unwrap();
        assert_eq!(a, b);
        assert_eq!(engine.matches(), engine.matches());
    }

    #[test]
    fn recommendation_and_report() {
        let engine = MarketEngine::new(store());
        let rec = engine.recommendation(Product::Wheat, Season::Winter);
        assert_eq!(rec.risk_level, RiskLevel::Low);

        let now = Utc::now();
        let report = engine.farm_report("f1", now).expect("farm f1 exists");
        assert_eq!(report.owner_name, "Fahad");
        assert_eq!(report.recommendation.risk_level, RiskLevel::Low);

        let orphan = engine.farm_report("f3", now).expect("farm f3 exists");
        assert_eq!(orphan.owner_name, "Unknown");
        assert!(engine.farm_report("nope", now).is_none());
    }

    #[test]
    fn trader_views() {
        let engine = MarketEngine::new(store());
        let alerts = engine.trader_alerts("u3");
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].status, BalanceStatus::Shortage);
        assert_eq!(alerts[1].status, BalanceStatus::Balance);
        assert_eq!(engine.trader_total_demand("u3"), 112);
    }
}
