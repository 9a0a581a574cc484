//! Supply/demand balance per catalog product.

mod balance;
mod supply;

pub use balance::{classify, BalanceStatus, Classification, PriceIndicator};
pub use supply::{aggregate_demand, estimate_supply};

use std::collections::BTreeMap;

use catalog::{Product, Season};
use records::{DemandRecord, FarmPlantingRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub product: Product,
    pub supply: u64,
    pub demand: u64,
    pub status: BalanceStatus,
    pub price_indicator: PriceIndicator,
    /// Dominant planting season, `None` (shown as "All") without plantings.
    #[serde(with = "season_or_all")]
    pub season: Option<Season>,
}

impl MarketSnapshot {
    pub fn season_label(&self) -> &'static str {
        self.season.map(Season::as_str).unwrap_or(season_or_all::ALL)
    }
}

/// One row per catalog product, in catalog order.
pub fn market_snapshot(
    farm_records: &[FarmPlantingRecord],
    demand_records: &[DemandRecord],
) -> Vec<MarketSnapshot> {
    let supply = estimate_supply(farm_records);
    let demand = aggregate_demand(demand_records);

    Product::ALL
        .iter()
        .map(|&product| {
            let supply = supply.get(&product).copied().unwrap_or_default();
            let demand = demand.get(&product).copied().unwrap_or_default();
            let Classification {
                status,
                price_indicator,
            } = classify(supply, demand);
            MarketSnapshot {
                product,
                supply,
                demand,
                status,
                price_indicator,
                season: dominant_season(farm_records, product),
            }
        })
        .collect()
}

/// Most frequent season among `product`'s plantings; ties go to the earlier
/// season in the year.
fn dominant_season(farm_records: &[FarmPlantingRecord], product: Product) -> Option<Season> {
    let mut counts: BTreeMap<Season, usize> = BTreeMap::new();
    for record in farm_records.iter().filter(|r| r.crop == product) {
        *counts.entry(record.season).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(Season, usize)>, (season, n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((season, n)),
        })
        .map(|(season, _)| season)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub products: usize,
    pub shortages: usize,
    pub balanced: usize,
    pub surpluses: usize,
}

pub fn summarize(snapshot: &[MarketSnapshot]) -> MarketSummary {
    let mut summary = MarketSummary {
        products: snapshot.len(),
        ..Default::default()
    };
    for row in snapshot {
        match row.status {
            BalanceStatus::Shortage => summary.shortages += 1,
            BalanceStatus::Balance => summary.balanced += 1,
            BalanceStatus::Surplus => summary.surpluses += 1,
        }
    }
    summary
}

/// Alert shown beside a single demand line on the trader dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderAlert {
    pub demand_id: String,
    pub product: Product,
    pub supply: u64,
    pub quantity: u64,
    pub status: BalanceStatus,
    pub message: String,
}

/// Alerts for each of `user_id`'s demand lines, comparing the product's
/// whole estimated supply against that one line.
pub fn trader_alerts(
    user_id: &str,
    farm_records: &[FarmPlantingRecord],
    demand_records: &[DemandRecord],
) -> Vec<TraderAlert> {
    let supply = estimate_supply(farm_records);
    demand_records
        .iter()
        .filter(|d| d.user_id == user_id)
        .map(|d| {
            let supply = supply.get(&d.product).copied().unwrap_or_default();
            let quantity = d.units();
            let status = classify(supply, quantity).status;
            TraderAlert {
                demand_id: d.id.clone(),
                product: d.product,
                supply,
                quantity,
                status,
                message: status.alert_message().to_string(),
            }
        })
        .collect()
}

/// Sum of one trader's own demand quantities.
pub fn trader_total_demand(user_id: &str, demand_records: &[DemandRecord]) -> u64 {
    demand_records
        .iter()
        .filter(|d| d.user_id == user_id)
        .fold(0u64, |acc, d| acc.saturating_add(d.units()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonOutlook {
    pub season: Season,
    pub plantings: usize,
    pub outlook: String,
}

/// One row per season in calendar order, with the number of plantings
/// submitted for it.
pub fn seasonal_summary(farm_records: &[FarmPlantingRecord]) -> Vec<SeasonOutlook> {
    Season::ALL
        .iter()
        .map(|&season| SeasonOutlook {
            season,
            plantings: farm_records.iter().filter(|f| f.season == season).count(),
            outlook: season.outlook().to_string(),
        })
        .collect()
}

mod season_or_all {
    use catalog::Season;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const ALL: &str = "All";

    pub fn serialize<S: Serializer>(season: &Option<Season>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(season.map(Season::as_str).unwrap_or(ALL))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Season>, D::Error> {
        let label = String::deserialize(de)?;
        if label == ALL {
            return Ok(None);
        }
        label.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
