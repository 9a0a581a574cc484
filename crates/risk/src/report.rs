use std::fmt;

use chrono::{DateTime, Utc};
use records::FarmPlantingRecord;
use serde::Serialize;

use crate::{recommendation, Recommendation};

/// Plain-text recommendation report a farmer downloads for one planting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmReport {
    pub owner_name: String,
    pub generated_at: DateTime<Utc>,
    pub farm: FarmPlantingRecord,
    pub recommendation: Recommendation,
}

impl FarmReport {
    pub fn new(owner_name: &str, farm: FarmPlantingRecord, generated_at: DateTime<Utc>) -> Self {
        Self {
            owner_name: owner_name.to_string(),
            generated_at,
            recommendation: recommendation(farm.crop, farm.season),
            farm,
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "Farm-Recommendation-{}-{}.txt",
            self.farm.crop,
            self.generated_at.timestamp_millis()
        )
    }
}

impl fmt::Display for FarmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = &self.recommendation;
        writeln!(f, "FARM RECOMMENDATION REPORT")?;
        writeln!(f, "==========================")?;
        writeln!(f)?;
        writeln!(f, "Farm Owner: {}", self.owner_name)?;
        writeln!(f, "Date: {}", self.generated_at.format("%Y-%m-%d"))?;
        writeln!(f)?;
        writeln!(f, "FARM DATA")?;
        writeln!(f, "---------")?;
        writeln!(f, "Crop: {}", self.farm.crop)?;
        writeln!(f, "Area: {} hectares", self.farm.area)?;
        writeln!(f, "Season: {}", self.farm.season)?;
        writeln!(f)?;
        writeln!(f, "RECOMMENDATIONS")?;
        writeln!(f, "---------------")?;
        writeln!(f, "✓ Recommended Crops:")?;
        for crop in &rec.recommended {
            writeln!(f, "  - {crop}")?;
        }
        writeln!(f, "✗ Avoid Planting:")?;
        for crop in &rec.avoided {
            writeln!(f, "  - {crop}")?;
        }
        writeln!(f)?;
        writeln!(f, "RISK ASSESSMENT")?;
        writeln!(f, "---------------")?;
        writeln!(f, "Risk Level: {:?}", rec.risk_level)?;
        writeln!(f, "{} {}", rec.risk_level.marker(), rec.risk_level.advice())?;
        writeln!(f)?;
        writeln!(f, "MARKET INDICATORS")?;
        writeln!(f, "-----------------")?;
        writeln!(f, "Monitor supply-demand trends at the market analysis section")?;
        writeln!(f, "for the best pricing strategies.")?;
        writeln!(f)?;
        writeln!(f, "Generated by AgroConnect")
    }
}
