//! Planting risk for a (crop, season) pair and the crop suggestions shown
//! next to a farm record.

mod report;

pub use report::FarmReport;

use catalog::{Product, Season};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn advice(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk - Good conditions for planting",
            RiskLevel::Medium => "Medium risk - Consider market conditions",
            RiskLevel::High => "High risk - Check weather and market before planting",
        }
    }

    /// Prefix printed before [`RiskLevel::advice`] in reports.
    pub fn marker(self) -> char {
        match self {
            RiskLevel::Low => '✓',
            RiskLevel::Medium | RiskLevel::High => '⚠',
        }
    }
}

use RiskLevel::{High, Low, Medium};

// Columns follow `Season::ALL`: Spring, Summer, Fall, Winter.
const RISK_TABLE: [(Product, [RiskLevel; 4]); 8] = [
    (Product::Wheat, [Low, High, Medium, Low]),
    (Product::Barley, [Low, High, Medium, Low]),
    (Product::Dates, [Low, Low, Medium, High]),
    (Product::Tomatoes, [Low, High, Medium, High]),
    (Product::Cucumber, [Medium, High, Low, High]),
    (Product::Carrot, [Low, High, Low, Medium]),
    (Product::Onion, [Low, Medium, Low, Medium]),
    (Product::Potato, [Medium, High, Medium, Low]),
];

/// Table lookup; a pair missing from the table is `Medium`.
pub fn assess_risk(crop: Product, season: Season) -> RiskLevel {
    let column = Season::ALL.iter().position(|&s| s == season);
    RISK_TABLE
        .iter()
        .find(|(product, _)| *product == crop)
        .zip(column)
        .map(|((_, row), column)| row[column])
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub crop: Product,
    pub season: Season,
    pub recommended: Vec<Product>,
    pub avoided: Vec<Product>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSuggestions {
    pub recommended: Vec<Product>,
    pub avoided: Vec<Product>,
}

const AVOIDED: usize = 2;
const RECOMMENDED: usize = 3;

/// Positional placeholder, not an agronomic ranking: of the other catalog
/// products, the first two are avoided and the next three recommended.
pub fn recommend(crop: Product) -> CropSuggestions {
    let mut others = Product::ALL.iter().copied().filter(|&p| p != crop);
    let avoided: Vec<Product> = others.by_ref().take(AVOIDED).collect();
    let recommended = others.take(RECOMMENDED).collect();
    CropSuggestions {
        recommended,
        avoided,
    }
}

pub fn recommendation(crop: Product, season: Season) -> Recommendation {
    let CropSuggestions {
        recommended,
        avoided,
    } = recommend(crop);
    Recommendation {
        crop,
        season,
        recommended,
        avoided,
        risk_level: assess_risk(crop, season),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_is_in_the_table() {
        for &crop in Product::ALL {
            assert!(RISK_TABLE.iter().any(|(p, _)| *p == crop), "{crop} missing");
        }
        assert_eq!(assess_risk(Product::Wheat, Season::Summer), High);
        assert_eq!(assess_risk(Product::Dates, Season::Summer), Low);
        assert_eq!(assess_risk(Product::Cucumber, Season::Fall), Low);
        assert_eq!(assess_risk(Product::Onion, Season::Winter), Medium);
        assert_eq!(assess_risk(Product::Potato, Season::Winter), Low);
        assert_eq!(assess_risk(Product::Tomatoes, Season::Winter), High);
    }

    #[test]
    fn positional_suggestions() {
        let wheat = recommend(Product::Wheat);
        assert_eq!(wheat.avoided, vec![Product::Barley, Product::Dates]);
        assert_eq!(
            wheat.recommended,
            vec![Product::Tomatoes, Product::Cucumber, Product::Carrot]
        );

        let dates = recommend(Product::Dates);
        assert_eq!(dates.avoided, vec![Product::Wheat, Product::Barley]);
        assert_eq!(
            dates.recommended,
            vec![Product::Tomatoes, Product::Cucumber, Product::Carrot]
        );
    }

    #[test]
    fn suggestions_never_include_the_crop_and_are_disjoint() {
        for &crop in Product::ALL {
            let s = recommend(crop);
            assert!(!s.recommended.contains(&crop));
            assert!(!s.avoided.contains(&crop));
            assert!(s.recommended.iter().all(|p| !s.avoided.contains(p)));
            assert!(s.recommended.len() + s.avoided.len() + 1 <= Product::ALL.len());
        }
    }

    #[test]
    fn recommendation_takes_risk_from_the_table() {
        let rec = recommendation(Product::Cucumber, Season::Summer);
        assert_eq!(rec.risk_level, High);
        assert_eq!(rec.avoided, vec![Product::Wheat, Product::Barley]);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["riskLevel"], "High");
        assert_eq!(json["crop"], "Cucumber");
    }
}
