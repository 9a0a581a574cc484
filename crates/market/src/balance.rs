use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Shortage,
    Balance,
    Surplus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceIndicator {
    Low,
    Normal,
    High,
}

impl BalanceStatus {
    pub fn alert_message(self) -> &'static str {
        match self {
            BalanceStatus::Shortage => "Supply below demand - potential shortage",
            BalanceStatus::Surplus => "Supply exceeds demand - potential surplus",
            BalanceStatus::Balance => "Supply and demand balanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub status: BalanceStatus,
    pub price_indicator: PriceIndicator,
}

/// Shortage below 80% of demand, surplus above 120%, balance otherwise.
///
/// The thresholds are compared exactly as `5·supply` against `4·demand` and
/// `6·demand`, so there is no float rounding at the boundaries.
pub fn classify(supply: u64, demand: u64) -> Classification {
    let scaled_supply = u128::from(supply) * 5;
    let demand = u128::from(demand);

    if scaled_supply < demand * 4 {
        Classification {
            status: BalanceStatus::Shortage,
            price_indicator: PriceIndicator::High,
        }
    } else if scaled_supply > demand * 6 {
        Classification {
            status: BalanceStatus::Surplus,
            price_indicator: PriceIndicator::Low,
        }
    } else {
        Classification {
            status: BalanceStatus::Balance,
            price_indicator: PriceIndicator::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(supply: u64, demand: u64) -> BalanceStatus {
        classify(supply, demand).status
    }

    #[test]
    fn boundaries() {
        assert_eq!(status(7, 10), BalanceStatus::Shortage);
        assert_eq!(status(8, 10), BalanceStatus::Balance);
        assert_eq!(status(12, 10), BalanceStatus::Balance);
        assert_eq!(status(13, 10), BalanceStatus::Surplus);
        assert_eq!(status(8, 11), BalanceStatus::Shortage);
        assert_eq!(status(9, 11), BalanceStatus::Balance);
        assert_eq!(status(13, 11), BalanceStatus::Balance);
        assert_eq!(status(14, 11), BalanceStatus::Surplus);
    }

    #[test]
    fn zero_demand() {
        assert_eq!(
            classify(0, 0),
            Classification {
                status: BalanceStatus::Balance,
                price_indicator: PriceIndicator::Normal,
            }
        );
        assert_eq!(
            classify(10, 0),
            Classification {
                status: BalanceStatus::Surplus,
                price_indicator: PriceIndicator::Low,
            }
        );
        assert_eq!(classify(0, 1).price_indicator, PriceIndicator::High);
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        assert_eq!(status(u64::MAX, u64::MAX), BalanceStatus::Balance);
        assert_eq!(status(0, u64::MAX), BalanceStatus::Shortage);
        assert_eq!(status(u64::MAX, 1), BalanceStatus::Surplus);
    }

    #[test]
    fn indicator_follows_status() {
        for supply in 0..40 {
            for demand in 0..40 {
                let c = classify(supply, demand);
                let expected = match c.status {
                    BalanceStatus::Shortage => PriceIndicator::High,
                    BalanceStatus::Balance => PriceIndicator::Normal,
                    BalanceStatus::Surplus => PriceIndicator::Low,
                };
                assert_eq!(c.price_indicator, expected, "{supply}/{demand}");
            }
        }
    }
}
