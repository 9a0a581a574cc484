use std::collections::BTreeMap;

use catalog::{Product, UNITS_PER_FARM};
use records::{DemandRecord, FarmPlantingRecord};

/// Estimated supply per product: a fixed yield for every planting record.
/// Every catalog product is present in the result.
pub fn estimate_supply(farm_records: &[FarmPlantingRecord]) -> BTreeMap<Product, u64> {
    let mut supply = zeroed();
    for record in farm_records {
        if let Some(units) = supply.get_mut(&record.crop) {
            *units = units.saturating_add(UNITS_PER_FARM);
        }
    }
    supply
}

/// Requested quantity per product. Quantities that do not parse count as 0.
pub fn aggregate_demand(demand_records: &[DemandRecord]) -> BTreeMap<Product, u64> {
    let mut demand = zeroed();
    for record in demand_records {
        if let Some(units) = demand.get_mut(&record.product) {
            *units = units.saturating_add(record.units());
        }
    }
    demand
}

fn zeroed() -> BTreeMap<Product, u64> {
    Product::ALL.iter().map(|&p| (p, 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Period, Season};

    fn farm(crop: Product) -> FarmPlantingRecord {
        FarmPlantingRecord {
            id: format!("{crop}-farm"),
            user_id: "u".into(),
            crop,
            area: "3".into(),
            season: Season::Spring,
            submitted_at_ms: 0,
            approved: false,
        }
    }

    fn demand(product: Product, quantity: &str, approved: bool) -> DemandRecord {
        DemandRecord {
            id: format!("{product}-{quantity}"),
            user_id: "t".into(),
            product,
            quantity: quantity.into(),
            period: Period::Daily,
            submitted_at_ms: 0,
            approved,
        }
    }

    #[test]
    fn supply_is_ten_units_per_planting() {
        let records = vec![farm(Product::Wheat), farm(Product::Wheat), farm(Product::Potato)];
        let supply = estimate_supply(&records);
        assert_eq!(supply.len(), Product::ALL.len());
        assert_eq!(supply[&Product::Wheat], 20);
        assert_eq!(supply[&Product::Potato], 10);
        assert_eq!(supply[&Product::Dates], 0);
        assert_eq!(supply.values().sum::<u64>(), 10 * records.len() as u64);
    }

    #[test]
    fn approval_does_not_change_supply() {
        let mut approved = farm(Product::Carrot);
        approved.approved = true;
        let supply = estimate_supply(&[approved, farm(Product::Carrot)]);
        assert_eq!(supply[&Product::Carrot], 20);
    }

    #[test]
    fn demand_sums_parseable_quantities() {
        let records = vec![
            demand(Product::Onion, "100", false),
            demand(Product::Onion, "25", true),
            demand(Product::Onion, "a lot", false),
            demand(Product::Barley, "", false),
        ];
        let demand = aggregate_demand(&records);
        assert_eq!(demand[&Product::Onion], 125);
        assert_eq!(demand[&Product::Barley], 0);
        assert_eq!(demand[&Product::Cucumber], 0);
        assert_eq!(demand.len(), 8);
    }

    #[test]
    fn empty_inputs_give_complete_zero_maps() {
        assert!(estimate_supply(&[]).values().all(|&v| v == 0));
        assert_eq!(aggregate_demand(&[]).len(), Product::ALL.len());
    }
}
