use crate::{DemandRecord, FarmPlantingRecord, UserRef};

/// Read access to the three record collections. The engine only ever reads
/// through this trait; a collection that does not exist yields an empty list.
pub trait RecordStore {
    fn users(&self) -> Vec<UserRef>;
    fn farm_records(&self) -> Vec<FarmPlantingRecord>;
    fn demand_records(&self) -> Vec<DemandRecord>;

    fn farm_records_where<P>(&self, predicate: P) -> Vec<FarmPlantingRecord>
    where
        P: Fn(&FarmPlantingRecord) -> bool,
        Self: Sized,
    {
        self.farm_records().into_iter().filter(|r| predicate(r)).collect()
    }

    fn demand_records_where<P>(&self, predicate: P) -> Vec<DemandRecord>
    where
        P: Fn(&DemandRecord) -> bool,
        Self: Sized,
    {
        self.demand_records().into_iter().filter(|r| predicate(r)).collect()
    }
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn users(&self) -> Vec<UserRef> {
        (**self).users()
    }

    fn farm_records(&self) -> Vec<FarmPlantingRecord> {
        (**self).farm_records()
    }

    fn demand_records(&self) -> Vec<DemandRecord> {
        (**self).demand_records()
    }
}

/// In-memory snapshot of the store contents, in store iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub users: Vec<UserRef>,
    pub farm_records: Vec<FarmPlantingRecord>,
    pub demand_records: Vec<DemandRecord>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.farm_records.is_empty() && self.demand_records.is_empty()
    }

    pub fn user(&self, id: &str) -> Option<&UserRef> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn farm_record(&self, id: &str) -> Option<&FarmPlantingRecord> {
        self.farm_records.iter().find(|r| r.id == id)
    }
}

impl RecordStore for RecordSet {
    fn users(&self) -> Vec<UserRef> {
        self.users.clone()
    }

    fn farm_records(&self) -> Vec<FarmPlantingRecord> {
        self.farm_records.clone()
    }

    fn demand_records(&self) -> Vec<DemandRecord> {
        self.demand_records.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Period, Product, Role, Season};

    fn sample() -> RecordSet {
        RecordSet {
            users: vec![UserRef {
                id: "u1".into(),
                name: "Salem".into(),
                role: Role::Farmer,
                region: "Qassim".into(),
                phone: "0500000000".into(),
            }],
            farm_records: vec![
                FarmPlantingRecord {
                    id: "f1".into(),
                    user_id: "u1".into(),
                    crop: Product::Wheat,
                    area: "4".into(),
                    season: Season::Winter,
                    submitted_at_ms: 1,
                    approved: false,
                },
                FarmPlantingRecord {
                    id: "f2".into(),
                    user_id: "u2".into(),
                    crop: Product::Dates,
                    area: "2".into(),
                    season: Season::Summer,
                    submitted_at_ms: 2,
                    approved: true,
                },
            ],
            demand_records: vec![DemandRecord {
                id: "d1".into(),
                user_id: "t1".into(),
                product: Product::Wheat,
                quantity: "15".into(),
                period: Period::Monthly,
                submitted_at_ms: 3,
                approved: false,
            }],
        }
    }

    #[test]
    fn lists_by_predicate() {
        let set = sample();
        let mine = set.farm_records_where(|r| r.user_id == "u1");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "f1");
        assert!(set.demand_records_where(|r| r.product == Product::Dates).is_empty());
    }

    #[test]
    fn reference_forwards_to_the_store() {
        let set = sample();
        let by_ref: &RecordSet = &set;
        assert_eq!(RecordStore::users(&by_ref).len(), 1);
        assert_eq!(set.user("u1").map(|u| u.name.as_str()), Some("Salem"));
        assert!(set.farm_record("missing").is_none());
        assert!(RecordSet::default().is_empty());
    }
}
