//! Loosely typed records as they appear in a browser local-storage dump or a
//! database row. Every field is text until it is converted, so a bad value
//! can be reported per record instead of failing a whole collection.

use catalog::{ParseCatalogError, Period, Product, Role, Season};
use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::{DemandRecord, FarmPlantingRecord, UserRef};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record `{id}` has {source}")]
pub struct RecordError {
    pub id: String,
    #[source]
    pub source: ParseCatalogError,
}

/// The three local-storage keys of the browser client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalStorageDump {
    #[serde(default)]
    pub users: Vec<RawUser>,
    #[serde(default, rename = "farmData")]
    pub farm_data: Vec<RawFarmRecord>,
    #[serde(default, rename = "demandData")]
    pub demand_data: Vec<RawDemandRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub phone: String,
    #[serde(default, deserialize_with = "text")]
    pub region: String,
    #[serde(default, deserialize_with = "text")]
    pub role: String,
    #[serde(default, deserialize_with = "timestamp_ms")]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFarmRecord {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "text")]
    pub crop: String,
    #[serde(default, deserialize_with = "text")]
    pub area: String,
    #[serde(default, deserialize_with = "text")]
    pub season: String,
    #[serde(default, deserialize_with = "timestamp_ms")]
    pub submitted_at: i64,
    #[serde(default, deserialize_with = "flag")]
    pub approved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDemandRecord {
    #[serde(default, deserialize_with = "text")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "text")]
    pub product: String,
    #[serde(default, deserialize_with = "text")]
    pub quantity: String,
    #[serde(default, deserialize_with = "text")]
    pub period: String,
    #[serde(default, deserialize_with = "timestamp_ms")]
    pub submitted_at: i64,
    #[serde(default, deserialize_with = "flag")]
    pub approved: bool,
}

impl RawUser {
    pub fn to_user_ref(&self) -> Result<UserRef, RecordError> {
        Ok(UserRef {
            id: self.id.clone(),
            name: self.name.clone(),
            role: parse_role(&self.role).map_err(|source| RecordError {
                id: self.id.clone(),
                source,
            })?,
            region: self.region.clone(),
            phone: self.phone.clone(),
        })
    }
}

impl TryFrom<RawFarmRecord> for FarmPlantingRecord {
    type Error = RecordError;

    fn try_from(raw: RawFarmRecord) -> Result<Self, Self::Error> {
        let crop: Product = field(&raw.id, &raw.crop)?;
        let season: Season = field(&raw.id, &raw.season)?;
        Ok(FarmPlantingRecord {
            id: raw.id,
            user_id: raw.user_id,
            crop,
            area: raw.area,
            season,
            submitted_at_ms: raw.submitted_at,
            approved: raw.approved,
        })
    }
}

impl TryFrom<RawDemandRecord> for DemandRecord {
    type Error = RecordError;

    fn try_from(raw: RawDemandRecord) -> Result<Self, Self::Error> {
        let product: Product = field(&raw.id, &raw.product)?;
        let period: Period = field(&raw.id, &raw.period)?;
        Ok(DemandRecord {
            id: raw.id,
            user_id: raw.user_id,
            product,
            quantity: raw.quantity,
            period,
            submitted_at_ms: raw.submitted_at,
            approved: raw.approved,
        })
    }
}

fn field<T>(id: &str, value: &str) -> Result<T, RecordError>
where
    T: std::str::FromStr<Err = ParseCatalogError>,
{
    value.parse().map_err(|source| RecordError {
        id: id.to_string(),
        source,
    })
}

/// Role names are also accepted capitalised, as older dumps stored them.
pub fn parse_role(value: &str) -> Result<Role, ParseCatalogError> {
    value.trim().to_ascii_lowercase().parse()
}

fn text<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(de)?, Value::Bool(true)))
}

fn timestamp_ms<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Number(n) => n.as_i64().unwrap_or_default(),
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| ts.timestamp_millis())
            .unwrap_or_default(),
        _ => 0,
    })
}
