use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::Utc;
use records::raw::{LocalStorageDump, RawDemandRecord, RawFarmRecord, RawUser, RecordError};
use records::{
    DemandRecord, FarmPlantingRecord, NewDemandRecord, NewFarmRecord, NewUser, RecordSet, UserRef,
};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

pub const INIT_SQL: &str = include_str!("../../../scripts/init_db.sql");

pub const REQUIRED_TABLES: &[&str] = &["users", "farm_records", "demand_records", "incidents"];

const MEMORY_PREFIX: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    region: String,
    role: String,
    created_at_ms: i64,
}

#[derive(Debug, FromRow)]
struct FarmRow {
    id: String,
    user_id: String,
    crop: String,
    area: String,
    season: String,
    submitted_at_ms: i64,
    approved: bool,
}

#[derive(Debug, FromRow)]
struct DemandRow {
    id: String,
    user_id: String,
    product: String,
    quantity: String,
    period: String,
    submitted_at_ms: i64,
    approved: bool,
}

impl From<UserRow> for RawUser {
    fn from(row: UserRow) -> Self {
        RawUser {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            region: row.region,
            role: row.role,
            created_at: row.created_at_ms,
        }
    }
}

impl From<FarmRow> for RawFarmRecord {
    fn from(row: FarmRow) -> Self {
        RawFarmRecord {
            id: row.id,
            user_id: row.user_id,
            crop: row.crop,
            area: row.area,
            season: row.season,
            submitted_at: row.submitted_at_ms,
            approved: row.approved,
        }
    }
}

impl From<DemandRow> for RawDemandRecord {
    fn from(row: DemandRow) -> Self {
        RawDemandRecord {
            id: row.id,
            user_id: row.user_id,
            product: row.product,
            quantity: row.quantity,
            period: row.period,
            submitted_at: row.submitted_at_ms,
            approved: row.approved,
        }
    }
}

/// Outcome of importing a browser local-storage dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub users: usize,
    pub farm_records: usize,
    pub demand_records: usize,
    pub rejected: Vec<String>,
}

impl Store {
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?.create_if_missing(true);
        let pool_options = if path.starts_with(MEMORY_PREFIX) {
            // every connection would open its own empty memory database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        run_init_sql(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn validate_required_tables(&self) -> Result<Vec<String>> {
        let present: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;
        Ok(REQUIRED_TABLES
            .iter()
            .filter(|table| !present.iter().any(|(name,)| name == *table))
            .map(|table| table.to_string())
            .collect())
    }

    pub async fn register_user(&self, user: &NewUser) -> Result<UserRef> {
        if user.name.trim().is_empty() || user.email.trim().is_empty() {
            bail!("name and email are required");
        }
        let (taken,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?;
        if taken > 0 {
            bail!("email already registered");
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO users (id, name, email, phone, region, role, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.region)
        .bind(user.role.as_str())
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        info!(user_id = %id, role = %user.role, "user registered");

        Ok(UserRef {
            id,
            name: user.name.clone(),
            role: user.role,
            region: user.region.clone(),
            phone: user.phone.clone(),
        })
    }

    pub async fn submit_farm_record(&self, new: &NewFarmRecord) -> Result<FarmPlantingRecord> {
        if new.user_id.is_empty() || new.area.trim().is_empty() {
            bail!("farm record needs an owner and an area");
        }
        let record = FarmPlantingRecord {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            crop: new.crop,
            area: new.area.trim().to_string(),
            season: new.season,
            submitted_at_ms: Utc::now().timestamp_millis(),
            approved: false,
        };
        insert_farm(&self.pool, &record).await?;
        info!(record_id = %record.id, crop = %record.crop, "farm record submitted");
        Ok(record)
    }

    pub async fn submit_demand_record(&self, new: &NewDemandRecord) -> Result<DemandRecord> {
        if new.user_id.is_empty() || new.quantity.trim().is_empty() {
            bail!("demand record needs an owner and a quantity");
        }
        let record = DemandRecord {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id.clone(),
            product: new.product,
            quantity: new.quantity.trim().to_string(),
            period: new.period,
            submitted_at_ms: Utc::now().timestamp_millis(),
            approved: false,
        };
        insert_demand(&self.pool, &record).await?;
        info!(record_id = %record.id, product = %record.product, "demand record submitted");
        Ok(record)
    }

    /// Marks a farm record approved. Returns `false` when it does not exist.
    pub async fn approve_farm_record(&self, id: &str) -> Result<bool> {
        self.set_approved("farm_records", id).await
    }

    pub async fn approve_demand_record(&self, id: &str) -> Result<bool> {
        self.set_approved("demand_records", id).await
    }

    /// Deletes a rejected farm record. Returns `false` when nothing was removed.
    pub async fn reject_farm_record(&self, id: &str) -> Result<bool> {
        self.delete("farm_records", id).await
    }

    pub async fn reject_demand_record(&self, id: &str) -> Result<bool> {
        self.delete("demand_records", id).await
    }

    async fn set_approved(&self, table: &str, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("UPDATE {table} SET approved = 1 WHERE id = ?1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            info!(table, record_id = id, "record rejected");
        }
        Ok(removed)
    }

    /// Current contents of all three collections in insertion order. Rows
    /// holding values outside the catalog are skipped with a warning.
    pub async fn load_records(&self) -> Result<RecordSet> {
        let users: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, phone, region, role, created_at_ms FROM users ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let farms: Vec<FarmRow> = sqlx::query_as(
            "SELECT id, user_id, crop, area, season, submitted_at_ms, approved FROM farm_records ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;
        let demands: Vec<DemandRow> = sqlx::query_as(
            "SELECT id, user_id, product, quantity, period, submitted_at_ms, approved FROM demand_records ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(RecordSet {
            users: keep_valid(
                "users",
                users.into_iter().map(|row| RawUser::from(row).to_user_ref()),
            ),
            farm_records: keep_valid(
                "farm_records",
                farms
                    .into_iter()
                    .map(|row| FarmPlantingRecord::try_from(RawFarmRecord::from(row))),
            ),
            demand_records: keep_valid(
                "demand_records",
                demands
                    .into_iter()
                    .map(|row| DemandRecord::try_from(RawDemandRecord::from(row))),
            ),
        })
    }

    /// Imports a local-storage dump (`users`, `farmData`, `demandData`).
    /// Records already present by id are left untouched. Records naming
    /// unknown products, seasons, periods or roles, and users whose email is
    /// already registered, are recorded as incidents.
    pub async fn import_dump(&self, json: &str) -> Result<ImportReport> {
        let dump: LocalStorageDump = serde_json::from_str(json)?;
        let mut report = ImportReport::default();
        let mut tx = self.pool.begin().await?;

        for raw in &dump.users {
            let user = match raw.to_user_ref() {
                Ok(user) => user,
                Err(err) => {
                    report.rejected.push(err.to_string());
                    continue;
                }
            };
            let (known,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = ?1")
                .bind(&user.id)
                .fetch_one(&mut *tx)
                .await?;
            if known > 0 {
                continue;
            }
            let (taken,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?1")
                .bind(&raw.email)
                .fetch_one(&mut *tx)
                .await?;
            if taken > 0 {
                report.rejected.push(format!(
                    "user `{}` has email `{}` already registered",
                    user.id, raw.email
                ));
                continue;
            }
            sqlx::query(
                "INSERT INTO users (id, name, email, phone, region, role, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&user.id)
            .bind(&user.name)
            .bind(&raw.email)
            .bind(&user.phone)
            .bind(&user.region)
            .bind(user.role.as_str())
            .bind(raw.created_at)
            .execute(&mut *tx)
            .await?;
            report.users += 1;
        }
        for raw in dump.farm_data {
            match FarmPlantingRecord::try_from(raw) {
                Ok(record) => report.farm_records += insert_farm(&mut *tx, &record).await?,
                Err(err) => report.rejected.push(err.to_string()),
            }
        }
        for raw in dump.demand_data {
            match DemandRecord::try_from(raw) {
                Ok(record) => report.demand_records += insert_demand(&mut *tx, &record).await?,
                Err(err) => report.rejected.push(err.to_string()),
            }
        }
        tx.commit().await?;

        for message in &report.rejected {
            warn!(%message, "import rejected record");
            self.log_incident("warning", "record_rejected", message).await?;
        }
        info!(
            users = report.users,
            farm_records = report.farm_records,
            demand_records = report.demand_records,
            rejected = report.rejected.len(),
            "local storage dump imported"
        );
        Ok(report)
    }

    pub async fn log_incident(&self, severity: &str, kind: &str, message: &str) -> Result<()> {
        let ts_ms = Utc::now().timestamp_millis();
        sqlx::query("INSERT INTO incidents (ts_ms, severity, kind, message) VALUES (?1, ?2, ?3, ?4)")
            .bind(ts_ms)
            .bind(severity)
            .bind(kind)
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn incident_count(&self, kind: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM incidents WHERE kind = ?1")
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub async fn init_sqlite(path: &str) -> Result<Store> {
    let store = Store::connect(path).await?;
    info!(path = path, "sqlite initialized");
    Ok(store)
}

async fn run_init_sql(pool: &SqlitePool) -> Result<()> {
    for statement in INIT_SQL.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() {
            continue;
        }
        sqlx::query(trimmed).execute(pool).await?;
    }
    Ok(())
}

async fn insert_farm<'e, E>(executor: E, record: &FarmPlantingRecord) -> Result<usize>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        "INSERT OR IGNORE INTO farm_records (id, user_id, crop, area, season, submitted_at_ms, approved) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(record.crop.as_str())
    .bind(&record.area)
    .bind(record.season.as_str())
    .bind(record.submitted_at_ms)
    .bind(record.approved)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() as usize)
}

async fn insert_demand<'e, E>(executor: E, record: &DemandRecord) -> Result<usize>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        "INSERT OR IGNORE INTO demand_records (id, user_id, product, quantity, period, submitted_at_ms, approved) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(record.product.as_str())
    .bind(&record.quantity)
    .bind(record.period.as_str())
    .bind(record.submitted_at_ms)
    .bind(record.approved)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() as usize)
}

fn keep_valid<T>(
    collection: &str,
    rows: impl Iterator<Item = std::result::Result<T, RecordError>>,
) -> Vec<T> {
    rows.filter_map(|row| match row {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(collection, error = %err, "skipping record outside the catalog");
            None
        }
    })
    .collect()
}
