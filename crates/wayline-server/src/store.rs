//! Hazard-zone store: the read-only query surface over sqlite.
//!
//! Zone lifecycle (creation, verification, deactivation) is owned by the
//! external record system; at request time this module only lists records.
//! `upsert_zone` exists for tests and offline seeding.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

use wayline_core::geo::Coordinate;
use wayline_core::models::{BoundingBox, HazardZone, ZoneCategory};

#[derive(Clone)]
pub struct ZoneStore {
    pool: SqlitePool,
}

impl ZoneStore {
    /// Open (or create) the zone database and apply the schema.
    pub async fn connect(db_path: &str, max_connections: u32) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path);
        info!("Connecting to zone database: {}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await?;

        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// List active zones, optionally restricted to verified records and to a
    /// center-point bounding box.
    ///
    /// Rows whose stored geometry fails to decode are skipped with a warning
    /// so one corrupt record cannot poison a query.
    pub async fn list_active(
        &self,
        verified_only: bool,
        bbox: Option<&BoundingBox>,
    ) -> Result<Vec<HazardZone>> {
        let mut sql = String::from(
            "SELECT id, category, boundary, center_lat, center_lon, speed_limit, verified, active, updated_at \
             FROM hazard_zones WHERE active = 1",
        );
        if verified_only {
            sql.push_str(" AND verified = 1");
        }
        if bbox.is_some() {
            sql.push_str(
                " AND center_lat >= ?1 AND center_lat <= ?2 AND center_lon >= ?3 AND center_lon <= ?4",
            );
        }

        let mut query = sqlx::query_as::<_, ZoneRow>(&sql);
        if let Some(bbox) = bbox {
            query = query
                .bind(bbox.min_lat)
                .bind(bbox.max_lat)
                .bind(bbox.min_lon)
                .bind(bbox.max_lon);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut zones = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match HazardZone::try_from(row) {
                Ok(zone) => zones.push(zone),
                Err(err) => warn!("Skipping hazard zone {}: {}", id, err),
            }
        }
        Ok(zones)
    }

    /// Insert or replace a zone record. Test/seed surface only.
    pub async fn upsert_zone(&self, zone: &HazardZone) -> Result<()> {
        let boundary_json = serde_json::to_string(&zone.boundary)?;

        sqlx::query(
            r#"
            INSERT INTO hazard_zones (id, category, boundary, center_lat, center_lon, speed_limit, verified, active, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                category = ?2, boundary = ?3, center_lat = ?4, center_lon = ?5,
                speed_limit = ?6, verified = ?7, active = ?8, updated_at = ?9
            "#,
        )
        .bind(&zone.id)
        .bind(zone.category.as_str())
        .bind(&boundary_json)
        .bind(zone.center.lat())
        .bind(zone.center.lon())
        .bind(zone.speed_limit.map(|v| v as i64))
        .bind(zone.verified)
        .bind(zone.active)
        .bind(zone.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../migrations/001_init.sql");

    info!("Running zone database migrations...");
    for statement in migration_sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct ZoneRow {
    id: String,
    category: String,
    boundary: String,
    center_lat: f64,
    center_lon: f64,
    speed_limit: Option<i64>,
    verified: bool,
    active: bool,
    updated_at: String,
}

impl TryFrom<ZoneRow> for HazardZone {
    type Error = anyhow::Error;

    fn try_from(row: ZoneRow) -> Result<Self> {
        let boundary: Vec<[f64; 2]> = serde_json::from_str(&row.boundary)?;
        let center = Coordinate::new(row.center_lat, row.center_lon)?;
        let updated_at = chrono::DateTime::parse_from_rfc3339(&row.updated_at)?
            .with_timezone(&chrono::Utc);

        Ok(HazardZone {
            id: row.id,
            category: ZoneCategory::parse(&row.category),
            boundary,
            center,
            speed_limit: row.speed_limit.and_then(|v| u32::try_from(v).ok()),
            verified: row.verified,
            active: row.active,
            updated_at,
        })
    }
}
