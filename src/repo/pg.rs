#![cfg(feature = "db")]

//! PostgreSQL record store

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use super::TelemetryStore;
use crate::domain::{
    ElectricalReading, MeteorologicalReading, NewPvSystem, PvSystem, SystemId, TimeRange,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SystemRow {
    id: i64,
    name: String,
    capacity_kw: f64,
    inverter_type: String,
    number_of_panels: i32,
    technology: String,
    year_of_installation: i32,
}

impl From<SystemRow> for PvSystem {
    fn from(row: SystemRow) -> Self {
        PvSystem {
            id: row.id,
            name: row.name,
            capacity_kw: row.capacity_kw,
            inverter_type: row.inverter_type,
            number_of_panels: row.number_of_panels,
            technology: row.technology,
            year_of_installation: row.year_of_installation,
        }
    }
}

#[derive(Debug, FromRow)]
struct ElectricalRow {
    system_id: i64,
    time: DateTime<Utc>,
    adresse: Option<i64>,
    i1: Option<f64>,
    u_dc: Option<f64>,
    p_dc: Option<f64>,
    t1: Option<f64>,
    t2: Option<f64>,
    i_sum: Option<f64>,
}

impl From<ElectricalRow> for ElectricalReading {
    fn from(row: ElectricalRow) -> Self {
        ElectricalReading {
            system_id: row.system_id,
            time: row.time,
            adresse: row.adresse,
            i1: row.i1,
            u_dc: row.u_dc,
            p_dc: row.p_dc,
            t1: row.t1,
            t2: row.t2,
            i_sum: row.i_sum,
        }
    }
}

#[derive(Debug, FromRow)]
struct MeteorologicalRow {
    time: DateTime<Utc>,
    gti: Option<f64>,
    ghi: Option<f64>,
    dni: Option<f64>,
    dhi: Option<f64>,
    air_temp: Option<f64>,
    rh: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_dir: Option<f64>,
    wind_gust: Option<f64>,
    rain: Option<f64>,
}

impl From<MeteorologicalRow> for MeteorologicalReading {
    fn from(row: MeteorologicalRow) -> Self {
        MeteorologicalReading {
            time: row.time,
            gti: row.gti,
            ghi: row.ghi,
            dni: row.dni,
            dhi: row.dhi,
            air_temp: row.air_temp,
            rh: row.rh,
            pressure: row.pressure,
            wind_speed: row.wind_speed,
            wind_dir: row.wind_dir,
            wind_gust: row.wind_gust,
            rain: row.rain,
        }
    }
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("connecting to PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Create the tables when missing
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("creating schema")?;
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for PgStore {
    async fn list_systems(&self) -> Result<Vec<PvSystem>> {
        let rows: Vec<SystemRow> = sqlx::query_as(
            r#"
            SELECT id, name, capacity_kw, inverter_type, number_of_panels,
                   technology, year_of_installation
            FROM pv_systems
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_system(&self, id: SystemId) -> Result<Option<PvSystem>> {
        let row: Option<SystemRow> = sqlx::query_as(
            r#"
            SELECT id, name, capacity_kw, inverter_type, number_of_panels,
                   technology, year_of_installation
            FROM pv_systems
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_system(&self, system: NewPvSystem) -> Result<PvSystem> {
        let row: SystemRow = sqlx::query_as(
            r#"
            INSERT INTO pv_systems
                (name, capacity_kw, inverter_type, number_of_panels, technology, year_of_installation)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, capacity_kw, inverter_type, number_of_panels,
                      technology, year_of_installation
            "#,
        )
        .bind(&system.name)
        .bind(system.capacity_kw)
        .bind(&system.inverter_type)
        .bind(system.number_of_panels)
        .bind(&system.technology)
        .bind(system.year_of_installation)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn ensure_system(&self, system: PvSystem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pv_systems
                (id, name, capacity_kw, inverter_type, number_of_panels, technology, year_of_installation)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(system.id)
        .bind(&system.name)
        .bind(system.capacity_kw)
        .bind(&system.inverter_type)
        .bind(system.number_of_panels)
        .bind(&system.technology)
        .bind(system.year_of_installation)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            // Keep the identity sequence ahead of explicitly numbered rows
            sqlx::query(
                "SELECT setval(pg_get_serial_sequence('pv_systems', 'id'), \
                 (SELECT MAX(id) FROM pv_systems))",
            )
            .execute(&self.pool)
            .await?;
        }
        Ok(result.rows_affected() > 0)
    }

    async fn update_system(&self, system: PvSystem) -> Result<Option<PvSystem>> {
        let row: Option<SystemRow> = sqlx::query_as(
            r#"
            UPDATE pv_systems
            SET name = $2, capacity_kw = $3, inverter_type = $4,
                number_of_panels = $5, technology = $6, year_of_installation = $7
            WHERE id = $1
            RETURNING id, name, capacity_kw, inverter_type, number_of_panels,
                      technology, year_of_installation
            "#,
        )
        .bind(system.id)
        .bind(&system.name)
        .bind(system.capacity_kw)
        .bind(&system.inverter_type)
        .bind(system.number_of_panels)
        .bind(&system.technology)
        .bind(system.year_of_installation)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_system(&self, id: SystemId) -> Result<Option<PvSystem>> {
        // electrical_data rows go with it through ON DELETE CASCADE
        let row: Option<SystemRow> = sqlx::query_as(
            r#"
            DELETE FROM pv_systems
            WHERE id = $1
            RETURNING id, name, capacity_kw, inverter_type, number_of_panels,
                      technology, year_of_installation
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn fetch_electrical(
        &self,
        system_id: SystemId,
        range: TimeRange,
    ) -> Result<Vec<ElectricalReading>> {
        // Open sides bind NULL; `timestamptz` cannot hold chrono's extreme dates
        let (start, end) = range.bounds();
        let rows: Vec<ElectricalRow> = sqlx::query_as(
            r#"
            SELECT system_id, time, adresse, i1, u_dc, p_dc, t1, t2, i_sum
            FROM electrical_data
            WHERE system_id = $1
              AND ($2::timestamptz IS NULL OR time >= $2)
              AND ($3::timestamptz IS NULL OR time <= $3)
            ORDER BY time ASC
            "#,
        )
        .bind(system_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_electrical(&self, readings: Vec<ElectricalReading>) -> Result<usize> {
        let mut inserted: u64 = 0;
        let mut tx = self.pool.begin().await?;
        for r in readings {
            let result = sqlx::query(
                r#"
                INSERT INTO electrical_data
                    (system_id, time, adresse, i1, u_dc, p_dc, t1, t2, i_sum)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(r.system_id)
            .bind(r.time)
            .bind(r.adresse)
            .bind(r.i1)
            .bind(r.u_dc)
            .bind(r.p_dc)
            .bind(r.t1)
            .bind(r.t2)
            .bind(r.i_sum)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("inserting electrical row for system {}", r.system_id))?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(usize::try_from(inserted)?)
    }

    async fn delete_electrical(&self, system_id: SystemId, range: TimeRange) -> Result<usize> {
        let (start, end) = range.bounds();
        let result = sqlx::query(
            r#"
            DELETE FROM electrical_data
            WHERE system_id = $1
              AND ($2::timestamptz IS NULL OR time >= $2)
              AND ($3::timestamptz IS NULL OR time <= $3)
            "#,
        )
        .bind(system_id)
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await?;

        Ok(usize::try_from(result.rows_affected())?)
    }

    async fn fetch_meteorological(&self, range: TimeRange) -> Result<Vec<MeteorologicalReading>> {
        let (start, end) = range.bounds();
        let rows: Vec<MeteorologicalRow> = sqlx::query_as(
            r#"
            SELECT time, gti, ghi, dni, dhi, air_temp, rh, pressure,
                   wind_speed, wind_dir, wind_gust, rain
            FROM meteorological_data
            WHERE ($1::timestamptz IS NULL OR time >= $1)
              AND ($2::timestamptz IS NULL OR time <= $2)
            ORDER BY time ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_meteorological(&self, readings: Vec<MeteorologicalReading>) -> Result<usize> {
        let mut inserted: u64 = 0;
        let mut tx = self.pool.begin().await?;
        for r in readings {
            let result = sqlx::query(
                r#"
                INSERT INTO meteorological_data
                    (time, gti, ghi, dni, dhi, air_temp, rh, pressure,
                     wind_speed, wind_dir, wind_gust, rain)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (time) DO NOTHING
                "#,
            )
            .bind(r.time)
            .bind(r.gti)
            .bind(r.ghi)
            .bind(r.dni)
            .bind(r.dhi)
            .bind(r.air_temp)
            .bind(r.rh)
            .bind(r.pressure)
            .bind(r.wind_speed)
            .bind(r.wind_dir)
            .bind(r.wind_gust)
            .bind(r.rain)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(usize::try_from(inserted)?)
    }

    async fn delete_meteorological(&self, range: TimeRange) -> Result<usize> {
        let (start, end) = range.bounds();
        let result = sqlx::query(
            r#"
            DELETE FROM meteorological_data
            WHERE ($1::timestamptz IS NULL OR time >= $1)
              AND ($2::timestamptz IS NULL OR time <= $2)
            "#,
        )
        .bind(start)
        .bind(end)
        .execute(&self.pool)
        .await?;

        Ok(usize::try_from(result.rows_affected())?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
