//! SQLite access for the lead-generation models.

mod schema;
mod seed;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use tracing::debug;

use crate::models::{Contractor, Lead, NeighborhoodMedian, Permit, Property, ScraperRun};

pub use seed::{seed_demo, SeedSummary};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("unable to open database '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("database worker failed: {0}")]
    Worker(String),
}

/// Handle on the SQLite file. Connections are opened per unit of work.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a connection that refuses writes.
    pub fn open_readonly(&self) -> Result<Connection, DbError> {
        debug!(path = %self.path.display(), "opening read-only sqlite connection");
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| DbError::Open {
            path: self.path.clone(),
            source,
        })
    }

    /// Opens a read/write connection, creating the file when missing.
    pub fn open(&self) -> Result<Connection, DbError> {
        let conn = Connection::open(&self.path).map_err(|source| DbError::Open {
            path: self.path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

/// Creates every table and index that does not exist yet.
pub fn migrate(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(schema::SCHEMA)?;
    Ok(())
}

pub fn insert_contractor(conn: &Connection, contractor: &Contractor) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO contractors (id, business_name, city, trust_score, audited, audited_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            contractor.id,
            contractor.business_name,
            contractor.city,
            contractor.trust_score,
            contractor.audited,
            contractor.audited_at,
        ],
    )?;
    Ok(())
}

pub fn insert_permit(conn: &Connection, permit: &Permit) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO permits (id, permit_number, city, permit_type, description, address,
             contractor_id, contractor_name, valuation, issued_date, scraped_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            permit.id,
            permit.permit_number,
            permit.city,
            permit.permit_type,
            permit.description,
            permit.address,
            permit.contractor_id,
            permit.contractor_name,
            permit.valuation,
            permit.issued_date,
            permit.scraped_at,
        ],
    )?;
    Ok(())
}

pub fn insert_property(conn: &Connection, property: &Property) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO properties (id, parcel_id, address, city, owner_name, market_value,
             year_built, owner_occupied, neighborhood_code, enrichment_status, enriched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            property.id,
            property.parcel_id,
            property.address,
            property.city,
            property.owner_name,
            property.market_value,
            property.year_built,
            property.owner_occupied,
            property.neighborhood_code,
            property.enrichment_status,
            property.enriched_at,
        ],
    )?;
    Ok(())
}

pub fn insert_lead(conn: &Connection, lead: &Lead) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO leads (id, permit_id, property_id, address, lead_tier, trust_score,
             score, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            lead.id,
            lead.permit_id,
            lead.property_id,
            lead.address,
            lead.lead_tier,
            lead.trust_score,
            lead.score,
            lead.status,
            lead.created_at,
        ],
    )?;
    Ok(())
}

pub fn insert_scraper_run(conn: &Connection, run: &ScraperRun) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO scraper_runs (id, city, status, started_at, finished_at, permits_found,
             permits_new, error_message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run.id,
            run.city,
            run.status,
            run.started_at,
            run.finished_at,
            run.permits_found,
            run.permits_new,
            run.error_message,
        ],
    )?;
    Ok(())
}

pub fn insert_neighborhood_median(
    conn: &Connection,
    median: &NeighborhoodMedian,
) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO neighborhood_medians (id, neighborhood_code, city, median_market_value,
             sample_size, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            median.id,
            median.neighborhood_code,
            median.city,
            median.median_market_value,
            median.sample_size,
            median.computed_at,
        ],
    )?;
    Ok(())
}

pub fn fetch_contractor(conn: &Connection, id: &str) -> Result<Option<Contractor>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT id, business_name, city, trust_score, audited, audited_at
         FROM contractors WHERE id = ?1",
    )?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(Contractor::from_row(row)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EnrichmentStatus, LeadStatus, LeadTier, ScraperRunStatus};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("enable foreign keys");
        migrate(&conn).expect("schema applies");
        conn
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = memory();
        migrate(&conn).expect("second run is a no-op");
    }

    #[test]
    fn models_round_trip_through_their_tables() {
        let conn = memory();
        let now = Utc.with_ymd_and_hms(2025, 4, 2, 15, 30, 0).unwrap();

        insert_contractor(
            &conn,
            &Contractor {
                id: "TACLA001".to_string(),
                business_name: "Lone Star Roofing".to_string(),
                city: "Austin".to_string(),
                trust_score: Some(0.82),
                audited: false,
                audited_at: None,
            },
        )
        .expect("contractor");
        let permit = Permit {
            id: 10,
            permit_number: "2025-001234".to_string(),
            city: "Austin".to_string(),
            permit_type: "Roofing".to_string(),
            description: "Full tear-off".to_string(),
            address: "1200 Oak St".to_string(),
            contractor_id: Some("TACLA001".to_string()),
            contractor_name: Some("Lone Star Roofing".to_string()),
            valuation: Some(18_500.0),
            issued_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            scraped_at: now,
        };
        insert_permit(&conn, &permit).expect("permit");
        insert_property(
            &conn,
            &Property {
                id: 20,
                parcel_id: "0123456789".to_string(),
                address: "1200 Oak St".to_string(),
                city: "Austin".to_string(),
                owner_name: Some("J. Rivera".to_string()),
                market_value: Some(512_000.0),
                year_built: Some(1987),
                owner_occupied: Some(true),
                neighborhood_code: Some("N-104".to_string()),
                enrichment_status: EnrichmentStatus::Enriched,
                enriched_at: Some(now),
            },
        )
        .expect("property");
        let lead = Lead {
            id: 30,
            permit_id: 10,
            property_id: Some(20),
            address: "1200 Oak St".to_string(),
            lead_tier: LeadTier::Hot,
            trust_score: Some(0.82),
            score: 91,
            status: LeadStatus::New,
            created_at: now,
        };
        insert_lead(&conn, &lead).expect("lead");
        insert_scraper_run(
            &conn,
            &ScraperRun {
                id: 1,
                city: "Austin".to_string(),
                status: ScraperRunStatus::Succeeded,
                started_at: now,
                finished_at: Some(now + chrono::Duration::minutes(3)),
                permits_found: 44,
                permits_new: 12,
                error_message: None,
            },
        )
        .expect("scraper run");

        let stored_permit = conn
            .query_row("SELECT * FROM permits WHERE id = 10", [], Permit::from_row)
            .expect("permit row");
        assert_eq!(stored_permit, permit);

        let stored_lead = conn
            .query_row("SELECT * FROM leads WHERE id = 30", [], Lead::from_row)
            .expect("lead row");
        assert_eq!(stored_lead, lead);

        let contractor = fetch_contractor(&conn, "TACLA001")
            .expect("query")
            .expect("contractor present");
        assert!(!contractor.audited);
        assert!(fetch_contractor(&conn, "missing").expect("query").is_none());
    }

    #[test]
    fn lead_score_outside_range_is_rejected() {
        let conn = memory();
        conn.execute_batch("PRAGMA foreign_keys = OFF;")
            .expect("disable foreign keys");
        let result = conn.execute(
            "INSERT INTO leads (id, permit_id, address, lead_tier, score, created_at)
             VALUES (1, 1, 'x', 'hot', 140, '2025-01-01')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn readonly_connection_rejects_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::new(dir.path().join("leads.sqlite3"));
        migrate(&database.open().expect("open rw")).expect("schema");

        let conn = database.open_readonly().expect("open ro");
        let result = conn.execute(
            "INSERT INTO contractors (id, business_name, city) VALUES ('A', 'B', 'C')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn readonly_open_fails_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = Database::new(dir.path().join("absent.sqlite3"));
        match database.open_readonly() {
            Err(DbError::Open { path, .. }) => assert_eq!(path, database.path()),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
