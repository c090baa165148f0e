//! Small fixed dataset for local admin walkthroughs.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;

use super::{
    insert_contractor, insert_lead, insert_neighborhood_median, insert_permit, insert_property,
    insert_scraper_run, DbError,
};
use crate::models::{
    Contractor, EnrichmentStatus, Lead, LeadStatus, LeadTier, NeighborhoodMedian, Permit,
    Property, ScraperRun, ScraperRunStatus,
};

/// Row counts written by [`seed_demo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub contractors: usize,
    pub permits: usize,
    pub properties: usize,
    pub leads: usize,
    pub scraper_runs: usize,
    pub neighborhood_medians: usize,
}

/// Inserts the demo dataset in one transaction. Fails if any row already exists.
pub fn seed_demo(conn: &mut Connection) -> Result<SeedSummary, DbError> {
    let tx = conn.transaction()?;
    let mut summary = SeedSummary::default();
    let base = anchor();

    let contractors = [
        ("TACLA00412C", "Lone Star Roofing", "Austin", Some(0.82), true),
        ("TACLA00977E", "Hill Country Pools", "Austin", Some(0.64), false),
        ("TACLB01558C", "Big D Solar", "Dallas", Some(0.71), false),
        ("TACLA27741E", "Test Account", "Austin", None, false),
        ("M-40412", "Trinity Mechanical", "Dallas", Some(0.55), false),
    ];
    for (id, name, city, trust_score, audited) in contractors {
        insert_contractor(
            &tx,
            &Contractor {
                id: id.to_string(),
                business_name: name.to_string(),
                city: city.to_string(),
                trust_score,
                audited,
                audited_at: audited.then_some(base - Duration::days(30)),
            },
        )?;
        summary.contractors += 1;
    }

    let permits = [
        (
            1,
            "BP-2025-0101",
            "Austin",
            "Roofing",
            "1200 Oak St",
            Some("TACLA00412C"),
            18_500.0,
            (2025, 1, 6),
        ),
        (
            2,
            "BP-2025-0144",
            "Austin",
            "Pool",
            "40 Elm Ave",
            Some("TACLA00977E"),
            62_000.0,
            (2025, 1, 21),
        ),
        (
            3,
            "BP-2025-0310",
            "Dallas",
            "Solar",
            "9 Pine Rd",
            Some("TACLB01558C"),
            27_400.0,
            (2025, 2, 3),
        ),
        (
            4,
            "BP-2025-0322",
            "Dallas",
            "HVAC",
            "77 Cedar Ln",
            Some("M-40412"),
            9_800.0,
            (2025, 2, 10),
        ),
    ];
    for (id, number, city, permit_type, address, contractor_id, valuation, (y, m, d)) in permits {
        let contractor_name = contractor_id.and_then(|cid| {
            contractors
                .iter()
                .find(|(candidate, ..)| *candidate == cid)
                .map(|(_, name, ..)| name.to_string())
        });
        insert_permit(
            &tx,
            &Permit {
                id,
                permit_number: number.to_string(),
                city: city.to_string(),
                permit_type: permit_type.to_string(),
                description: format!("{permit_type} work at {address}"),
                address: address.to_string(),
                contractor_id: contractor_id.map(str::to_string),
                contractor_name,
                valuation: Some(valuation),
                issued_date: NaiveDate::from_ymd_opt(y, m, d),
                scraped_at: base,
            },
        )?;
        summary.permits += 1;
    }

    let properties = [
        (
            1,
            "0211-04-0007",
            "1200 Oak St",
            "Austin",
            Some("J. Rivera"),
            Some(512_000.0),
            Some(true),
            "N-104",
            EnrichmentStatus::Enriched,
        ),
        (
            2,
            "0211-09-0031",
            "40 Elm Ave",
            "Austin",
            Some("T. Nguyen"),
            Some(884_000.0),
            Some(false),
            "N-104",
            EnrichmentStatus::Enriched,
        ),
        (
            3,
            "0980-12-0402",
            "9 Pine Rd",
            "Dallas",
            None,
            None,
            None,
            "D-220",
            EnrichmentStatus::Pending,
        ),
    ];
    for (id, parcel, address, city, owner, value, occupied, hood, status) in properties {
        insert_property(
            &tx,
            &Property {
                id,
                parcel_id: parcel.to_string(),
                address: address.to_string(),
                city: city.to_string(),
                owner_name: owner.map(str::to_string),
                market_value: value,
                year_built: value.map(|_| 1987),
                owner_occupied: occupied,
                neighborhood_code: Some(hood.to_string()),
                enrichment_status: status,
                enriched_at: (status == EnrichmentStatus::Enriched).then_some(base),
            },
        )?;
        summary.properties += 1;
    }

    let leads = [
        (1, 1, Some(1), "1200 Oak St", LeadTier::Hot, Some(0.82), 91, LeadStatus::Contacted),
        (2, 2, Some(2), "40 Elm Ave", LeadTier::Warm, Some(0.64), 68, LeadStatus::New),
        (3, 3, Some(3), "9 Pine Rd", LeadTier::Cold, Some(0.71), 35, LeadStatus::New),
    ];
    for (id, permit_id, property_id, address, tier, trust_score, score, status) in leads {
        insert_lead(
            &tx,
            &Lead {
                id,
                permit_id,
                property_id,
                address: address.to_string(),
                lead_tier: tier,
                trust_score,
                score,
                status,
                created_at: base + Duration::hours(id),
            },
        )?;
        summary.leads += 1;
    }

    let runs = [
        (1, "Austin", ScraperRunStatus::Succeeded, 44, 12, None),
        (2, "Dallas", ScraperRunStatus::Failed, 0, 0, Some("portal returned HTTP 503")),
        (3, "Dallas", ScraperRunStatus::Succeeded, 31, 9, None),
    ];
    for (id, city, status, found, new, error_message) in runs {
        let started_at = base + Duration::days(id);
        insert_scraper_run(
            &tx,
            &ScraperRun {
                id,
                city: city.to_string(),
                status,
                started_at,
                finished_at: Some(started_at + Duration::minutes(4)),
                permits_found: found,
                permits_new: new,
                error_message: error_message.map(str::to_string),
            },
        )?;
        summary.scraper_runs += 1;
    }

    let medians = [
        (1, "N-104", "Austin", 648_000.0, 212),
        (2, "D-220", "Dallas", 389_500.0, 148),
    ];
    for (id, code, city, value, sample_size) in medians {
        insert_neighborhood_median(
            &tx,
            &NeighborhoodMedian {
                id,
                neighborhood_code: code.to_string(),
                city: city.to_string(),
                median_market_value: value,
                sample_size,
                computed_at: base,
            },
        )?;
        summary.neighborhood_medians += 1;
    }

    tx.commit()?;
    Ok(summary)
}

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 6, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
