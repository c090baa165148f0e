use super::ModelAdmin;
use crate::models::{Lead, Model, ModelMeta, NeighborhoodMedian, Permit, Property, ScraperRun};

pub struct PermitAdmin;

impl ModelAdmin for PermitAdmin {
    fn meta(&self) -> ModelMeta {
        Permit::META
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![
            "permit_number",
            "city",
            "permit_type",
            "address",
            "contractor_name",
            "valuation",
            "issued_date",
        ]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec!["city", "permit_type"]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["permit_number", "address", "contractor_name", "description"]
    }

    fn readonly_fields(&self) -> Vec<&'static str> {
        vec!["scraped_at"]
    }

    fn ordering(&self) -> Vec<&'static str> {
        vec!["-issued_date"]
    }
}

pub struct PropertyAdmin;

impl ModelAdmin for PropertyAdmin {
    fn meta(&self) -> ModelMeta {
        Property::META
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![
            "parcel_id",
            "address",
            "owner_name",
            "market_value",
            "owner_occupied",
            "neighborhood_code",
            "enrichment_status",
        ]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec!["city", "enrichment_status", "owner_occupied"]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["parcel_id", "address", "owner_name"]
    }

    fn readonly_fields(&self) -> Vec<&'static str> {
        vec!["enriched_at"]
    }

    fn ordering(&self) -> Vec<&'static str> {
        vec!["-market_value"]
    }
}

/// Leads are worked highest score first.
pub struct LeadAdmin;

impl ModelAdmin for LeadAdmin {
    fn meta(&self) -> ModelMeta {
        Lead::META
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![
            "address",
            "lead_tier",
            "score",
            "trust_score",
            "status",
            "created_at",
        ]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec!["lead_tier", "status"]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["address"]
    }

    fn readonly_fields(&self) -> Vec<&'static str> {
        vec!["created_at", "score", "trust_score"]
    }

    fn ordering(&self) -> Vec<&'static str> {
        vec!["-score", "-created_at"]
    }

    fn list_per_page(&self) -> Option<u64> {
        Some(50)
    }
}

/// Scraper runs are an audit log and never edited by hand.
pub struct ScraperRunAdmin;

impl ModelAdmin for ScraperRunAdmin {
    fn meta(&self) -> ModelMeta {
        ScraperRun::META
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![
            "city",
            "status",
            "started_at",
            "finished_at",
            "permits_found",
            "permits_new",
        ]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec!["city", "status"]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["city", "error_message"]
    }

    fn readonly_fields(&self) -> Vec<&'static str> {
        ScraperRun::META.fields.iter().map(|field| field.name).collect()
    }

    fn ordering(&self) -> Vec<&'static str> {
        vec!["-started_at"]
    }
}

pub struct NeighborhoodMedianAdmin;

impl ModelAdmin for NeighborhoodMedianAdmin {
    fn meta(&self) -> ModelMeta {
        NeighborhoodMedian::META
    }

    fn list_display(&self) -> Vec<&'static str> {
        vec![
            "neighborhood_code",
            "city",
            "median_market_value",
            "sample_size",
            "computed_at",
        ]
    }

    fn list_filter(&self) -> Vec<&'static str> {
        vec!["city"]
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["neighborhood_code"]
    }

    fn ordering(&self) -> Vec<&'static str> {
        vec!["city", "neighborhood_code"]
    }
}
