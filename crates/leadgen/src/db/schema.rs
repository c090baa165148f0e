/// DDL for every lead-generation table. Idempotent.
pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS contractors (
    id TEXT PRIMARY KEY NOT NULL,
    business_name TEXT NOT NULL,
    city TEXT NOT NULL,
    trust_score REAL,
    audited INTEGER NOT NULL DEFAULT 0,
    audited_at TEXT
);

CREATE TABLE IF NOT EXISTS permits (
    id INTEGER PRIMARY KEY,
    permit_number TEXT NOT NULL UNIQUE,
    city TEXT NOT NULL,
    permit_type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL,
    contractor_id TEXT REFERENCES contractors (id),
    contractor_name TEXT,
    valuation REAL,
    issued_date TEXT,
    scraped_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY,
    parcel_id TEXT NOT NULL UNIQUE,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    owner_name TEXT,
    market_value REAL,
    year_built INTEGER,
    owner_occupied INTEGER,
    neighborhood_code TEXT,
    enrichment_status TEXT NOT NULL DEFAULT 'pending',
    enriched_at TEXT
);

CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY,
    permit_id INTEGER NOT NULL REFERENCES permits (id),
    property_id INTEGER REFERENCES properties (id),
    address TEXT NOT NULL,
    lead_tier TEXT NOT NULL,
    trust_score REAL,
    score INTEGER NOT NULL CHECK (score BETWEEN 0 AND 100),
    status TEXT NOT NULL DEFAULT 'new',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scraper_runs (
    id INTEGER PRIMARY KEY,
    city TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    permits_found INTEGER NOT NULL DEFAULT 0,
    permits_new INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

CREATE TABLE IF NOT EXISTS neighborhood_medians (
    id INTEGER PRIMARY KEY,
    neighborhood_code TEXT NOT NULL,
    city TEXT NOT NULL,
    median_market_value REAL NOT NULL,
    sample_size INTEGER NOT NULL,
    computed_at TEXT NOT NULL,
    UNIQUE (neighborhood_code, city)
);

CREATE INDEX IF NOT EXISTS contractors_audited_idx ON contractors (audited);
CREATE INDEX IF NOT EXISTS permits_city_idx ON permits (city);
CREATE INDEX IF NOT EXISTS leads_tier_idx ON leads (lead_tier);
CREATE INDEX IF NOT EXISTS scraper_runs_city_started_idx ON scraper_runs (city, started_at);
";
