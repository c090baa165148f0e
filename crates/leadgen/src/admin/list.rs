//! Read-only list views driven by [`ModelAdmin`] metadata.
//!
//! Field names only ever reach the SQL text after they have been matched
//! against the model's static field list; user-supplied values are always
//! bound as parameters.

use std::collections::BTreeMap;

use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::{AdminError, ModelAdmin, DEFAULT_LIST_PER_PAGE, MAX_PAGE_SIZE};
use crate::models::{FieldKind, FieldMeta, ModelMeta};

/// Query-string keys with a fixed meaning; every other key is a filter.
const SEARCH_PARAM: &str = "q";
const SORT_PARAM: &str = "sort";
const PAGE_PARAM: &str = "page";
const PAGE_SIZE_PARAM: &str = "page_size";

/// Distinct values offered per text filter.
const MAX_FILTER_CHOICES: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
}

impl ListQuery {
    /// Splits raw query-string pairs into the reserved keys and filters.
    /// Unparseable page numbers fall back to their defaults.
    pub fn from_params(params: BTreeMap<String, String>) -> Self {
        let mut query = Self::default();
        for (key, value) in params {
            match key.as_str() {
                SEARCH_PARAM => query.search = Some(value),
                SORT_PARAM => query.sort_by = Some(value).filter(|sort| !sort.is_empty()),
                PAGE_PARAM => query.page = value.trim().parse().ok(),
                PAGE_SIZE_PARAM => query.page_size = value.trim().parse().ok(),
                _ => {
                    query.filters.insert(key, value);
                }
            }
        }
        query
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnInfo {
    pub field: &'static str,
    pub label: String,
    pub kind: FieldKind,
    pub sortable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterInfo {
    pub field: &'static str,
    pub title: String,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub model_name: &'static str,
    pub verbose_name: &'static str,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub columns: Vec<ColumnInfo>,
    pub filters: Vec<FilterInfo>,
    pub search_fields: Vec<&'static str>,
    pub results: Vec<Map<String, JsonValue>>,
}

/// Validated SELECT pieces shared by the paged list and the CSV export.
struct ListPlan {
    meta: ModelMeta,
    columns: Vec<&'static FieldMeta>,
    where_clause: String,
    params: Vec<Value>,
    order_clause: String,
}

impl ListPlan {
    fn build(admin: &dyn ModelAdmin, query: &ListQuery) -> Result<Self, AdminError> {
        let meta = admin.meta();
        let columns = select_columns(admin);

        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(term) = query.search.as_deref().map(str::trim) {
            let search_fields = admin.search_fields();
            if !term.is_empty() && !search_fields.is_empty() {
                let pattern = format!("%{}%", escape_like_pattern(term));
                let clauses: Vec<String> = search_fields
                    .iter()
                    .map(|field| format!("\"{field}\" LIKE ? ESCAPE '\\'"))
                    .collect();
                params.extend(std::iter::repeat(Value::Text(pattern)).take(clauses.len()));
                conditions.push(format!("({})", clauses.join(" OR ")));
            }
        }

        let allowed = admin.list_filter();
        for (field, raw) in &query.filters {
            let field_meta = allowed
                .iter()
                .find(|name| **name == field.as_str())
                .and_then(|name| meta.field(name))
                .ok_or_else(|| AdminError::UnknownFilter {
                    field: field.clone(),
                    allowed: allowed.clone(),
                })?;

            match filter_value(field_meta, raw)? {
                Some(value) => {
                    conditions.push(format!("\"{}\" = ?", field_meta.name));
                    params.push(value);
                }
                None => conditions.push(format!("\"{}\" IS NULL", field_meta.name)),
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let order_clause = order_clause(admin, &meta, query.sort_by.as_deref())?;

        Ok(Self {
            meta,
            columns,
            where_clause,
            params,
            order_clause,
        })
    }

    fn select_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|field| format!("\"{}\"", field.name))
            .collect();
        format!(
            "SELECT {} FROM \"{}\"{}{}",
            columns.join(", "),
            self.meta.table,
            self.where_clause,
            self.order_clause
        )
    }

    fn count(&self, conn: &Connection) -> Result<u64, AdminError> {
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\"{}",
            self.meta.table, self.where_clause
        );
        let count = conn.query_row(
            &sql,
            rusqlite::params_from_iter(self.params.iter()),
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn rows(
        &self,
        conn: &Connection,
        window: Option<(u64, u64)>,
    ) -> Result<Vec<Vec<(&'static FieldMeta, JsonValue)>>, AdminError> {
        let mut sql = self.select_sql();
        let mut params = self.params.clone();
        if let Some((limit, offset)) = window {
            // SQLite reads a negative OFFSET as 0, so an offset past i64 is an empty page.
            let Ok(offset) = i64::try_from(offset) else {
                return Ok(Vec::new());
            };
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            params.push(Value::Integer(offset));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(self.columns.len());
            for (index, field) in self.columns.iter().enumerate() {
                record.push((*field, value_to_json(field.kind, row.get_ref(index)?)));
            }
            out.push(record);
        }
        Ok(out)
    }
}

/// Runs one page of a model's list view.
pub fn list(
    conn: &Connection,
    admin: &dyn ModelAdmin,
    query: &ListQuery,
) -> Result<ListResponse, AdminError> {
    let plan = ListPlan::build(admin, query)?;

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .or_else(|| admin.list_per_page())
        .unwrap_or(DEFAULT_LIST_PER_PAGE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(page_size);

    let count = plan.count(conn)?;
    let total_pages = if count > 0 {
        count.div_ceil(page_size)
    } else {
        1
    };

    let results = plan
        .rows(conn, Some((page_size, offset)))?
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(field, value)| (field.name.to_string(), value))
                .collect::<Map<String, JsonValue>>()
        })
        .collect();

    Ok(ListResponse {
        model_name: plan.meta.name,
        verbose_name: plan.meta.verbose_name,
        count,
        page,
        page_size,
        total_pages,
        columns: build_columns(admin),
        filters: build_filters(conn, admin, query)?,
        search_fields: admin.search_fields(),
        results,
    })
}

/// Renders every row matching the query (no pagination) as CSV.
pub fn export_csv(
    conn: &Connection,
    admin: &dyn ModelAdmin,
    query: &ListQuery,
) -> Result<Vec<u8>, AdminError> {
    let plan = ListPlan::build(admin, query)?;
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(plan.columns.iter().map(|field| field.name))?;

    for record in plan.rows(conn, None)? {
        writer.write_record(record.iter().map(|(_, value)| csv_cell(value)))?;
    }

    writer
        .into_inner()
        .map_err(|err| AdminError::Export(csv::Error::from(err.into_error())))
}

fn select_columns(admin: &dyn ModelAdmin) -> Vec<&'static FieldMeta> {
    let meta = admin.meta();
    let mut names = vec![meta.primary_key];
    for field in admin.list_display() {
        if !names.contains(&field) {
            names.push(field);
        }
    }
    names.into_iter().filter_map(|name| meta.field(name)).collect()
}

fn build_columns(admin: &dyn ModelAdmin) -> Vec<ColumnInfo> {
    let meta = admin.meta();
    admin
        .list_display()
        .into_iter()
        .filter_map(|name| meta.field(name))
        .map(|field| ColumnInfo {
            field: field.name,
            label: humanize_field_name(field.name),
            kind: field.kind,
            sortable: true,
        })
        .collect()
}

fn build_filters(
    conn: &Connection,
    admin: &dyn ModelAdmin,
    query: &ListQuery,
) -> Result<Vec<FilterInfo>, AdminError> {
    let meta = admin.meta();
    let mut filters = Vec::new();
    for field in admin.list_filter().into_iter().filter_map(|name| meta.field(name)) {
        let choices = if field.kind == FieldKind::Boolean {
            vec!["true".to_string(), "false".to_string()]
        } else {
            distinct_values(conn, meta.table, field.name)?
        };
        filters.push(FilterInfo {
            field: field.name,
            title: humanize_field_name(field.name),
            choices,
            current_value: query.filters.get(field.name).cloned(),
        });
    }
    Ok(filters)
}

fn distinct_values(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<Vec<String>, AdminError> {
    let sql = format!(
        "SELECT DISTINCT CAST(\"{column}\" AS TEXT) AS value FROM \"{table}\" \
         WHERE \"{column}\" IS NOT NULL ORDER BY value LIMIT {MAX_FILTER_CHOICES}"
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

fn order_clause(
    admin: &dyn ModelAdmin,
    meta: &ModelMeta,
    sort_by: Option<&str>,
) -> Result<String, AdminError> {
    let requested: Vec<&str> = match sort_by {
        Some(sort) => vec![sort],
        None => admin.ordering(),
    };

    let mut terms = Vec::new();
    let mut has_primary_key = false;
    for entry in requested {
        let (field, direction) = match entry.strip_prefix('-') {
            Some(field) => (field, "DESC"),
            None => (entry, "ASC"),
        };
        let field = meta
            .field(field)
            .ok_or_else(|| AdminError::UnknownSortField(field.to_string()))?;
        has_primary_key |= field.name == meta.primary_key;
        terms.push(format!("\"{}\" {direction}", field.name));
    }

    if !has_primary_key {
        // Unordered admins list newest first; explicit orderings tie-break ascending.
        let direction = if terms.is_empty() { "DESC" } else { "ASC" };
        terms.push(format!("\"{}\" {direction}", meta.primary_key));
    }

    Ok(format!(" ORDER BY {}", terms.join(", ")))
}

/// `Ok(None)` means the filter matches NULL.
fn filter_value(field: &FieldMeta, raw: &str) -> Result<Option<Value>, AdminError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = || AdminError::InvalidFilterValue {
        field: field.name.to_string(),
        value: raw.to_string(),
    };

    let value = match field.kind {
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Integer(1),
            "false" | "0" | "no" => Value::Integer(0),
            _ => return Err(invalid()),
        },
        FieldKind::Integer => Value::Integer(trimmed.parse().map_err(|_| invalid())?),
        FieldKind::Real => Value::Real(trimmed.parse().map_err(|_| invalid())?),
        FieldKind::Text if !field.choices.is_empty() => {
            let lowered = trimmed.to_ascii_lowercase();
            if !field.choices.contains(&lowered.as_str()) {
                return Err(invalid());
            }
            Value::Text(lowered)
        }
        FieldKind::Text | FieldKind::Date | FieldKind::Timestamp => {
            Value::Text(trimmed.to_string())
        }
    };
    Ok(Some(value))
}

fn value_to_json(kind: FieldKind, value: ValueRef<'_>) -> JsonValue {
    match (kind, value) {
        (_, ValueRef::Null) => JsonValue::Null,
        (FieldKind::Boolean, ValueRef::Integer(raw)) => JsonValue::Bool(raw != 0),
        (FieldKind::Real, ValueRef::Integer(raw)) => JsonValue::from(raw as f64),
        (_, ValueRef::Integer(raw)) => JsonValue::from(raw),
        (_, ValueRef::Real(raw)) => serde_json::Number::from_f64(raw)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        (_, ValueRef::Text(raw)) => JsonValue::String(String::from_utf8_lossy(raw).into_owned()),
        (_, ValueRef::Blob(raw)) => JsonValue::String(format!("<{} bytes>", raw.len())),
    }
}

fn csv_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Escape SQL LIKE wildcard characters in user input.
fn escape_like_pattern(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `market_value` -> `Market value`.
pub fn humanize_field_name(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{LeadAdmin, PermitAdmin, PropertyAdmin};
    use crate::db::migrate;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().expect("in-memory db");
        migrate(&conn).expect("schema");
        conn.execute_batch(
            "INSERT INTO permits (id, permit_number, city, permit_type, address, contractor_name, valuation, issued_date, scraped_at) VALUES
                (1, 'BP-1', 'Austin', 'Roofing', '12 Oak St', 'Lone Star Roofing', 18500, '2025-01-03', '2025-01-04 00:00:00+00:00'),
                (2, 'BP-2', 'Austin', 'Pool', '40 Elm Ave', '100% Pools', 62000, '2025-02-11', '2025-02-12 00:00:00+00:00'),
                (3, 'BP-3', 'Dallas', 'Roofing', '9 Pine Rd', 'Big D Roofing', 21000, '2025-03-20', '2025-03-21 00:00:00+00:00'),
                (4, 'BP-4', 'Dallas', 'Solar', '77 Cedar Ln', NULL, NULL, NULL, '2025-03-22 00:00:00+00:00');
             INSERT INTO properties (id, parcel_id, address, city, owner_name, market_value, owner_occupied, enrichment_status) VALUES
                (1, 'P-1', '12 Oak St', 'Austin', 'Rivera', 510000, 1, 'enriched'),
                (2, 'P-2', '40 Elm Ave', 'Austin', 'Nguyen', 880000, 0, 'enriched'),
                (3, 'P-3', '9 Pine Rd', 'Dallas', NULL, NULL, NULL, 'pending');",
        )
        .expect("seed rows");
        conn
    }

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from_params(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn ids(response: &ListResponse) -> Vec<i64> {
        response
            .results
            .iter()
            .map(|row| row["id"].as_i64().expect("id column"))
            .collect()
    }

    #[test]
    fn from_params_separates_reserved_keys_from_filters() {
        let parsed = query(&[
            ("q", "oak"),
            ("sort", "-valuation"),
            ("page", "2"),
            ("page_size", "abc"),
            ("city", "Austin"),
        ]);
        assert_eq!(parsed.search.as_deref(), Some("oak"));
        assert_eq!(parsed.sort_by.as_deref(), Some("-valuation"));
        assert_eq!(parsed.page, Some(2));
        assert_eq!(parsed.page_size, None);
        assert_eq!(parsed.filters.get("city").map(String::as_str), Some("Austin"));
    }

    #[test]
    fn default_ordering_comes_from_the_registration() {
        let conn = seeded();
        let response = list(&conn, &PermitAdmin, &ListQuery::default()).expect("list");
        // SQLite sorts NULL first, so DESC puts the undated permit last.
        assert_eq!(ids(&response), vec![3, 2, 1, 4]);
        assert_eq!(response.count, 4);
        assert_eq!(response.total_pages, 1);
        assert_eq!(response.page_size, DEFAULT_LIST_PER_PAGE);
    }

    #[test]
    fn search_matches_any_search_field_and_escapes_wildcards() {
        let conn = seeded();
        let response = list(&conn, &PermitAdmin, &query(&[("q", "roofing")])).expect("list");
        assert_eq!(ids(&response), vec![3, 1]);

        let response = list(&conn, &PermitAdmin, &query(&[("q", "100%")])).expect("list");
        assert_eq!(ids(&response), vec![2]);

        let response = list(&conn, &PermitAdmin, &query(&[("q", "%")])).expect("list");
        assert_eq!(ids(&response), vec![2]);
    }

    #[test]
    fn filters_are_anded_and_limited_to_list_filter() {
        let conn = seeded();
        let response = list(
            &conn,
            &PermitAdmin,
            &query(&[("city", "Dallas"), ("permit_type", "Roofing")]),
        )
        .expect("list");
        assert_eq!(ids(&response), vec![3]);
        let city_filter = response
            .filters
            .iter()
            .find(|filter| filter.field == "city")
            .expect("city filter");
        assert_eq!(city_filter.choices, vec!["Austin", "Dallas"]);
        assert_eq!(city_filter.current_value.as_deref(), Some("Dallas"));

        let error = list(&conn, &PermitAdmin, &query(&[("valuation", "18500")]))
            .expect_err("valuation is not a list filter");
        assert!(
            matches!(error, AdminError::UnknownFilter { ref field, .. } if field == "valuation")
        );
    }

    #[test]
    fn boolean_filters_accept_common_spellings() {
        let conn = seeded();
        let response =
            list(&conn, &PropertyAdmin, &query(&[("owner_occupied", "true")])).expect("list");
        assert_eq!(ids(&response), vec![1]);
        assert_eq!(response.results[0]["owner_occupied"], JsonValue::Bool(true));

        let response =
            list(&conn, &PropertyAdmin, &query(&[("owner_occupied", "")])).expect("list");
        assert_eq!(ids(&response), vec![3]);

        let error = list(&conn, &PropertyAdmin, &query(&[("owner_occupied", "maybe")]))
            .expect_err("not a boolean");
        assert!(matches!(error, AdminError::InvalidFilterValue { .. }));
    }

    #[test]
    fn explicit_sort_overrides_ordering_and_rejects_unknown_fields() {
        let conn = seeded();
        let response =
            list(&conn, &PermitAdmin, &query(&[("sort", "permit_number")])).expect("list");
        assert_eq!(ids(&response), vec![1, 2, 3, 4]);

        let error = list(&conn, &PermitAdmin, &query(&[("sort", "-owner")]))
            .expect_err("unknown sort");
        assert!(matches!(error, AdminError::UnknownSortField(ref field) if field == "owner"));
    }

    #[test]
    fn pagination_is_bounded() {
        let conn = seeded();
        let response = list(
            &conn,
            &PermitAdmin,
            &query(&[("page", "2"), ("page_size", "3"), ("sort", "id")]),
        )
        .expect("list");
        assert_eq!(ids(&response), vec![4]);
        assert_eq!(response.total_pages, 2);

        let response = list(
            &conn,
            &PermitAdmin,
            &query(&[("page", "0"), ("page_size", "100000")]),
        )
        .expect("list");
        assert_eq!(response.page, 1);
        assert_eq!(response.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn page_far_past_the_end_is_empty() {
        let conn = seeded();
        let far_page = (u64::MAX / 500).to_string();
        let last_page = u64::MAX.to_string();
        let response = list(
            &conn,
            &PermitAdmin,
            &query(&[("page", far_page.as_str()), ("page_size", "500")]),
        )
        .expect("list");
        assert_eq!(response.count, 4);
        assert_eq!(response.total_pages, 1);
        assert!(response.results.is_empty());

        let response = list(
            &conn,
            &PermitAdmin,
            &query(&[("page", last_page.as_str())]),
        )
        .expect("list");
        assert!(response.results.is_empty());
    }

    #[test]
    fn choice_filters_ignore_case_and_reject_unknown_values() {
        let conn = seeded();
        conn.execute_batch(
            "INSERT INTO leads (id, permit_id, property_id, address, lead_tier, score, status, created_at) VALUES
                (1, 1, 1, '12 Oak St', 'hot', 91, 'contacted', '2025-03-01 01:00:00+00:00'),
                (2, 2, 2, '40 Elm Ave', 'warm', 68, 'new', '2025-03-01 02:00:00+00:00');",
        )
        .expect("seed leads");

        let response = list(&conn, &LeadAdmin, &query(&[("lead_tier", "Hot")])).expect("list");
        assert_eq!(ids(&response), vec![1]);

        let response = list(&conn, &LeadAdmin, &query(&[("status", " NEW ")])).expect("list");
        assert_eq!(ids(&response), vec![2]);

        let error = list(&conn, &LeadAdmin, &query(&[("lead_tier", "lukewarm")]))
            .expect_err("not a lead tier");
        assert!(
            matches!(error, AdminError::InvalidFilterValue { ref field, .. } if field == "lead_tier")
        );
    }

    #[test]
    fn empty_table_reports_a_single_page() {
        let conn = seeded();
        let response = list(&conn, &LeadAdmin, &ListQuery::default()).expect("list");
        assert_eq!(response.count, 0);
        assert_eq!(response.total_pages, 1);
        assert_eq!(response.page_size, 50);
        assert!(response.results.is_empty());
    }

    #[test]
    fn results_carry_primary_key_and_display_columns_only() {
        let conn = seeded();
        let response = list(&conn, &PropertyAdmin, &query(&[("q", "P-2")])).expect("list");
        let row = &response.results[0];
        assert_eq!(row["id"], JsonValue::from(2));
        assert_eq!(row["market_value"], JsonValue::from(880000.0));
        assert_eq!(row["enrichment_status"], JsonValue::from("enriched"));
        assert!(row.get("city").is_none());
        assert_eq!(response.columns[0].label, "Parcel id");
    }

    #[test]
    fn csv_export_includes_all_matching_rows() {
        let conn = seeded();
        let bytes = export_csv(
            &conn,
            &PermitAdmin,
            &query(&[("city", "Dallas"), ("page_size", "1")]),
        )
        .expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,permit_number,city,permit_type,address,contractor_name,valuation,issued_date"
        );
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "3,BP-3,Dallas,Roofing,9 Pine Rd,Big D Roofing,21000.0,2025-03-20");
        assert_eq!(lines[2], "4,BP-4,Dallas,Solar,77 Cedar Ln,,,");
    }

    #[test]
    fn humanize_replaces_underscores_and_capitalizes() {
        assert_eq!(humanize_field_name("median_market_value"), "Median market value");
        assert_eq!(humanize_field_name(""), "");
    }
}
