use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable};

use super::schema::{
    configurations, cve_entries, cve_references, descriptions, metrics, products, weaknesses,
};

#[derive(Queryable, Debug, Clone)]
pub struct CveEntry {
    pub id: i32,
    pub cve_id: String,
    pub source_identifier: String,
    pub published: Option<NaiveDateTime>,
    pub last_modified: Option<NaiveDateTime>,
    pub vuln_status: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cve_entries)]
pub struct NewCveEntry<'a> {
    pub cve_id: &'a str,
    pub source_identifier: &'a str,
    pub published: Option<NaiveDateTime>,
    pub last_modified: Option<NaiveDateTime>,
    pub vuln_status: &'a str,
}

#[derive(Queryable, Debug, Clone)]
pub struct Description {
    pub id: i32,
    pub cve_entry_id: i32,
    pub lang: String,
    pub description: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = descriptions)]
pub struct NewDescription<'a> {
    pub cve_entry_id: i32,
    pub lang: &'a str,
    pub description: &'a str,
}

#[derive(Queryable, Debug, Clone)]
pub struct Metric {
    pub id: i32,
    pub cve_entry_id: i32,
    pub version: String,
    pub vector_string: String,
    pub attack_vector: String,
    pub attack_complexity: String,
    pub privileges_required: String,
    pub user_interaction: String,
    pub scope: String,
    pub confidentiality_impact: String,
    pub integrity_impact: String,
    pub availability_impact: String,
    pub base_score: f64,
    pub base_severity: String,
    pub exploitability_score: f64,
    pub impact_score: f64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = metrics)]
pub struct NewMetric<'a> {
    pub cve_entry_id: i32,
    pub version: &'a str,
    pub vector_string: &'a str,
    pub attack_vector: &'a str,
    pub attack_complexity: &'a str,
    pub privileges_required: &'a str,
    pub user_interaction: &'a str,
    pub scope: &'a str,
    pub confidentiality_impact: &'a str,
    pub integrity_impact: &'a str,
    pub availability_impact: &'a str,
    pub base_score: f64,
    pub base_severity: &'a str,
    pub exploitability_score: f64,
    pub impact_score: f64,
}

#[derive(Queryable, Debug, Clone)]
pub struct Weakness {
    pub id: i32,
    pub cve_entry_id: i32,
    pub source: String,
    pub description: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = weaknesses)]
pub struct NewWeakness<'a> {
    pub cve_entry_id: i32,
    pub source: &'a str,
    pub description: &'a str,
}

#[derive(Queryable, Debug, Clone)]
pub struct Configuration {
    pub id: i32,
    pub cve_entry_id: i32,
    pub operator: String,
    pub negate: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = configurations)]
pub struct NewConfiguration<'a> {
    pub cve_entry_id: i32,
    pub operator: &'a str,
    pub negate: bool,
}

#[derive(Queryable, Debug, Clone)]
pub struct Product {
    pub id: i32,
    pub config_id: i32,
    pub vulnerable: bool,
    pub criteria: String,
    pub part: String,
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub version_end_excluding: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct<'a> {
    pub config_id: i32,
    pub vulnerable: bool,
    pub criteria: &'a str,
    pub part: &'a str,
    pub vendor: &'a str,
    pub product: &'a str,
    pub version: &'a str,
    pub version_end_excluding: &'a str,
}

#[derive(Queryable, Debug, Clone)]
pub struct Reference {
    pub id: i32,
    pub cve_entry_id: i32,
    pub url: String,
    pub source: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cve_references)]
pub struct NewReference<'a> {
    pub cve_entry_id: i32,
    pub url: &'a str,
    pub source: &'a str,
    pub tags: &'a [String],
}
