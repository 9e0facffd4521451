//! Serde mirror of the NVD CVE API 2.0 response. Optional scalars stay
//! `Option` here; defaults are the normalizer's job.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct FeedPage {
    #[serde(default, rename = "resultsPerPage")]
    pub results_per_page: u32,
    #[serde(default, rename = "startIndex")]
    pub start_index: u32,
    #[serde(default, rename = "totalResults")]
    pub total_results: u32,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Vulnerability {
    pub cve: Option<Record>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Record {
    pub id: Option<String>,
    #[serde(rename = "sourceIdentifier")]
    pub source_identifier: Option<String>,
    pub published: Option<String>,
    #[serde(rename = "lastModified")]
    pub last_modified: Option<String>,
    #[serde(rename = "vulnStatus")]
    pub vuln_status: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<Description>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub weaknesses: Vec<Weakness>,
    #[serde(default)]
    pub configurations: Vec<Configuration>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Description {
    pub lang: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Metrics {
    #[serde(default, rename = "cvssMetricV31")]
    pub cvss_metric_v31: Vec<CvssMetric>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CvssMetric {
    #[serde(default, rename = "cvssData")]
    pub cvss_data: CvssData,
    #[serde(rename = "exploitabilityScore")]
    pub exploitability_score: Option<f64>,
    #[serde(rename = "impactScore")]
    pub impact_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CvssData {
    pub version: Option<String>,
    #[serde(rename = "vectorString")]
    pub vector_string: Option<String>,
    #[serde(rename = "attackVector")]
    pub attack_vector: Option<String>,
    #[serde(rename = "attackComplexity")]
    pub attack_complexity: Option<String>,
    #[serde(rename = "privilegesRequired")]
    pub privileges_required: Option<String>,
    #[serde(rename = "userInteraction")]
    pub user_interaction: Option<String>,
    pub scope: Option<String>,
    #[serde(rename = "confidentialityImpact")]
    pub confidentiality_impact: Option<String>,
    #[serde(rename = "integrityImpact")]
    pub integrity_impact: Option<String>,
    #[serde(rename = "availabilityImpact")]
    pub availability_impact: Option<String>,
    #[serde(rename = "baseScore")]
    pub base_score: Option<f64>,
    #[serde(rename = "baseSeverity")]
    pub base_severity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Weakness {
    pub source: Option<String>,
    #[serde(default)]
    pub description: Vec<WeaknessDescription>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeaknessDescription {
    pub lang: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Configuration {
    pub operator: Option<String>,
    pub negate: Option<bool>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Node {
    #[serde(default, rename = "cpeMatch")]
    pub cpe_match: Vec<CpeMatch>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CpeMatch {
    pub vulnerable: Option<bool>,
    pub criteria: Option<String>,
    #[serde(rename = "versionEndExcluding")]
    pub version_end_excluding: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Reference {
    pub url: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
