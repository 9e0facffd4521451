//! Flattens raw feed records into relational, default-filled entries.
//!
//! Pure with respect to storage and network: the only side effect is a
//! warning for records that cannot be keyed.

use chrono::NaiveDateTime;

use super::raw;

const NOT_AVAILABLE: &str = "N/A";
const NO_DESCRIPTION: &str = "No description available";

// Feed timestamps are naive ISO-8601 with optional fractional seconds.
const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    pub cve_id: String,
    pub source_identifier: String,
    pub published: Option<NaiveDateTime>,
    pub last_modified: Option<NaiveDateTime>,
    pub vuln_status: String,
    pub descriptions: Vec<Description>,
    pub metrics: Vec<Metric>,
    pub weaknesses: Vec<Weakness>,
    pub configurations: Vec<Configuration>,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weakness {
    pub source: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub operator: String,
    pub negate: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub vulnerable: bool,
    pub criteria: String,
    pub part: String,
    pub vendor: String,
    pub product: String,
    pub version: String,
    pub version_end_excluding: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub url: String,
    pub source: String,
    pub tags: Vec<String>,
}

/// Positional decomposition of a CPE 2.3 criteria string. Never fails:
/// absent segments degrade to "N/A".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaFields {
    pub part: String,
    pub vendor: String,
    pub product: String,
    pub version: String,
}

pub fn decompose_criteria(criteria: &str) -> CriteriaFields {
    let segments: Vec<&str> = criteria.split(':').collect();
    let segment = |i: usize| segments.get(i).copied().unwrap_or(NOT_AVAILABLE).to_string();

    CriteriaFields {
        part: segment(2),
        vendor: segment(3),
        product: segment(4),
        version: segment(5),
    }
}

/// Flattens every record of the page, preserving source order. Records
/// without a `cve` container or without an id are skipped with a warning;
/// everything else normalizes, missing fields taking their defaults.
pub fn normalize(page: raw::FeedPage) -> Vec<NormalizedEntry> {
    let mut entries = Vec::with_capacity(page.vulnerabilities.len());

    for (position, vulnerability) in page.vulnerabilities.into_iter().enumerate() {
        let Some(record) = vulnerability.cve else {
            log::warn!("record {} has no cve container, skipping", position);
            continue;
        };

        match normalize_record(record) {
            Some(entry) => entries.push(entry),
            None => log::warn!("record {} has no cve id, skipping", position),
        }
    }

    entries
}

fn normalize_record(record: raw::Record) -> Option<NormalizedEntry> {
    let cve_id = record.id.filter(|id| !id.is_empty())?;

    Some(NormalizedEntry {
        cve_id,
        source_identifier: record.source_identifier.unwrap_or_default(),
        published: record.published.as_deref().and_then(parse_timestamp),
        last_modified: record.last_modified.as_deref().and_then(parse_timestamp),
        vuln_status: record.vuln_status.unwrap_or_default(),
        descriptions: record
            .descriptions
            .into_iter()
            .map(normalize_description)
            .collect(),
        metrics: record
            .metrics
            .cvss_metric_v31
            .into_iter()
            .map(normalize_metric)
            .collect(),
        weaknesses: record
            .weaknesses
            .into_iter()
            .flat_map(normalize_weakness)
            .collect(),
        configurations: record
            .configurations
            .into_iter()
            .map(normalize_configuration)
            .collect(),
        references: record
            .references
            .into_iter()
            .map(normalize_reference)
            .collect(),
    })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, FEED_TIMESTAMP_FORMAT).ok()
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.into())
}

fn normalize_description(description: raw::Description) -> Description {
    Description {
        lang: or_not_available(description.lang),
        value: description
            .value
            .unwrap_or_else(|| NO_DESCRIPTION.into()),
    }
}

fn normalize_metric(metric: raw::CvssMetric) -> Metric {
    let data = metric.cvss_data;
    Metric {
        version: or_not_available(data.version),
        vector_string: or_not_available(data.vector_string),
        attack_vector: or_not_available(data.attack_vector),
        attack_complexity: or_not_available(data.attack_complexity),
        privileges_required: or_not_available(data.privileges_required),
        user_interaction: or_not_available(data.user_interaction),
        scope: or_not_available(data.scope),
        confidentiality_impact: or_not_available(data.confidentiality_impact),
        integrity_impact: or_not_available(data.integrity_impact),
        availability_impact: or_not_available(data.availability_impact),
        base_score: data.base_score.unwrap_or(0.0),
        base_severity: or_not_available(data.base_severity),
        exploitability_score: metric.exploitability_score.unwrap_or(0.0),
        impact_score: metric.impact_score.unwrap_or(0.0),
    }
}

// one row per (weakness, description) pair
fn normalize_weakness(weakness: raw::Weakness) -> Vec<Weakness> {
    let source = or_not_available(weakness.source);
    weakness
        .description
        .into_iter()
        .map(|description| Weakness {
            source: source.clone(),
            description: or_not_available(description.value),
        })
        .collect()
}

fn normalize_configuration(configuration: raw::Configuration) -> Configuration {
    let operator = or_not_available(configuration.operator);
    let negate = configuration.negate.unwrap_or(false);

    let products = configuration
        .nodes
        .into_iter()
        .flat_map(|node| node.cpe_match)
        .map(|cpe| {
            let criteria = cpe.criteria.unwrap_or_default();
            let fields = decompose_criteria(&criteria);
            Product {
                vulnerable: cpe.vulnerable.unwrap_or(false),
                criteria,
                part: fields.part,
                vendor: fields.vendor,
                product: fields.product,
                version: fields.version,
                version_end_excluding: or_not_available(cpe.version_end_excluding),
            }
        })
        .collect();

    Configuration {
        operator,
        negate,
        products,
    }
}

fn normalize_reference(reference: raw::Reference) -> Reference {
    Reference {
        url: or_not_available(reference.url),
        source: or_not_available(reference.source),
        tags: reference.tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const WINDOW_PAGE: &str = include_str!("fixtures/window_page.json");

    fn parse_page(json: &str) -> raw::FeedPage {
        serde_json::from_str(json).expect("fixture parses")
    }

    #[test_case("cpe:2.3:a:apache:http_server:2.4.1", "a", "apache", "http_server", "2.4.1"; "full criteria")]
    #[test_case("cpe:2.3:o:linux", "o", "linux", "N/A", "N/A"; "truncated after vendor")]
    #[test_case("cpe:2.3", "N/A", "N/A", "N/A", "N/A"; "no segments past prefix")]
    #[test_case("", "N/A", "N/A", "N/A", "N/A"; "empty string")]
    fn criteria_decomposition(
        criteria: &str,
        part: &str,
        vendor: &str,
        product: &str,
        version: &str,
    ) {
        let fields = decompose_criteria(criteria);
        assert_eq!(fields.part, part);
        assert_eq!(fields.vendor, vendor);
        assert_eq!(fields.product, product);
        assert_eq!(fields.version, version);
    }

    #[test]
    fn criteria_segments_rejoin_to_the_original_substring() {
        let criteria = "cpe:2.3:a:apache:http_server:2.4.1:*:*:*:*:*:*:*";
        let fields = decompose_criteria(criteria);

        let rejoined = [fields.part, fields.vendor, fields.product, fields.version].join(":");
        assert_eq!(rejoined, "a:apache:http_server:2.4.1");
        assert!(criteria.contains(&rejoined));
    }

    #[test]
    fn fixture_page_fans_out_to_the_expected_row_counts() {
        let entries = normalize(parse_page(WINDOW_PAGE));

        assert_eq!(entries.len(), 2);

        let entry = &entries[0];
        assert_eq!(entry.cve_id, "CVE-2024-21625");
        assert_eq!(entry.source_identifier, "cve@mitre.org");
        assert_eq!(entry.vuln_status, "Analyzed");
        assert!(entry.published.is_some());
        assert!(entry.last_modified.is_some());

        assert_eq!(entry.descriptions.len(), 2);
        assert_eq!(entry.metrics.len(), 1);
        assert_eq!(entry.weaknesses.len(), 2);
        assert_eq!(entry.configurations.len(), 1);
        assert_eq!(entry.configurations[0].products.len(), 2);
        assert_eq!(entry.references.len(), 1);
        assert_eq!(entry.references[0].tags, vec!["Patch", "Vendor Advisory"]);
    }

    #[test]
    fn fixture_products_share_their_configuration_operator() {
        let entries = normalize(parse_page(WINDOW_PAGE));
        let configuration = &entries[0].configurations[0];

        assert_eq!(configuration.operator, "OR");
        assert!(!configuration.negate);

        let first = &configuration.products[0];
        assert!(first.vulnerable);
        assert_eq!(first.part, "a");
        assert_eq!(first.vendor, "apache");
        assert_eq!(first.product, "http_server");
        assert_eq!(first.version, "2.4.1");
        assert_eq!(first.version_end_excluding, "2.4.58");

        let second = &configuration.products[1];
        assert_eq!(second.vendor, "apache");
        assert_eq!(second.version_end_excluding, "N/A");
    }

    #[test]
    fn weaknesses_unroll_one_row_per_description() {
        let entries = normalize(parse_page(WINDOW_PAGE));
        let weaknesses = &entries[0].weaknesses;

        assert_eq!(weaknesses.len(), 2);
        assert!(weaknesses.iter().all(|w| w.source == "nvd@nist.gov"));
        assert_eq!(weaknesses[0].description, "CWE-22");
        assert_eq!(weaknesses[1].description, "CWE-434");
    }

    #[test]
    fn source_order_is_preserved_without_dedup() {
        let entries = normalize(parse_page(WINDOW_PAGE));
        let ids: Vec<&str> = entries.iter().map(|e| e.cve_id.as_str()).collect();
        assert_eq!(ids, vec!["CVE-2024-21625", "CVE-2024-0001"]);
    }

    #[test]
    fn bare_record_normalizes_with_defaults_everywhere() {
        let page = parse_page(r#"{"vulnerabilities":[{"cve":{"id":"CVE-2024-0002"}}]}"#);
        let entries = normalize(page);

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.cve_id, "CVE-2024-0002");
        assert_eq!(entry.source_identifier, "");
        assert_eq!(entry.vuln_status, "");
        assert!(entry.published.is_none());
        assert!(entry.last_modified.is_none());
        assert!(entry.descriptions.is_empty());
        assert!(entry.metrics.is_empty());
        assert!(entry.weaknesses.is_empty());
        assert!(entry.configurations.is_empty());
        assert!(entry.references.is_empty());
    }

    #[test]
    fn metric_defaults_apply_when_cvss_data_is_empty() {
        let page = parse_page(
            r#"{"vulnerabilities":[{"cve":{
                "id":"CVE-2024-0003",
                "metrics":{"cvssMetricV31":[{}]}
            }}]}"#,
        );
        let entries = normalize(page);
        let metric = &entries[0].metrics[0];

        assert_eq!(metric.version, "N/A");
        assert_eq!(metric.vector_string, "N/A");
        assert_eq!(metric.base_severity, "N/A");
        assert_eq!(metric.base_score, 0.0);
        assert_eq!(metric.exploitability_score, 0.0);
        assert_eq!(metric.impact_score, 0.0);
    }

    #[test]
    fn records_without_id_or_container_are_skipped() {
        let page = parse_page(
            r#"{"vulnerabilities":[
                {"cve":{"sourceIdentifier":"cve@mitre.org"}},
                {},
                {"cve":{"id":""}},
                {"cve":{"id":"CVE-2024-0004"}}
            ]}"#,
        );
        let entries = normalize(page);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cve_id, "CVE-2024-0004");
    }

    #[test]
    fn empty_page_normalizes_to_nothing() {
        assert!(normalize(parse_page(r#"{"vulnerabilities":[]}"#)).is_empty());
        assert!(normalize(parse_page("{}")).is_empty());
    }

    #[test]
    fn unparseable_timestamps_degrade_to_none() {
        let page = parse_page(
            r#"{"vulnerabilities":[{"cve":{
                "id":"CVE-2024-0005",
                "published":"not a date",
                "lastModified":"2024-01-03T14:02:11.843"
            }}]}"#,
        );
        let entries = normalize(page);
        let entry = &entries[0];

        assert!(entry.published.is_none());
        assert_eq!(
            entry.last_modified.map(|t| t.to_string()),
            Some("2024-01-03 14:02:11.843".into())
        );
    }
}
