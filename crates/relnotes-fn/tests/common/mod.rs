//! Shared fixtures for the integration tests

#![allow(dead_code)]

use relnotes_bigquery::testing::{MockBigQuery, MockBigQueryBuilder, MockRow};
use relnotes_bigquery::{ClientOptions, Credentials};
use relnotes_fn::ProjectContext;

/// Result schema of the release notes lookup, in select-list order
pub const SCHEMA: &[(&str, &str)] = &[
    ("product_name", "STRING"),
    ("release_note_type", "STRING"),
    ("product_version_name", "STRING"),
    ("description", "STRING"),
    ("published_at", "DATE"),
];

pub fn note(product: &str, kind: &str, version: Option<&str>, text: &str, date: &str) -> MockRow {
    vec![
        Some(product.to_string()),
        Some(kind.to_string()),
        version.map(str::to_string),
        Some(text.to_string()),
        Some(date.to_string()),
    ]
}

/// Three Compute Engine features, newest first
pub fn compute_engine_features() -> Vec<MockRow> {
    vec![
        note("Compute Engine", "FEATURE", Some("v1"), "C4 machines GA", "2024-03-01"),
        note("Compute Engine", "FEATURE", None, "Hyperdisk Balanced", "2024-02-15"),
        note("Compute Engine", "FEATURE", Some("v1"), "Custom images", "2024-01-10"),
    ]
}

pub fn mock() -> MockBigQueryBuilder {
    MockBigQuery::builder().project("relnotes-test").schema(SCHEMA)
}

pub fn project_for(mock: &MockBigQuery) -> ProjectContext {
    ProjectContext::new(
        mock.project_id(),
        ClientOptions::new(mock.endpoint(), &Credentials::Anonymous),
    )
}
