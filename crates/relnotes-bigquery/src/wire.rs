//! JSON shapes of the BigQuery v2 REST resources this crate touches.

use serde::{Deserialize, Serialize};

use crate::query::{ParameterValue, Query};

// ═══════════════════════════════════════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════════════════════════════════════

/// `jobs.insert` request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInsert<'a> {
    pub job_reference: JobReferenceRequest<'a>,
    pub configuration: JobConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReferenceRequest<'a> {
    pub project_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct JobConfiguration<'a> {
    pub query: JobConfigurationQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationQuery<'a> {
    pub query: &'a str,
    pub use_legacy_sql: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_parameters: Vec<WireParameter<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParameter<'a> {
    pub name: &'a str,
    pub parameter_type: WireParameterType,
    pub parameter_value: WireParameterValue,
}

#[derive(Debug, Serialize)]
pub struct WireParameterType {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WireParameterValue {
    pub value: String,
}

impl<'a> JobInsert<'a> {
    pub fn new(project_id: &'a str, query: &'a Query) -> Self {
        let query_parameters: Vec<WireParameter<'a>> = query
            .parameters()
            .iter()
            .map(|p| WireParameter {
                name: p.name(),
                parameter_type: WireParameterType {
                    kind: p.value().type_name(),
                },
                parameter_value: WireParameterValue {
                    value: wire_value(p.value()),
                },
            })
            .collect();

        Self {
            job_reference: JobReferenceRequest {
                project_id,
                location: query.location(),
            },
            configuration: JobConfiguration {
                query: JobConfigurationQuery {
                    query: query.sql(),
                    use_legacy_sql: false,
                    parameter_mode: (!query_parameters.is_empty()).then_some("NAMED"),
                    query_parameters,
                },
            },
        }
    }
}

fn wire_value(value: &ParameterValue) -> String {
    match value {
        ParameterValue::String(s) => s.clone(),
        ParameterValue::Int64(v) => v.to_string(),
        ParameterValue::Bool(v) => v.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════════════════════

/// `Job` resource as returned by `jobs.insert` and `jobs.get`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResource {
    pub job_reference: JobReferenceWire,
    pub status: Option<JobStatusWire>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReferenceWire {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusWire {
    pub state: String,
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorProto {
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// `jobs.getQueryResults` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultsPage {
    #[serde(default)]
    pub job_complete: bool,
    pub schema: Option<TableSchemaWire>,
    pub page_token: Option<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
pub struct TableSchemaWire {
    #[serde(default)]
    pub fields: Vec<FieldWire>,
}

#[derive(Debug, Deserialize)]
pub struct FieldWire {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub v: serde_json::Value,
}

/// Error envelope of a failed API call
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

/// Metadata-server token response
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}
