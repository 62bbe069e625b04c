//! Release notes query construction

use relnotes_bigquery::Query;

use crate::constants::{
    PARAM_PRODUCT, PARAM_RELEASE_NOTE_TYPE, QUERY_LOCATION, RELEASE_NOTES_SQL,
};
use crate::types::ReleaseNoteQuery;

/// Build the lookup query for one product and note type.
///
/// Values are forwarded verbatim as `STRING` bind parameters; an unknown
/// product or type simply matches nothing.
#[must_use]
pub fn build_query(params: &ReleaseNoteQuery) -> Query {
    Query::new(RELEASE_NOTES_SQL)
        .with_parameter(PARAM_PRODUCT, params.product.as_str())
        .with_parameter(PARAM_RELEASE_NOTE_TYPE, params.release_note_type.as_str())
        .with_location(QUERY_LOCATION)
}
