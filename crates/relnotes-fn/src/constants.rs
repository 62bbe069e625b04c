//! Constants for the release notes function

/// Public table holding every Google Cloud release note
pub const RELEASE_NOTES_TABLE: &str =
    "bigquery-public-data.google_cloud_release_notes.release_notes";

/// Latest notes for one product and note type, newest first.
///
/// Both filter values are bind parameters (`@product`, `@releaseNoteType`).
pub const RELEASE_NOTES_SQL: &str = "SELECT
    product_name,
    release_note_type,
    product_version_name,
    description,
    published_at
FROM `bigquery-public-data.google_cloud_release_notes.release_notes`
WHERE
    product_name = @product AND
    release_note_type = @releaseNoteType
GROUP BY product_name, product_version_name, release_note_type, description, published_at
ORDER BY published_at DESC
LIMIT 10";

/// Row cap baked into [`RELEASE_NOTES_SQL`]
pub const RESULT_LIMIT: usize = 10;

/// Job location of the public dataset
pub const QUERY_LOCATION: &str = "US";

/// Bind parameter carrying the product name
pub const PARAM_PRODUCT: &str = "product";

/// Bind parameter carrying the note type
pub const PARAM_RELEASE_NOTE_TYPE: &str = "releaseNoteType";

/// Product looked up when the request names none
pub const DEFAULT_PRODUCT: &str = "Compute Engine";

/// Note type looked up when the request names none
pub const DEFAULT_RELEASE_NOTE_TYPE: &str = "FEATURE";

/// Text emitted for a null cell under the sentinel null style
pub const NULL_SENTINEL: &str = "NULL";

/// Leading text of every failure response body
pub const ERROR_PREFIX: &str = "Error calling release notes lookup";

/// Health status: success
pub const STATUS_OK: &str = "ok";
