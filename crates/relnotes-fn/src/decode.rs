//! Result row decoding

use relnotes_bigquery::{Row, Value};

use crate::types::ReleaseNote;
use crate::{Error, Result};

/// Column positions in the lookup's select list
pub mod column {
    pub const PRODUCT_NAME: usize = 0;
    pub const RELEASE_NOTE_TYPE: usize = 1;
    pub const PRODUCT_VERSION_NAME: usize = 2;
    pub const DESCRIPTION: usize = 3;
    pub const PUBLISHED_AT: usize = 4;
    pub const COUNT: usize = 5;
}

/// Textual form of a cell; `None` for SQL `NULL`.
#[must_use]
pub fn cell_text(value: &Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Decode one row positionally.
pub fn decode_row(row: &Row) -> Result<ReleaseNote> {
    if row.len() < column::COUNT {
        return Err(Error::Decode(format!(
            "expected {} columns, row has {}",
            column::COUNT,
            row.len()
        )));
    }
    let text = |index: usize| row.get(index).and_then(cell_text);

    Ok(ReleaseNote {
        product_name: text(column::PRODUCT_NAME),
        product_version_name: text(column::PRODUCT_VERSION_NAME),
        release_note_type: text(column::RELEASE_NOTE_TYPE),
        description: text(column::DESCRIPTION),
        published_at: text(column::PUBLISHED_AT),
    })
}
