//! Row cursor over query results

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{Client, with_cancel};
use crate::error::{BigQueryError, Result};
use crate::schema::Schema;
use crate::value::Value;
use crate::wire::{JobReferenceWire, QueryResultsPage, TableCell};

/// Delay before asking again when results are not ready yet
const RESULTS_RETRY: Duration = Duration::from_millis(250);

/// One decoded result row, positionally aligned with its schema
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub const fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at column position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).and_then(|i| self.values.get(i))
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Forward-only, page-at-a-time cursor (`jobs.getQueryResults`).
///
/// Borrows the [`Client`] it reads through, so it cannot outlive the
/// connection handle.
#[derive(Debug)]
pub struct RowIterator<'c> {
    client: &'c Client,
    job: JobReferenceWire,
    schema: Option<Arc<Schema>>,
    buffer: VecDeque<Vec<TableCell>>,
    page_token: Option<String>,
    page_size: Option<u32>,
    exhausted: bool,
}

impl<'c> RowIterator<'c> {
    pub(crate) const fn new(client: &'c Client, job: JobReferenceWire) -> Self {
        Self {
            client,
            job,
            schema: None,
            buffer: VecDeque::new(),
            page_token: None,
            page_size: None,
            exhausted: false,
        }
    }

    /// Cap the number of rows requested per page (`maxResults`).
    #[must_use]
    pub const fn with_page_size(mut self, rows: u32) -> Self {
        self.page_size = Some(rows);
        self
    }

    /// Result schema, known once the first page has arrived.
    #[must_use]
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    /// Pull the next row, fetching another page when the buffer runs dry.
    ///
    /// Returns `Ok(None)` once every page has been consumed.
    pub async fn next(&mut self, ctx: &CancellationToken) -> Result<Option<Row>> {
        loop {
            if let Some(cells) = self.buffer.pop_front() {
                return self.decode(cells).map(Some);
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page(ctx).await?;
        }
    }

    async fn fetch_page(&mut self, ctx: &CancellationToken) -> Result<()> {
        let mut url = self
            .client
            .project_url(&["queries", self.job.job_id.as_str()])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(location) = &self.job.location {
                pairs.append_pair("location", location);
            }
            if let Some(token) = &self.page_token {
                pairs.append_pair("pageToken", token);
            }
            if let Some(rows) = self.page_size {
                pairs.append_pair("maxResults", &rows.to_string());
            }
            pairs.append_pair("formatOptions.useInt64Timestamp", "true");
        }

        let page: QueryResultsPage = self
            .client
            .execute(ctx, self.client.http().get(url))
            .await?;

        if !page.job_complete {
            tracing::trace!(job_id = %self.job.job_id, "Results not ready, retrying");
            return with_cancel(ctx, async {
                tokio::time::sleep(RESULTS_RETRY).await;
                Ok(())
            })
            .await;
        }

        if self.schema.is_none()
            && let Some(schema) = page.schema
        {
            self.schema = Some(Arc::new(Schema::from(schema)));
        }

        self.buffer.extend(page.rows.into_iter().map(|row| row.f));
        self.page_token = page.page_token.filter(|t| !t.is_empty());
        self.exhausted = self.page_token.is_none();

        tracing::trace!(
            job_id = %self.job.job_id,
            buffered = self.buffer.len(),
            more = !self.exhausted,
            "Fetched result page"
        );
        Ok(())
    }

    fn decode(&self, cells: Vec<TableCell>) -> Result<Row> {
        let schema = self
            .schema
            .clone()
            .ok_or_else(|| BigQueryError::decode("result rows arrived without a schema"))?;
        if cells.len() != schema.len() {
            return Err(BigQueryError::decode(format!(
                "row has {} cells, schema has {} fields",
                cells.len(),
                schema.len()
            )));
        }

        let values = cells
            .iter()
            .zip(schema.fields())
            .map(|(cell, field)| Value::from_cell(&cell.v, field.field_type()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::new(schema, values))
    }
}
