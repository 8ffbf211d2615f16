// src/output/mod.rs
//
// Persistence of the normalized detail table: typed arrow batch in,
// SNAPPY-compressed parquet out.

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};
use tracing::info;

use crate::normalize::{DetailRow, SMALL_BUCKET, UPPER_BUCKETS};

/// Arrow schema of the normalized detail table.
pub fn detail_schema() -> Arc<ArrowSchema> {
    let mut fields = vec![
        Field::new("zip", DataType::Utf8, false),
        Field::new("naics", DataType::Utf8, false),
        Field::new("est", DataType::Int64, false),
    ];
    for name in std::iter::once(SMALL_BUCKET).chain(UPPER_BUCKETS) {
        fields.push(Field::new(name, DataType::Int64, false));
    }
    fields.push(Field::new("year", DataType::Int32, false));
    Arc::new(ArrowSchema::new(fields))
}

/// Build a [`RecordBatch`] from normalized rows, columns in schema order.
pub fn rows_to_batch(rows: &[DetailRow]) -> Result<RecordBatch> {
    let buckets: [fn(&DetailRow) -> i64; 9] = [
        |r| r.n1_4,
        |r| r.n5_9,
        |r| r.n10_19,
        |r| r.n20_49,
        |r| r.n50_99,
        |r| r.n100_249,
        |r| r.n250_499,
        |r| r.n500_999,
        |r| r.n1000,
    ];

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.zip.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            rows.iter().map(|r| r.naics.as_str()),
        )),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.est))),
    ];
    for get in buckets {
        columns.push(Arc::new(Int64Array::from_iter_values(
            rows.iter().map(get),
        )));
    }
    columns.push(Arc::new(Int32Array::from_iter_values(
        rows.iter().map(|r| r.year),
    )));

    RecordBatch::try_new(detail_schema(), columns).context("building detail record batch")
}

/// Write the cross-year concatenation to a parquet file at `path`.
pub fn write_parquet(rows: &[DetailRow], path: &Path) -> Result<()> {
    let batch = rows_to_batch(rows)?;
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(&batch).context("writing detail batch")?;
    writer.close().context("closing parquet writer")?;
    info!(path = %path.display(), rows = rows.len(), "wrote normalized detail table");
    Ok(())
}
