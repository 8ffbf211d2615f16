use anyhow::{bail, Context, Result};
use arrow::array::Int32Array;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{collections::BTreeMap, env, fs::File, path::Path};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("usage: {} <PARQUET_FILE>", args[0]);
    }
    inspect(Path::new(&args[1]))
}

/// Print schema, row total, and per-year row counts of a normalized detail
/// parquet file.
fn inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();

    println!("=== {} ===", path.display());
    println!("columns:");
    for field in schema.fields() {
        println!("  - {:<10} {:?}", field.name(), field.data_type());
    }

    let year_idx = schema.index_of("year").context("file has no `year` column")?;
    let mut total = 0usize;
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    let reader = builder.with_batch_size(8192).build()?;
    for batch in reader {
        let batch = batch?;
        total += batch.num_rows();
        let years = batch
            .column(year_idx)
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("`year` column is not int32")?;
        for i in 0..years.len() {
            *per_year.entry(years.value(i)).or_default() += 1;
        }
    }

    println!("rows: {}", total);
    println!("rows per year:");
    for (year, count) in per_year {
        println!("  {}: {}", year, count);
    }
    Ok(())
}
