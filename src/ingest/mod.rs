// src/ingest/mod.rs
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
};
use tracing::debug;
use zip::ZipArchive;

/// One year's detail file, parsed but untyped.
#[derive(Debug)]
pub struct RawTable {
    /// Lowercased header names from the file's first record.
    pub headers: Vec<String>,
    /// Each data record, one `Vec<String>` per row.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of `name` among the headers.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Open `zip_path` and parse the detail CSV inside into a [`RawTable`].
///
/// The Census archives hold a single `.txt` entry; `.csv` is accepted too.
/// The entry is buffered fully before parsing so the archive handle is not
/// held across the parse.
#[tracing::instrument(level = "info", skip(zip_path), fields(path = %zip_path.as_ref().display()))]
pub fn load_detail_zip<P: AsRef<Path>>(zip_path: P) -> Result<RawTable> {
    let file = File::open(&zip_path)
        .with_context(|| format!("opening detail archive {:?}", zip_path.as_ref()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("reading detail archive {:?}", zip_path.as_ref()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).with_context(|| {
            format!("accessing entry #{} in {:?}", i, zip_path.as_ref())
        })?;
        let name = entry.name().to_string();
        let lower = name.to_lowercase();
        if !entry.is_file() || !(lower.ends_with(".txt") || lower.ends_with(".csv")) {
            continue;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("reading {} into memory", name))?;
        debug!(entry = %name, bytes = buf.len(), "buffered detail csv");
        return read_detail_csv(Cursor::new(buf)).with_context(|| format!("parsing {}", name));
    }

    Err(anyhow!(
        "no CSV entry found in {:?}",
        zip_path.as_ref()
    ))
}

/// Parse detail CSV text: the first record is the header row, the rest are
/// data. Header casing varies by vintage; the pipeline speaks lowercase.
pub fn read_detail_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        if headers.is_empty() {
            headers = record
                .iter()
                .map(|h| h.trim().trim_matches('"').to_lowercase())
                .collect();
        } else {
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
    }
    if headers.is_empty() {
        return Err(anyhow!("detail CSV is empty"));
    }

    Ok(RawTable { headers, rows })
}
