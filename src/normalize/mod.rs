//! Normalization of one year's raw ZBP detail table into the fixed
//! thirteen-column schema shared by every year.
//!
//! The feed's raw schema drifts across vintages (the smallest size bucket
//! was renamed for 2017 onward); everything downstream of this module sees
//! one canonical column set regardless of which vintage supplied the data.

pub mod coerce;
pub mod sector;

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::ingest::RawTable;

/// Canonical name of the 1–4 employee bucket, whichever raw name carried it.
pub const SMALL_BUCKET: &str = "n1_4";

/// The remaining size buckets, in canonical order. Stable across vintages.
pub const UPPER_BUCKETS: [&str; 8] = [
    "n5_9", "n10_19", "n20_49", "n50_99", "n100_249", "n250_499", "n500_999", "n1000",
];

/// Column order of the normalized output.
pub const OUTPUT_COLUMNS: [&str; 13] = [
    "zip", "naics", "est", "n1_4", "n5_9", "n10_19", "n20_49", "n50_99", "n100_249", "n250_499",
    "n500_999", "n1000", "year",
];

/// Which raw header set a detail file uses.
///
/// Adding a future vintage means adding a variant and its column name here,
/// not another branch in the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Pre2017,
    Post2016,
}

impl SchemaVersion {
    pub fn for_year(year: i32) -> Self {
        if year <= 2016 {
            Self::Pre2017
        } else {
            Self::Post2016
        }
    }

    /// Raw header of the 1–4 employee bucket under this version.
    pub fn small_bucket_column(self) -> &'static str {
        match self {
            Self::Pre2017 => "n1_4",
            Self::Post2016 => "n<5",
        }
    }
}

/// A data-quality fault in one year's detail table. Never recovered from
/// here; the orchestration layer decides presentation.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// An expected raw column is absent for the given year's schema.
    #[error("detail table for {year} is missing expected column `{column}`")]
    Schema { column: String, year: i32 },
    /// A count column held something that is neither the sentinel nor a
    /// non-negative integer.
    #[error("column `{column}` holds invalid count `{value}`")]
    Coercion { column: String, value: String },
    /// An industry code the sector classifier cannot interpret at all.
    #[error("malformed industry code `{code}`")]
    InvalidCode { code: String },
}

/// One normalized detail row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub zip: String,
    /// 2-character sector code.
    pub naics: String,
    /// Total establishment count.
    pub est: i64,
    pub n1_4: i64,
    pub n5_9: i64,
    pub n10_19: i64,
    pub n20_49: i64,
    pub n50_99: i64,
    pub n100_249: i64,
    pub n250_499: i64,
    pub n500_999: i64,
    pub n1000: i64,
    pub year: i32,
}

/// Normalize one year's raw detail table.
///
/// Resolves the vintage's expected columns (dropping every other raw
/// column), unifies the renamed small bucket under [`SMALL_BUCKET`], keeps
/// only rows whose zip is whitelisted and whose industry code is
/// sector-level, truncates accepted codes to two characters, coerces the
/// nine bucket counts (`"N"` becomes 0), and stamps every row with `year`.
/// Output order follows input order.
///
/// Pure over its inputs: no I/O, no state between invocations.
pub fn normalize(
    table: &RawTable,
    year: i32,
    zip_codes: &HashSet<String>,
) -> Result<Vec<DetailRow>, NormalizeError> {
    let version = SchemaVersion::for_year(year);

    let require = |name: &str| {
        table.column(name).ok_or_else(|| NormalizeError::Schema {
            column: name.to_string(),
            year,
        })
    };

    let zip_col = require("zip")?;
    let naics_col = require("naics")?;
    let est_col = require("est")?;
    // The drift slot: this vintage's raw name, or the canonical name when
    // the input has already been normalized once.
    let small_col = match table.column(version.small_bucket_column()) {
        Some(idx) => idx,
        None => require(SMALL_BUCKET)?,
    };
    let mut upper_cols = [0usize; 8];
    for (slot, name) in upper_cols.iter_mut().zip(UPPER_BUCKETS) {
        *slot = require(name)?;
    }

    let mut out = Vec::new();
    for row in &table.rows {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("").trim();

        let zip = cell(zip_col);
        if !zip_codes.contains(zip) {
            continue;
        }
        let code = cell(naics_col);
        if !sector::is_2digit_sector(code)? {
            continue;
        }

        let est = coerce::parse_count("est", cell(est_col))?;
        let mut buckets = [0i64; 9];
        buckets[0] = coerce::coerce_count(SMALL_BUCKET, cell(small_col))?;
        for (i, (&name, &col)) in UPPER_BUCKETS.iter().zip(upper_cols.iter()).enumerate() {
            buckets[i + 1] = coerce::coerce_count(name, cell(col))?;
        }

        out.push(DetailRow {
            zip: zip.to_string(),
            // safe: acceptance guarantees two leading ASCII digits
            naics: code[..2].to_string(),
            est,
            n1_4: buckets[0],
            n5_9: buckets[1],
            n10_19: buckets[2],
            n20_49: buckets[3],
            n50_99: buckets[4],
            n100_249: buckets[5],
            n250_499: buckets[6],
            n500_999: buckets[7],
            n1000: buckets[8],
            year,
        });
    }

    debug!(
        year,
        kept = out.len(),
        total = table.rows.len(),
        "normalized detail table"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn whitelist(zips: &[&str]) -> HashSet<String> {
        zips.iter().map(|z| z.to_string()).collect()
    }

    /// Raw headers of a pre-2017 detail file, including columns the
    /// normalizer must drop.
    const PRE2017_HEADERS: [&str; 13] = [
        "zip", "naics", "emp", "est", "n1_4", "n5_9", "n10_19", "n20_49", "n50_99", "n100_249",
        "n250_499", "n500_999", "n1000",
    ];

    const POST2016_HEADERS: [&str; 13] = [
        "zip", "naics", "emp", "est", "n<5", "n5_9", "n10_19", "n20_49", "n50_99", "n100_249",
        "n250_499", "n500_999", "n1000",
    ];

    /// Rebuild a raw table from normalized rows, treating the canonical
    /// columns as raw input.
    fn to_raw(rows: &[DetailRow]) -> RawTable {
        RawTable {
            headers: OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| {
                    vec![
                        r.zip.clone(),
                        r.naics.clone(),
                        r.est.to_string(),
                        r.n1_4.to_string(),
                        r.n5_9.to_string(),
                        r.n10_19.to_string(),
                        r.n20_49.to_string(),
                        r.n50_99.to_string(),
                        r.n100_249.to_string(),
                        r.n250_499.to_string(),
                        r.n500_999.to_string(),
                        r.n1000.to_string(),
                        r.year.to_string(),
                    ]
                })
                .collect(),
        }
    }

    #[test]
    fn sentinel_truncation_and_year_stamp() {
        let raw = table(
            &PRE2017_HEADERS,
            &[&[
                "10001", "11----", "37", "5", "N", "2", "0", "0", "1", "0", "0", "0", "0",
            ]],
        );
        let rows = normalize(&raw, 2015, &whitelist(&["10001"])).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.zip, "10001");
        assert_eq!(row.naics, "11");
        assert_eq!(row.est, 5);
        assert_eq!(row.n1_4, 0);
        assert_eq!(row.n5_9, 2);
        assert_eq!(row.n50_99, 1);
        assert_eq!(row.n1000, 0);
        assert_eq!(row.year, 2015);
    }

    #[test]
    fn drift_rename_is_transparent() {
        let cells: &[&str] = &[
            "92093", "54----", "88", "12", "7", "3", "1", "1", "0", "0", "0", "0", "0",
        ];
        let zips = whitelist(&["92093"]);
        let pre = normalize(&table(&PRE2017_HEADERS, &[cells]), 2015, &zips).unwrap();
        let post = normalize(&table(&POST2016_HEADERS, &[cells]), 2018, &zips).unwrap();
        assert_eq!(pre.len(), 1);
        assert_eq!(post.len(), 1);
        assert_eq!(pre[0].n1_4, 7);
        assert_eq!(post[0].n1_4, 7);
        // identical apart from the year stamp
        let mut restamped = post[0].clone();
        restamped.year = 2015;
        assert_eq!(pre[0], restamped);
    }

    #[test]
    fn rows_outside_whitelist_are_dropped() {
        let raw = table(
            &PRE2017_HEADERS,
            &[
                &[
                    "92093", "11----", "1", "1", "1", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "60601", "11----", "1", "1", "1", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
            ],
        );
        let rows = normalize(&raw, 2016, &whitelist(&["92093"])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].zip, "92093");
    }

    #[test]
    fn finer_naics_levels_are_dropped() {
        let raw = table(
            &PRE2017_HEADERS,
            &[
                &[
                    "92093", "1111--", "9", "3", "3", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "92093", "------", "9", "3", "3", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "92093", "11----", "9", "3", "3", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
            ],
        );
        let rows = normalize(&raw, 2016, &whitelist(&["92093"])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].naics, "11");
    }

    #[test]
    fn output_order_follows_input_order() {
        let raw = table(
            &PRE2017_HEADERS,
            &[
                &[
                    "92122", "44----", "4", "2", "2", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "60601", "44----", "4", "2", "2", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "92093", "44----", "4", "2", "2", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
                &[
                    "92122", "62----", "4", "2", "2", "0", "0", "0", "0", "0", "0", "0", "0",
                ],
            ],
        );
        let rows = normalize(&raw, 2014, &whitelist(&["92122", "92093"])).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| (r.zip.as_str(), r.naics.as_str())).collect();
        assert_eq!(keys, vec![("92122", "44"), ("92093", "44"), ("92122", "62")]);
    }

    #[test]
    fn missing_drift_column_is_a_schema_fault() {
        // 2018 file that still uses neither `n<5` nor `n1_4`
        let headers: [&str; 12] = [
            "zip", "naics", "est", "n5_9", "n10_19", "n20_49", "n50_99", "n100_249", "n250_499",
            "n500_999", "n1000", "emp",
        ];
        let err = normalize(&table(&headers, &[]), 2018, &whitelist(&["92093"])).unwrap_err();
        match err {
            NormalizeError::Schema { column, year } => {
                assert_eq!(column, "n1_4");
                assert_eq!(year, 2018);
            }
            other => panic!("expected schema fault, got {other:?}"),
        }
    }

    #[test]
    fn coercion_fault_names_column_and_value() {
        let raw = table(
            &PRE2017_HEADERS,
            &[&[
                "92093", "11----", "9", "3", "1", "x", "0", "0", "0", "0", "0", "0", "0",
            ]],
        );
        let err = normalize(&raw, 2016, &whitelist(&["92093"])).unwrap_err();
        match err {
            NormalizeError::Coercion { column, value } => {
                assert_eq!(column, "n5_9");
                assert_eq!(value, "x");
            }
            other => panic!("expected coercion fault, got {other:?}"),
        }
    }

    #[test]
    fn sentinel_est_is_a_fault() {
        // the zero-for-unavailable policy covers the size buckets only
        let raw = table(
            &PRE2017_HEADERS,
            &[&[
                "92093", "11----", "9", "N", "1", "0", "0", "0", "0", "0", "0", "0", "0",
            ]],
        );
        assert!(matches!(
            normalize(&raw, 2016, &whitelist(&["92093"])),
            Err(NormalizeError::Coercion { .. })
        ));
    }

    #[test]
    fn empty_industry_code_is_a_fault() {
        let raw = table(
            &PRE2017_HEADERS,
            &[&[
                "92093", "", "9", "3", "1", "0", "0", "0", "0", "0", "0", "0", "0",
            ]],
        );
        assert!(matches!(
            normalize(&raw, 2016, &whitelist(&["92093"])),
            Err(NormalizeError::InvalidCode { .. })
        ));
    }

    #[test]
    fn normalizing_twice_is_a_noop() {
        let cells: &[&str] = &[
            "92122", "48----", "30", "8", "N", "4", "2", "1", "0", "0", "0", "0", "1",
        ];
        let zips = whitelist(&["92122"]);
        for year in [2015, 2018] {
            let headers = if year <= 2016 {
                &PRE2017_HEADERS
            } else {
                &POST2016_HEADERS
            };
            let once = normalize(&table(headers, &[cells]), year, &zips).unwrap();
            let twice = normalize(&to_raw(&once), year, &zips).unwrap();
            assert_eq!(once, twice, "year {year}");
        }
    }

    #[test]
    fn schema_version_resolution() {
        assert_eq!(SchemaVersion::for_year(2012), SchemaVersion::Pre2017);
        assert_eq!(SchemaVersion::for_year(2016), SchemaVersion::Pre2017);
        assert_eq!(SchemaVersion::for_year(2017), SchemaVersion::Post2016);
        assert_eq!(SchemaVersion::Post2016.small_bucket_column(), "n<5");
    }
}
