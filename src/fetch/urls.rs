// src/fetch/urls.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// Census Bureau root for the County/ZIP Business Patterns datasets.
static DATASET_ROOT: &str = "https://www2.census.gov/programs-surveys/cbp/datasets";

static DETAIL_ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)zbp(\d{2})detail\.zip$").expect("valid regex"));

/// Archive filename for one year, e.g. `zbp16detail.zip`.
pub fn detail_zip_name(year: i32) -> String {
    format!("zbp{:02}detail.zip", year.rem_euclid(100))
}

/// Full download URL for one year's detail archive.
pub fn detail_zip_url(year: i32) -> String {
    format!("{}/{}/{}", DATASET_ROOT, year, detail_zip_name(year))
}

/// Recover the vintage year from an archive filename. The detail series
/// starts in 1994, so two-digit years below that fall in the 2000s.
pub fn year_from_zip_name(name: &str) -> Option<i32> {
    let caps = DETAIL_ZIP_RE.captures(name)?;
    let yy: i32 = caps[1].parse().ok()?;
    Some(if yy >= 94 { 1900 + yy } else { 2000 + yy })
}
