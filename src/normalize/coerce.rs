use super::NormalizeError;

/// Sentinel the detail feed writes where a count is not available or not
/// comparable.
pub const NOT_AVAILABLE: &str = "N";

/// Parse a size-bucket count, mapping the [`NOT_AVAILABLE`] sentinel to 0.
///
/// Treating a withheld bucket as zero establishments (rather than missing)
/// is the feed-wide policy for this pipeline; keeping it in one place keeps
/// the approximation visible. The sentinel match is case-sensitive: a
/// lowercase `"n"` is a data fault, not a sentinel.
pub fn coerce_count(column: &str, raw: &str) -> Result<i64, NormalizeError> {
    if raw.trim() == NOT_AVAILABLE {
        return Ok(0);
    }
    parse_count(column, raw)
}

/// Strictly parse a non-negative count. No sentinel handling.
pub fn parse_count(column: &str, raw: &str) -> Result<i64, NormalizeError> {
    let v = raw.trim();
    let fault = || NormalizeError::Coercion {
        column: column.to_string(),
        value: v.to_string(),
    };
    let n = v.parse::<i64>().map_err(|_| fault())?;
    if n < 0 {
        return Err(fault());
    }
    Ok(n)
}
