use super::NormalizeError;

/// Whether `code` is a top-level 2-digit NAICS sector code.
///
/// The detail feed pads sector rows to six characters with trailing dashes
/// (`"11----"`); finer subdivisions keep more digits (`"1111--"`), and the
/// all-industries total is all dashes (`"------"`). The bare two-digit form
/// (`"11"`) also counts, so codes that have already been truncated pass
/// through unchanged.
///
/// Evaluated on the untruncated raw code; callers truncate after acceptance.
pub fn is_2digit_sector(code: &str) -> Result<bool, NormalizeError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(NormalizeError::InvalidCode {
            code: code.to_string(),
        });
    }
    let b = code.as_bytes();
    Ok(b.len() >= 2 && b[..2].iter().all(u8::is_ascii_digit) && b[2..].iter().all(|&c| c == b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_sector_codes_match() {
        assert!(is_2digit_sector("11----").unwrap());
        assert!(is_2digit_sector("62----").unwrap());
        assert!(is_2digit_sector("99----").unwrap());
    }

    #[test]
    fn finer_subdivisions_do_not_match() {
        assert!(!is_2digit_sector("1111--").unwrap());
        assert!(!is_2digit_sector("111110").unwrap());
        assert!(!is_2digit_sector("62441-").unwrap());
    }

    #[test]
    fn all_industries_total_does_not_match() {
        assert!(!is_2digit_sector("------").unwrap());
    }

    #[test]
    fn bare_two_digit_form_matches() {
        // already-normalized codes come back through unchanged
        assert!(is_2digit_sector("11").unwrap());
        assert!(!is_2digit_sector("1").unwrap());
    }

    #[test]
    fn empty_code_is_malformed() {
        assert!(matches!(
            is_2digit_sector(""),
            Err(NormalizeError::InvalidCode { .. })
        ));
        assert!(matches!(
            is_2digit_sector("   "),
            Err(NormalizeError::InvalidCode { .. })
        ));
    }
}
