//! Canonical sample-id normalization.
//!
//! Every provider and dataset loader spells sample ids its own way: the
//! manifest uses plain integers, some loaders emit float-typed columns
//! ("7.0"), and runners prefix their own name ("whisper_stt_0007").
//! All joins between result sets go through [`normalize_id`] so those
//! spellings collapse to a single canonical key. Raw ids are never compared
//! anywhere else in the workspace.

/// Canonical key for a numeric sample id: a 4-digit zero-padded decimal.
pub fn canonical_id(id: u32) -> String {
    format!("{:04}", id)
}

/// Normalize an arbitrary id spelling to its canonical key.
///
/// Integral floats ("7.0") and plain digit strings ("7", "0007") render as a
/// 4-digit zero-padded decimal; numbers wider than 4 digits are kept
/// unpadded. Other strings contribute their trailing run of digits, padded to
/// 4 when shorter. Strings with no trailing digits pass through unchanged.
///
/// The function is idempotent: `normalize_id(&normalize_id(x)) == normalize_id(x)`.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();

    // Loaders that route ids through a float column produce "7.0" spellings.
    if trimmed.contains('.') {
        if let Ok(value) = trimmed.parse::<f64>() {
            if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
                return format!("{:04}", value as u64);
            }
        }
    }

    let digit_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx);

    match digit_start {
        Some(idx) => {
            let digits = &trimmed[idx..];
            if digits.len() <= 4 {
                format!("{:0>4}", digits)
            } else {
                digits.to_string()
            }
        }
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_spellings_collapse() {
        assert_eq!(canonical_id(7), "0007");
        assert_eq!(normalize_id("7"), "0007");
        assert_eq!(normalize_id("7.0"), "0007");
        assert_eq!(normalize_id("0007"), "0007");
        assert_eq!(normalize_id("svc_stt_0007"), "0007");
    }

    #[test]
    fn test_prefixed_ids() {
        assert_eq!(normalize_id("whisper_stt_0004"), "0004");
        assert_eq!(normalize_id("deepgram_stt_12"), "0012");
    }

    #[test]
    fn test_wide_ids_stay_unpadded() {
        assert_eq!(normalize_id("12345"), "12345");
        assert_eq!(normalize_id("aws_stt_123456"), "123456");
        assert_eq!(canonical_id(12345), "12345");
    }

    #[test]
    fn test_no_digits_passes_through() {
        assert_eq!(normalize_id("no-digits-here"), "no-digits-here");
        assert_eq!(normalize_id(""), "");
    }

    #[test]
    fn test_idempotence() {
        for raw in ["7", "7.0", "0007", "aws_stt_0007", "12345", "plain", ""] {
            let once = normalize_id(raw);
            assert_eq!(normalize_id(&once), once, "not idempotent for {raw:?}");
        }
    }
}
