//! Parser for fpcalc raw output
//!
//! Expected grammar, newline-separated:
//!
//! ```text
//! DURATION=<integer>
//! FINGERPRINT=<uint>,<uint>,...,<uint>
//! ```
//!
//! The format is neither versioned nor strongly specified, so parsing is
//! deliberately strict: any deviation surfaces as a typed failure instead of
//! silently producing a wrong fingerprint that would then be cached.

use crate::error::FingerprintError;
use crate::item::Fingerprint;
use std::path::Path;

const FINGERPRINT_PREFIX: &str = "FINGERPRINT=";

/// Parse raw fpcalc output into a validated fingerprint.
///
/// The second line must start with the literal `FINGERPRINT=` prefix; the
/// first line (duration) is not interpreted. An empty value list is legal
/// and yields an empty fingerprint.
pub fn parse_tool_output(raw: &str, media_path: &Path) -> Result<Fingerprint, FingerprintError> {
    let mut lines = raw.lines();
    let fingerprint_line = match (lines.next(), lines.next()) {
        (Some(_duration_line), Some(line)) => line.trim_end(),
        _ => {
            log::debug!(
                "fpcalc output for {} has fewer than 2 lines: {:?}",
                media_path.display(),
                raw
            );
            return Err(FingerprintError::MalformedOutput {
                media_path: media_path.to_path_buf(),
            });
        }
    };

    let values = match fingerprint_line.strip_prefix(FINGERPRINT_PREFIX) {
        Some(rest) => rest,
        None => {
            log::debug!(
                "fpcalc output for {} lacks the {:?} prefix: {:?}",
                media_path.display(),
                FINGERPRINT_PREFIX,
                raw
            );
            return Err(FingerprintError::MalformedOutput {
                media_path: media_path.to_path_buf(),
            });
        }
    };

    if values.is_empty() {
        return Ok(Fingerprint::new(Vec::new()));
    }

    let parsed = values
        .split(',')
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| FingerprintError::NumberFormat {
                    token: token.to_string(),
                    media_path: media_path.to_path_buf(),
                })
        })
        .collect::<Result<Vec<u32>, _>>()?;

    Ok(Fingerprint::new(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn media() -> PathBuf {
        PathBuf::from("/media/show/episode01.mkv")
    }

    #[test]
    fn test_parse_well_formed_output() {
        let fp = parse_tool_output("DURATION=120\nFINGERPRINT=1,2,3", &media()).unwrap();
        assert_eq!(fp.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_parse_u32_boundary_values() {
        let fp =
            parse_tool_output("DURATION=120\nFINGERPRINT=4294967295,0,1", &media()).unwrap();
        assert_eq!(fp.as_slice(), &[4294967295, 0, 1]);
    }

    #[test]
    fn test_single_line_is_malformed() {
        let err = parse_tool_output("garbage", &media()).unwrap_err();
        match err {
            FingerprintError::MalformedOutput { media_path } => {
                assert_eq!(media_path, media());
            }
            other => panic!("expected MalformedOutput, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(matches!(
            parse_tool_output("", &media()),
            Err(FingerprintError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_missing_prefix_is_malformed() {
        assert!(matches!(
            parse_tool_output("DURATION=120\n1,2,3", &media()),
            Err(FingerprintError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_non_numeric_token_fails() {
        let err = parse_tool_output("DURATION=120\nFINGERPRINT=1,x,3", &media()).unwrap_err();
        match err {
            FingerprintError::NumberFormat { token, .. } => assert_eq!(token, "x"),
            other => panic!("expected NumberFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_value_above_u32_fails() {
        assert!(matches!(
            parse_tool_output("DURATION=120\nFINGERPRINT=4294967296", &media()),
            Err(FingerprintError::NumberFormat { .. })
        ));
    }

    #[test]
    fn test_empty_value_list_is_legal() {
        let fp = parse_tool_output("DURATION=0\nFINGERPRINT=", &media()).unwrap();
        assert!(fp.is_empty());
    }

    #[test]
    fn test_trailing_lines_are_ignored() {
        let fp = parse_tool_output("DURATION=120\nFINGERPRINT=7,8\nextra", &media()).unwrap();
        assert_eq!(fp.as_slice(), &[7, 8]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let fp = parse_tool_output("DURATION=120\r\nFINGERPRINT=5,6\r\n", &media()).unwrap();
        assert_eq!(fp.as_slice(), &[5, 6]);
    }
}
