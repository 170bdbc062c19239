//! Visit identifier mappings.
//!
//! Imaging inventory downloads label visits with long-form names
//! ("Month 12"); tabular study data uses short event codes ("V04").
//! Sessions reuse the event code, rendered as `ses-<code>` where a
//! BIDS label is needed.

use crate::error::{CurationError, Result};

/// Maps a long-form imaging visit label to its study event code.
///
/// Fails hard on an unmapped label so a new visit type in a fresh
/// download cannot silently produce manifest rows with a bogus visit.
pub fn visit_code(label: &str) -> Result<&'static str> {
    let code = match label.trim() {
        "Baseline" => "BL",
        "Month 6" => "R01",
        "Month 12" => "V04",
        "Month 24" => "V06",
        "Month 36" => "V08",
        "Month 48" => "V10",
        "Screening" => "SC",
        "Premature Withdrawal" => "PW",
        "Symptomatic Therapy" => "ST",
        "Unscheduled Visit 01" => "U01",
        "Unscheduled Visit 02" => "U02",
        other => return Err(CurationError::UnmappedVisit(other.to_string())),
    };
    Ok(code)
}

/// Chronological sort key for a study event code.
///
/// Screening precedes baseline; other codes order by their embedded
/// number. Codes with no embedded digits sort last.
pub fn visit_order_key(visit: &str) -> i64 {
    match visit.trim() {
        "SC" => -10,
        "BL" => -5,
        other => {
            let digits: String = other.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<i64>().unwrap_or(i64::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_labels_map_to_event_codes() {
        assert_eq!(visit_code("Baseline").unwrap(), "BL");
        assert_eq!(visit_code("Month 12").unwrap(), "V04");
        assert_eq!(visit_code("Unscheduled Visit 02").unwrap(), "U02");
    }

    #[test]
    fn unknown_visit_label_is_fatal() {
        let err = visit_code("Month 72").unwrap_err();
        assert!(matches!(err, CurationError::UnmappedVisit(_)));
    }

    #[test]
    fn visit_ordering_puts_screening_before_baseline() {
        assert!(visit_order_key("SC") < visit_order_key("BL"));
        assert!(visit_order_key("BL") < visit_order_key("V04"));
        assert!(visit_order_key("V04") < visit_order_key("V06"));
    }
}
