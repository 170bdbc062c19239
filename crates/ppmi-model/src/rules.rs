//! Typed rule records driving the description classifier.
//!
//! Each classification target (a datatype or an anatomical suffix) is
//! described by one [`DatatypeRule`]. The classifier engine interprets
//! the record; the record itself carries no behavior beyond substring
//! matching.

/// Rule record for one classification target.
///
/// All matching is case-insensitive substring containment; the
/// `exclude_*` lists are exact (case-sensitive) description matches.
#[derive(Debug, Clone, Default)]
pub struct DatatypeRule {
    /// Substrings commonly found in descriptions for this target.
    pub common_substrings: Vec<String>,
    /// Exact descriptions removed from the within-modality pool.
    pub exclude_in: Vec<String>,
    /// Exact descriptions removed from the out-of-modality pool.
    pub exclude_out: Vec<String>,
    /// Substrings whose presence rejects a description outright.
    pub reject_substrings: Vec<String>,
    /// Substrings that rescue a description from rejection.
    pub reject_substrings_exceptions: Vec<String>,
    /// Substrings required in the imaging protocol column.
    pub protocol_include: Vec<String>,
    /// Substrings rejected in the imaging protocol column.
    pub protocol_exclude: Vec<String>,
}

impl DatatypeRule {
    /// Whether `haystack` contains any of `needles`, ignoring case.
    pub fn contains_any(haystack: &str, needles: &[String]) -> bool {
        let lowered = haystack.to_lowercase();
        needles
            .iter()
            .any(|needle| lowered.contains(&needle.to_lowercase()))
    }

    pub fn matches_common(&self, description: &str) -> bool {
        Self::contains_any(description, &self.common_substrings)
    }

    pub fn matches_reject(&self, description: &str) -> bool {
        Self::contains_any(description, &self.reject_substrings)
    }

    pub fn matches_reject_exception(&self, description: &str) -> bool {
        Self::contains_any(description, &self.reject_substrings_exceptions)
    }

    /// Applies the protocol-column filters. Rows with an empty protocol
    /// value never satisfy an include filter.
    pub fn protocol_allows(&self, protocol: &str) -> bool {
        if !self.protocol_include.is_empty()
            && !Self::contains_any(protocol, &self.protocol_include)
        {
            return false;
        }
        if !self.protocol_exclude.is_empty() && Self::contains_any(protocol, &self.protocol_exclude)
        {
            return false;
        }
        true
    }
}

/// Convenience for building rule lists from string literals.
pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_matching_ignores_case() {
        let rule = DatatypeRule {
            common_substrings: strings(&["dti", "DW"]),
            ..DatatypeRule::default()
        };
        assert!(rule.matches_common("AX DTI 32 DIR"));
        assert!(rule.matches_common("dw_ssh_iso"));
        assert!(!rule.matches_common("MPRAGE"));
    }

    #[test]
    fn rejection_exceptions_are_independent_of_rejections() {
        let rule = DatatypeRule {
            reject_substrings: strings(&["t2"]),
            reject_substrings_exceptions: strings(&["T1 REPEAT2"]),
            ..DatatypeRule::default()
        };
        assert!(rule.matches_reject("AX T2 FSE"));
        assert!(rule.matches_reject("T1 Repeat2"));
        assert!(rule.matches_reject_exception("t1 repeat2"));
    }

    #[test]
    fn protocol_filters_combine_include_and_exclude() {
        let rule = DatatypeRule {
            protocol_include: strings(&["Acquisition Type=3D"]),
            protocol_exclude: strings(&["Weighting=PD"]),
            ..DatatypeRule::default()
        };
        assert!(rule.protocol_allows("Acquisition Type=3D;Weighting=T1"));
        assert!(!rule.protocol_allows("Acquisition Type=2D;Weighting=T1"));
        assert!(!rule.protocol_allows("Acquisition Type=3D;Weighting=PD"));
        assert!(!rule.protocol_allows(""));
    }
}
