pub mod advisory;
pub mod category;
pub mod cohort;
pub mod columns;
pub mod config;
pub mod error;
pub mod rules;
pub mod visits;

pub use advisory::{Advisory, AdvisoryKind, AdvisoryLog};
pub use category::{AnatSuffix, Datatype, ImageCategory};
pub use config::{CurationConfig, FileSpec, TabularFileSpec, VolumeCountOverride};
pub use error::{CurationError, Result};
pub use rules::DatatypeRule;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_session_and_category_compose() {
        let code = visits::visit_code("Month 24").unwrap();
        assert_eq!(code, "V06");
        assert_eq!(cohort::normalize_group("PD").unwrap(), "Parkinson's Disease");

        let category = ImageCategory::Anatomical(AnatSuffix::T1w);
        assert_eq!(category.datatype().modality_tag(), "MRI");
        assert_eq!(
            columns::bids_participant_id("3000"),
            "sub-3000".to_string()
        );
    }
}
