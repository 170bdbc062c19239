//! Canonical column names for the manifest, bagel, and PPMI source files.

// ----- manifest / bagel columns -----
pub const COL_PARTICIPANT_ID: &str = "participant_id";
pub const COL_VISIT_ID: &str = "visit_id";
pub const COL_SESSION_ID: &str = "session_id";
pub const COL_DATATYPE: &str = "datatype";
pub const COL_NEUROMELANIN: &str = "neuromelanin";
pub const COL_BIDS_ID: &str = "bids_participant_id";
pub const COL_ASSESSMENT_NAME: &str = "assessment_name";
pub const COL_ASSESSMENT_SCORE: &str = "assessment_score";

// ----- PPMI study data (tabular CSV) columns -----
pub const COL_SUBJECT_TABULAR: &str = "PATNO";
pub const COL_VISIT_TABULAR: &str = "EVENT_ID";
pub const COL_GROUP_TABULAR: &str = "COHORT_DEFINITION";

// ----- PPMI imaging inventory (CSV download) columns -----
pub const COL_SUBJECT_IMAGING: &str = "Subject ID";
pub const COL_VISIT_IMAGING: &str = "Visit";
pub const COL_GROUP_IMAGING: &str = "Research Group";
pub const COL_MODALITY_IMAGING: &str = "Modality";
pub const COL_DESCRIPTION_IMAGING: &str = "Description";
pub const COL_PROTOCOL_IMAGING: &str = "Imaging Protocol";
pub const COL_IMAGE_ID: &str = "Image ID";

/// BIDS participant identifier (`sub-<label>`) for a raw subject ID.
pub fn bids_participant_id(participant_id: &str) -> String {
    format!("sub-{participant_id}")
}
