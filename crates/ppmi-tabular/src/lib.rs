//! Tabular study-data processing: duplicate-resolution filters, the
//! static/longitudinal merge engine, and bagel assembly.

pub mod bagel;
pub mod filters;
pub mod join;
pub mod merge;
mod table;

pub use bagel::{build_bagel, dashboard_bagel, COL_DASH_BIDS_ID, COL_DASH_SESSION};
pub use filters::{
    age_filter, apply_loading_filters, education_filter, updrs3_on_off_splitter, upsit_filter,
    COL_AGE, COL_EDUCATION, COL_UPDRS3, COL_UPDRS3_OFF, COL_UPDRS3_ON, COL_UPSIT,
};
pub use join::{merge_against_index, merge_frame_list, merge_frames, JoinHow, MergeOutcome};
pub use merge::{load_tabular_info, merge_tabular_info, tabular_info_and_merge, TabularInfo};
