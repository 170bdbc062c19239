//! Manifest generation: imaging datatype availability, cohort
//! recovery, and the append-only persistence discipline.

pub mod builder;
pub mod store;

pub use builder::{attach_cohorts, build_manifest, imaging_availability, load_cohort_table};
pub use store::{load_manifest, reconcile_manifest, COLS_MANIFEST};
