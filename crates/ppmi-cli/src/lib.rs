//! Library components shared by the curation CLI binary.

pub mod logging;
