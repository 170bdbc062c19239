pub mod bids_key;
pub mod evaluator;
pub mod overrides;
pub mod protocol;
pub mod series;

pub use bids_key::BidsKey;
pub use evaluator::{HeuristicContext, TemplateInfo};
pub use overrides::RE_NEUROMELANIN;
pub use protocol::{AcqDims, Plane};
pub use series::{SeriesRecord, image_id_from_dcm, read_dicominfo};
