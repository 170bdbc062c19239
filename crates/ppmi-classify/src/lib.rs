pub mod description_map;
pub mod engine;
pub mod rules;

pub use description_map::{AnatDescriptions, DescriptionMap};
pub use engine::{classify_inventory, ignored_descriptions};
