pub mod csv_table;
pub mod inventory;
pub mod output;
pub mod polars_utils;
pub mod tabular;

pub use csv_table::{frame_to_csv_string, read_string_frame, write_frame_csv};
pub use inventory::load_imaging_inventory;
pub use output::save_frame_with_backup;
pub use polars_utils::{
    any_to_string, cell, column_values, filter_rows, format_numeric, parse_f64, parse_i64,
    require_columns, select_columns, string_frame,
};
pub use tabular::{LoadingFilter, load_tabular_source};
