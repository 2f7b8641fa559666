pub mod icons;
pub mod output;
pub mod table;

pub use icons::Icons;
pub use output::{dim, error, header, info, section, success, summary_row};
pub use table::{count_table, entity_table, TableBuilder};
