pub mod delimited;
pub mod file_type;
pub mod table;

pub use delimited::Delimiter;
pub use file_type::{detect_file_type, is_table_file, FileType};
pub use table::Table;

#[cfg(test)]
mod tests;
