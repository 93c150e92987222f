//! Decides whether a file should be shown as free text or as a table.

use std::path::Path;

const TABLE_SUFFIXES: [&str; 2] = [".csv", ".tsv"];

/// How a file is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Opened in a text editor window
    Text,
    /// CSV/TSV, opened in a table window
    Table,
}

impl FileType {
    /// Classifies a path by its final component.
    pub fn of_path(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy());
        detect_file_type(name.as_deref())
    }
}

/// Returns [`FileType::Table`] when `filename` ends with `.csv` or `.tsv`
/// (ignoring case), [`FileType::Text`] otherwise. A missing name is text.
///
/// Only the suffix matters: the name may carry a directory prefix and any
/// number of dots.
pub fn detect_file_type(filename: Option<&str>) -> FileType {
    let Some(filename) = filename else {
        return FileType::Text;
    };

    let lower = filename.to_lowercase();
    if TABLE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix)) {
        FileType::Table
    } else {
        FileType::Text
    }
}

/// Whether `filename` should open as a table.
pub fn is_table_file(filename: Option<&str>) -> bool {
    detect_file_type(filename) == FileType::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_tabular_files_regardless_of_case() {
        for name in ["data.csv", "DATA.CSV", "Data.Csv", "report.tsv", "REPORT.TSV"] {
            assert_eq!(detect_file_type(Some(name)), FileType::Table, "{}", name);
        }
    }

    #[test]
    fn test_other_files_are_text() {
        for name in [
            "readme.txt",
            "script.py",
            "Main.java",
            "config.json",
            "style.css",
            "document.md",
            "noextension",
        ] {
            assert_eq!(detect_file_type(Some(name)), FileType::Text, "{}", name);
        }
    }

    #[test]
    fn test_missing_and_empty_names() {
        assert_eq!(detect_file_type(None), FileType::Text);
        assert_eq!(detect_file_type(Some("")), FileType::Text);
        assert!(!is_table_file(None));
    }

    #[test]
    fn test_is_table_file() {
        assert!(is_table_file(Some("data.csv")));
        assert!(is_table_file(Some("export.tsv")));
        assert!(is_table_file(Some("/path/to/file.CSV")));

        assert!(!is_table_file(Some("document.txt")));
        assert!(!is_table_file(Some("image.png")));
        assert!(!is_table_file(Some("config.yaml")));
    }

    #[test]
    fn test_full_and_relative_paths() {
        assert_eq!(
            detect_file_type(Some("/home/user/documents/report.csv")),
            FileType::Table
        );
        assert_eq!(detect_file_type(Some("/var/log/system.log")), FileType::Text);
        assert_eq!(detect_file_type(Some("./data/export.tsv")), FileType::Table);
        assert_eq!(
            detect_file_type(Some("../config/settings.ini")),
            FileType::Text
        );
    }

    #[test]
    fn test_multiple_dots() {
        assert_eq!(detect_file_type(Some("report.2024.01.csv")), FileType::Table);
        assert_eq!(detect_file_type(Some("backup.old.txt")), FileType::Text);
    }

    #[test]
    fn test_suffix_only_not_substring() {
        assert_eq!(detect_file_type(Some("csvfile.txt")), FileType::Text);
        assert_eq!(detect_file_type(Some("mytsv_data.json")), FileType::Text);
        assert_eq!(detect_file_type(Some("data.csv.bak")), FileType::Text);
    }

    #[test]
    fn test_hidden_files() {
        assert_eq!(detect_file_type(Some(".hidden.csv")), FileType::Table);
        assert_eq!(detect_file_type(Some(".gitignore")), FileType::Text);
    }

    #[test]
    fn test_of_path_uses_file_name() {
        assert_eq!(
            FileType::of_path(&PathBuf::from("/tmp/sales.CSV")),
            FileType::Table
        );
        assert_eq!(
            FileType::of_path(&PathBuf::from("/tmp/tables.csv/notes.txt")),
            FileType::Text
        );
        assert_eq!(FileType::of_path(&PathBuf::from("/")), FileType::Text);
    }
}
