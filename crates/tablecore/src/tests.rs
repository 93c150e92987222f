#[cfg(test)]
mod unit_tests {
    use super::super::*;

    #[test]
    fn test_detected_type_drives_delimiter() {
        let name = "exports/REPORT.TSV";
        assert!(is_table_file(Some(name)));
        assert_eq!(Delimiter::for_filename(name), Delimiter::Tab);
    }

    #[test]
    fn test_edited_table_serializes() {
        let mut table = Table::parse("id,comment\n1,fine\n", Delimiter::Comma);
        table.set_cell(1, 1, "said \"hello, world\"");
        table.insert_row(2);
        table.set_cell(2, 0, "2");
        table.set_cell(2, 1, "two\nlines");

        insta::assert_snapshot!(table.to_delimited(), @r###"
        id,comment
        1,"said ""hello, world"""
        2,"two
        lines"
        "###);
    }

    #[test]
    fn test_tsv_round_trip_after_column_edit() {
        let mut table = Table::parse("a\tb\n1\t2\n", Delimiter::Tab);
        table.insert_column(1);
        table.set_cell(0, 1, "mid");

        assert_eq!(table.to_delimited(), "a\tmid\tb\n1\t\t2\n");
        assert_eq!(
            Table::parse(&table.to_delimited(), Delimiter::Tab).rows(),
            table.rows()
        );
    }
}
