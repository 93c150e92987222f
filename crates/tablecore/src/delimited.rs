//! Reading and writing delimiter-separated values.
//!
//! Quoting follows RFC 4180: a field wrapped in double quotes may contain the
//! delimiter, line breaks and doubled quotes.

const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "CSV",
            Delimiter::Tab => "TSV",
        }
    }

    /// `.tsv` files are tab separated, everything else is comma separated.
    pub fn for_filename(filename: &str) -> Self {
        if filename.to_lowercase().ends_with(".tsv") {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }

    /// Guesses the delimiter from the first non-empty line.
    pub fn sniff(text: &str) -> Self {
        let first = text.lines().find(|line| !line.trim().is_empty());
        match first {
            Some(line) if line.matches('\t').count() > line.matches(',').count() => {
                Delimiter::Tab
            }
            _ => Delimiter::Comma,
        }
    }
}

pub fn parse(text: &str, delimiter: Delimiter) -> Vec<Vec<String>> {
    let sep = delimiter.as_char();
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    // true once the current record has seen any character
    let mut pending = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            QUOTE if field.is_empty() && !was_quoted => {
                in_quotes = true;
                was_quoted = true;
                pending = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                was_quoted = false;
                pending = false;
            }
            c if c == sep => {
                record.push(std::mem::take(&mut field));
                was_quoted = false;
                pending = true;
            }
            c => {
                field.push(c);
                pending = true;
            }
        }
    }

    if pending {
        record.push(field);
        records.push(record);
    }

    records
}

pub fn write<R, F>(rows: R, delimiter: Delimiter) -> String
where
    R: IntoIterator<Item = F>,
    F: AsRef<[String]>,
{
    let sep = delimiter.as_char();
    let mut out = String::new();

    for row in rows {
        for (i, field) in row.as_ref().iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            write_field(&mut out, field, sep);
        }
        out.push('\n');
    }

    out
}

fn write_field(out: &mut String, field: &str, sep: char) {
    let needs_quotes = field
        .chars()
        .any(|c| c == sep || c == QUOTE || c == '\n' || c == '\r');

    if !needs_quotes {
        out.push_str(field);
        return;
    }

    out.push(QUOTE);
    for c in field.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_simple_csv() {
        let parsed = parse("a,b,c\n1,2,3\n", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["a", "b", "c"], &["1", "2", "3"]]));
    }

    #[test]
    fn test_no_trailing_newline() {
        let parsed = parse("a,b\n1,2", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["a", "b"], &["1", "2"]]));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("", Delimiter::Comma).is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse("a,b\r\n1,2\r\n", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["a", "b"], &["1", "2"]]));
    }

    #[test]
    fn test_quoted_fields() {
        let text = "name,quote\n\"Smith, J\",\"said \"\"hi\"\"\"\n";
        let parsed = parse(text, Delimiter::Comma);
        assert_eq!(
            parsed,
            rows(&[&["name", "quote"], &["Smith, J", "said \"hi\""]])
        );
    }

    #[test]
    fn test_quoted_line_break() {
        let parsed = parse("\"line one\nline two\",x\n", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["line one\nline two", "x"]]));
    }

    #[test]
    fn test_empty_fields_and_lines() {
        let parsed = parse("a,,c\n\n,\n", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["a", "", "c"], &[""], &["", ""]]));
    }

    #[test]
    fn test_unterminated_quote_keeps_rest() {
        let parsed = parse("\"open,field\nmore", Delimiter::Comma);
        assert_eq!(parsed, rows(&[&["open,field\nmore"]]));
    }

    #[test]
    fn test_tab_delimited() {
        let parsed = parse("a\tb,c\n1\t2\n", Delimiter::Tab);
        assert_eq!(parsed, rows(&[&["a", "b,c"], &["1", "2"]]));
    }

    #[test]
    fn test_write_quotes_only_when_needed() {
        let data = rows(&[&["plain", "with,comma", "with \"quote\""], &["multi\nline", ""]]);
        let out = write(&data, Delimiter::Comma);
        assert_eq!(
            out,
            "plain,\"with,comma\",\"with \"\"quote\"\"\"\n\"multi\nline\",\n"
        );
    }

    #[test]
    fn test_write_tab_keeps_commas_bare() {
        let data = rows(&[&["a,b", "c\td"]]);
        assert_eq!(write(&data, Delimiter::Tab), "a,b\t\"c\td\"\n");
    }

    #[test]
    fn test_write_then_parse_preserves_tricky_fields() {
        let data = rows(&[&["x", "\"", ",\n,"], &["", "end"]]);
        let text = write(&data, Delimiter::Comma);
        assert_eq!(parse(&text, Delimiter::Comma), data);
    }

    #[test]
    fn test_delimiter_for_filename() {
        assert_eq!(Delimiter::for_filename("a.TSV"), Delimiter::Tab);
        assert_eq!(Delimiter::for_filename("a.csv"), Delimiter::Comma);
        assert_eq!(Delimiter::for_filename("notes.txt"), Delimiter::Comma);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(Delimiter::sniff("\n\na\tb\tc\n"), Delimiter::Tab);
        assert_eq!(Delimiter::sniff("a,b\tc,d"), Delimiter::Comma);
        assert_eq!(Delimiter::sniff(""), Delimiter::Comma);
    }
}
