use std::path::Path;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style as SynStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Syntax colouring for editor windows.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: Option<Theme>,
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get(theme_name)
            .or_else(|| {
                log::warn!("Unknown syntax theme '{}', using {}", theme_name, FALLBACK_THEME);
                theme_set.themes.get(FALLBACK_THEME)
            })
            .or_else(|| theme_set.themes.values().next())
            .cloned();

        Self {
            syntax_set,
            theme_set,
            theme,
        }
    }

    pub fn set_theme(&mut self, theme_name: &str) -> bool {
        match self.theme_set.themes.get(theme_name) {
            Some(theme) => {
                self.theme = Some(theme.clone());
                true
            }
            None => false,
        }
    }

    /// Picks a syntax by file name, falling back to plain text.
    pub fn syntax_for_path(&self, path: Option<&Path>) -> &SyntaxReference {
        let plain = self.syntax_set.find_syntax_plain_text();
        let Some(path) = path else {
            return plain;
        };
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return plain;
        };
        self.syntax_set
            .find_syntax_by_extension(ext)
            .unwrap_or(plain)
    }

    /// Highlights a run of visible lines. Each line is styled independently of
    /// anything above the viewport.
    pub fn highlight(&self, lines: &[String], syntax: &SyntaxReference) -> Vec<Line<'static>> {
        let Some(theme) = &self.theme else {
            return lines.iter().map(|line| Line::from(line.clone())).collect();
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        lines
            .iter()
            .map(|line| {
                // The newline-aware syntax set expects terminated lines.
                let terminated = format!("{}\n", line);
                let regions = highlighter
                    .highlight_line(&terminated, &self.syntax_set)
                    .unwrap_or_else(|_| vec![(SynStyle::default(), terminated.as_str())]);

                let spans: Vec<Span<'static>> = regions
                    .into_iter()
                    .map(|(style, text)| (style, text.trim_end_matches('\n')))
                    .filter(|(_, text)| !text.is_empty())
                    .map(|(style, text)| Span::styled(text.to_string(), to_ratatui_style(style)))
                    .collect();
                Line::from(spans)
            })
            .collect()
    }
}

fn to_ratatui_style(style: SynStyle) -> Style {
    let fg = style.foreground;
    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_theme_falls_back() {
        let mut highlighter = Highlighter::new("no-such-theme");
        assert!(highlighter.theme.is_some());
        assert!(!highlighter.set_theme("still-missing"));
        assert!(highlighter.set_theme("InspiredGitHub"));
    }

    #[test]
    fn test_syntax_detection() {
        let highlighter = Highlighter::new(FALLBACK_THEME);
        let rust = highlighter.syntax_for_path(Some(Path::new("main.rs")));
        assert_eq!(rust.name, "Rust");

        let untitled = highlighter.syntax_for_path(None);
        assert_eq!(untitled.name, "Plain Text");

        let unknown = highlighter.syntax_for_path(Some(Path::new("notes.zzz")));
        assert_eq!(unknown.name, "Plain Text");
    }

    #[test]
    fn test_highlight_keeps_text() {
        let highlighter = Highlighter::new(FALLBACK_THEME);
        let syntax = highlighter.syntax_for_path(Some(Path::new("lib.rs")));
        let lines = vec!["fn main() {}".to_string(), String::new()];

        let rendered = highlighter.highlight(&lines, syntax);
        assert_eq!(rendered.len(), 2);
        let text: String = rendered[0]
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(text, "fn main() {}");
        assert!(rendered[1].spans.is_empty());
    }
}
