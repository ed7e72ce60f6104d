//! Source style detection and indentation shifting
//!
//! The dominant indentation unit and line ending of a source file are
//! inferred once, right after parsing, and replayed whenever a rewrite
//! inserts content that carries no formatting of its own. The shift helpers
//! move a block of text between nesting depths and round-trip exactly:
//! shifting a block right and then left by the same amount reproduces the
//! original bytes.

use tracing::trace;

/// One unit of indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentUnit {
    /// Indent with the given number of spaces per level
    Spaces(usize),
    /// Indent with one tab per level
    Tabs,
}

impl IndentUnit {
    /// The text of a single indentation unit
    pub fn text(&self) -> String {
        match self {
            IndentUnit::Spaces(width) => " ".repeat(*width),
            IndentUnit::Tabs => "\t".to_string(),
        }
    }
}

/// Line ending convention of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Dominant formatting style of one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStyle {
    pub indent: IndentUnit,
    pub line_ending: LineEnding,
}

impl Default for SourceStyle {
    fn default() -> Self {
        Self {
            indent: IndentUnit::Spaces(4),
            line_ending: LineEnding::Lf,
        }
    }
}

impl SourceStyle {
    /// Infer the dominant indentation unit and line ending from source text.
    ///
    /// Tab-led lines outvoting space-led lines selects tabs; otherwise the
    /// space width is the smallest positive step between distinct observed
    /// indent widths (defaulting to 4 when the text shows no indentation).
    pub fn detect(text: &str) -> Self {
        let crlf = text.matches("\r\n").count();
        let lf = text.matches('\n').count();
        let line_ending = if crlf * 2 > lf {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };

        let mut tab_lines = 0usize;
        let mut space_lines = 0usize;
        let mut widths: Vec<usize> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if line.starts_with('\t') {
                tab_lines += 1;
            } else {
                let width = line.len() - line.trim_start_matches(' ').len();
                if width > 0 {
                    space_lines += 1;
                    widths.push(width);
                }
            }
        }

        let indent = if tab_lines > space_lines {
            IndentUnit::Tabs
        } else {
            widths.push(0);
            widths.sort_unstable();
            widths.dedup();
            let step = widths
                .windows(2)
                .map(|w| w[1] - w[0])
                .filter(|step| *step > 0)
                .min()
                .unwrap_or(4);
            IndentUnit::Spaces(step)
        };

        let style = Self {
            indent,
            line_ending,
        };
        trace!(?style, "detected source style");
        style
    }

    /// Text of `levels` indentation units
    pub fn indent_text(&self, levels: usize) -> String {
        self.indent.text().repeat(levels)
    }

    /// Shift every non-empty line of `text` right by `n` indent units.
    ///
    /// Empty lines are left untouched so the shift round-trips through
    /// [`SourceStyle::shift_left`].
    pub fn shift_right(&self, text: &str, n: usize) -> String {
        let unit = self.indent_text(n);
        rewrite_lines(text, |line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{unit}{line}")
            }
        })
    }

    /// Shift every line of `text` left by up to `n` indent units, removing
    /// only indentation that is actually present.
    pub fn shift_left(&self, text: &str, n: usize) -> String {
        let unit = self.indent.text();
        rewrite_lines(text, |line| {
            let mut rest = line;
            for _ in 0..n {
                match rest.strip_prefix(unit.as_str()) {
                    Some(stripped) => rest = stripped,
                    None => break,
                }
            }
            rest.to_string()
        })
    }
}

/// Apply `f` to each line's content, preserving the original terminators
/// (both `\n` and `\r\n`) exactly.
fn rewrite_lines(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segments = text.split('\n').peekable();
    while let Some(segment) = segments.next() {
        let (content, cr) = match segment.strip_suffix('\r') {
            Some(content) => (content, "\r"),
            None => (segment, ""),
        };
        out.push_str(&f(content));
        out.push_str(cr);
        if segments.peek().is_some() {
            out.push('\n');
        }
    }
    out
}
