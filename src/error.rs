use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

/// Identifies the source buffer a span points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u32);

/// An immutable view of `len` bytes starting at `start` in one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub buffer: BufferId,
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(buffer: BufferId, start: usize, len: usize) -> Self {
        Self { buffer, start, len }
    }

    pub fn single(buffer: BufferId, pos: usize) -> Self {
        Self::new(buffer, pos, 1)
    }

    pub fn empty(buffer: BufferId, pos: usize) -> Self {
        Self::new(buffer, pos, 0)
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Smallest span covering every span in `spans`.
    ///
    /// Panics when `spans` is empty or the spans come from different buffers;
    /// both are bugs in the caller, not user errors.
    pub fn encompass(spans: &[Span]) -> Span {
        let first = spans.first().expect("encompass needs at least one span");
        let mut start = first.start;
        let mut end = first.end();
        for span in spans {
            assert_eq!(
                span.buffer, first.buffer,
                "cannot encompass spans from different buffers"
            );
            start = start.min(span.start);
            end = end.max(span.end());
        }
        Span::new(first.buffer, start, end - start)
    }

    pub fn to(&self, other: &Span) -> Span {
        Span::encompass(&[*self, *other])
    }

    /// The text this span covers, or `""` when it lies outside `source`.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end()).unwrap_or("")
    }

    /// 1-based line and column of the span start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let mut line = 1;
        let mut column = 1;
        for (offset, c) in source.char_indices() {
            if offset >= self.start {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "Lexical Error"),
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LoopError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl LoopError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, message)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, message, help)
    }

    /// Plain-text diagnostic: the message, the position, and a window of the
    /// previous line, the offending line with a caret, and the next line.
    pub fn context(&self, source: &str) -> String {
        let (line, column) = self.span.line_col(source);
        let lines: Vec<&str> = source.split('\n').collect();
        let gutter = (line + 1).to_string().len();

        let mut out = format!("error: {}\n", self.message);
        out.push_str(&format!("{:>gutter$}--> {}:{}\n", "", line, column));

        if line > 1 {
            if let Some(prev) = lines.get(line - 2) {
                out.push_str(&format!("{:>gutter$} | {}\n", line - 1, prev));
            }
        }

        let current = lines.get(line - 1).copied().unwrap_or("");
        out.push_str(&format!("{:>gutter$} | {}\n", line, current));

        let remaining = current.chars().count().saturating_sub(column - 1);
        let width = self.span.len.min(remaining).max(1);
        out.push_str(&format!(
            "{:>gutter$} | {}{}\n",
            "",
            " ".repeat(column - 1),
            "^".repeat(width)
        ));

        if let Some(next) = lines.get(line) {
            out.push_str(&format!("{:>gutter$} | {}\n", line + 1, next));
        }

        if let Some(ref help_text) = self.help {
            out.push_str(&format!("help: {}\n", help_text));
        }

        out
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        let end = self.span.end().max(self.span.start + 1);
        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(format!("{}: {}", self.kind.fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if let Err(e) = report_builder
            .finish()
            .eprint((filename, Source::from(source)))
        {
            log::warn!("failed to render diagnostic: {}", e);
            eprintln!("{}", self.context(source));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B: BufferId = BufferId(0);

    #[test]
    fn encompass_covers_all_spans() {
        let a = Span::new(B, 4, 2);
        let b = Span::new(B, 1, 1);
        let c = Span::new(B, 7, 3);
        assert_eq!(Span::encompass(&[a, b, c]), Span::new(B, 1, 9));
        assert_eq!(a.to(&b), Span::new(B, 1, 5));
    }

    #[test]
    #[should_panic(expected = "different buffers")]
    fn encompass_rejects_mixed_buffers() {
        Span::encompass(&[Span::new(B, 0, 1), Span::new(BufferId(1), 2, 1)]);
    }

    #[test]
    fn line_col_is_one_based() {
        let src = "a := 1\nbb := 2\n";
        assert_eq!(Span::new(B, 0, 1).line_col(src), (1, 1));
        assert_eq!(Span::new(B, 7, 2).line_col(src), (2, 1));
        assert_eq!(Span::new(B, 10, 2).line_col(src), (2, 4));
    }

    #[test]
    fn slice_reproduces_text() {
        let src = "x := 40 + 2";
        assert_eq!(Span::new(B, 5, 6).slice(src), "40 + 2");
        assert_eq!(Span::new(B, 50, 2).slice(src), "");
    }

    #[test]
    fn context_window_marks_column() {
        let src = "a := 1\nb := a + true\nc := 3";
        let err = LoopError::runtime_error(Span::new(B, 12, 8), "type mismatch".to_string());
        let rendered = err.context(src);
        assert!(rendered.starts_with("error: type mismatch\n"));
        assert!(rendered.contains("--> 2:6"));
        assert!(rendered.contains("1 | a := 1"));
        assert!(rendered.contains("2 | b := a + true"));
        assert!(rendered.contains(" |      ^^^^^^^^\n"));
        assert!(rendered.contains("3 | c := 3"));
    }
}
