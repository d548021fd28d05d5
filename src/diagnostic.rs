use std::fmt;

/// A 1-based line/column location in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Placeholder for errors raised before a position is known (e.g. inside builtins).
    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A label pointing at a run of characters on one source line
#[derive(Debug, Clone)]
pub struct Label {
    pub position: Position,
    pub width: usize,
    pub message: String,
}

impl Label {
    pub fn primary(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            width: 1,
            message: message.into(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }
}

/// A complete diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

fn source_line(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.checked_sub(1)?)
}

/// Diagnostic renderer for rustc-style error output
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    /// Render a diagnostic to a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        // Header line: error[E0101]: message
        self.render_header(&mut output, diagnostic);

        let mut lines_to_show: Vec<usize> = diagnostic
            .labels
            .iter()
            .filter(|label| !label.position.is_unknown())
            .map(|label| label.position.line)
            .collect();
        lines_to_show.sort();
        lines_to_show.dedup();

        if let Some(first) = diagnostic.labels.iter().find(|l| !l.position.is_unknown()) {
            // Location line: --> file:line:col
            output.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.style_blue("-->"),
                self.file_name,
                first.position.line,
                first.position.column
            ));

            let max_line = lines_to_show.last().copied().unwrap_or(1);
            let width = max_line.to_string().len();

            output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.style_blue("|")));
            for &line_num in &lines_to_show {
                self.render_line(&mut output, diagnostic, line_num, width);
            }
            output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.style_blue("|")));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.style_blue("="), note));
        }

        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity_str = match diagnostic.severity {
            Severity::Error => self.style_red_bold("error"),
            Severity::Warning => self.style_yellow_bold("warning"),
        };

        if let Some(code) = &diagnostic.code {
            output.push_str(&format!(
                "{}[{}]: {}\n",
                severity_str,
                code,
                self.style_bold(&diagnostic.message)
            ));
        } else {
            output.push_str(&format!("{}: {}\n", severity_str, self.style_bold(&diagnostic.message)));
        }
    }

    fn render_line(&self, output: &mut String, diagnostic: &Diagnostic, line_num: usize, width: usize) {
        let content = match source_line(self.source, line_num) {
            Some(content) => content,
            None => return,
        };

        output.push_str(&format!(
            "{:>width$} {} {}\n",
            self.style_blue(&line_num.to_string()),
            self.style_blue("|"),
            content,
            width = width + 1
        ));

        let mut labels: Vec<&Label> = diagnostic
            .labels
            .iter()
            .filter(|l| l.position.line == line_num)
            .collect();
        labels.sort_by_key(|l| l.position.column);

        let mut underline = String::new();
        let mut col = 1;
        for label in &labels {
            while col < label.position.column {
                underline.push(' ');
                col += 1;
            }
            for _ in 0..label.width {
                underline.push('^');
                col += 1;
            }
        }
        output.push_str(&format!(
            "{} {} {}\n",
            " ".repeat(width + 1),
            self.style_blue("|"),
            self.style_red(&underline)
        ));

        for label in labels.iter().filter(|l| !l.message.is_empty()) {
            output.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(width + 1),
                self.style_blue("|"),
                " ".repeat(label.position.column.saturating_sub(1)),
                self.style_red(&label.message)
            ));
        }
    }

    // Color helpers
    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1;31m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_yellow_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1;33m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[34m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }

    fn style_bold(&self, s: &str) -> String {
        if self.use_color {
            format!("\x1b[1m{}\x1b[0m", s)
        } else {
            s.to_string()
        }
    }
}

/// Render multiple diagnostics followed by an abort summary
pub fn render_diagnostics(source: &str, file_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    if error_count > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }

    output
}
