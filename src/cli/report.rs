//! A small box-drawing renderer for nested summaries.
//!
//! Reports render as a bordered block with a bold header, wrapped body
//! items, and a footer of short status fragments. Children indent inside
//! their parent, which is how per-case details nest under a suite.

use crate::cli::pretty_wrap;
use std::fmt::Display;
use yansi::Paint;

#[derive(Debug, Default)]
pub struct Report {
    pub header: String,
    pub footer: Vec<String>,
    pub items: Vec<ReportItem>,
}

#[derive(Debug)]
pub enum ReportItem {
    /// Wrapped free-form text.
    Text(String),
    /// Aligned key/value rows.
    Table(Vec<(String, String)>),
    /// A nested report, indented by one level.
    Child(Report),
}

impl Report {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.items.push(ReportItem::Text(text.into()));
        self
    }

    pub fn child(mut self, child: Report) -> Self {
        self.items.push(ReportItem::Child(child));
        self
    }

    fn render(&self, width: usize) -> Vec<String> {
        let pipe = "│".dim().to_string();
        let mut lines = vec![format!("{}{} {}", "┌".dim(), "─".dim(), self.header.bold())];

        for item in &self.items {
            match item {
                ReportItem::Text(text) => {
                    for wrapped in pretty_wrap(text, width.saturating_sub(2)) {
                        lines.push(format!("{pipe} {wrapped}"));
                    }
                }

                ReportItem::Table(rows) => {
                    let key_width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

                    for (key, value) in rows {
                        for (index, wrapped) in
                            pretty_wrap(value, width.saturating_sub(2 + key_width)).into_iter().enumerate()
                        {
                            let label = if index == 0 {
                                format!("{key:key_width$}")
                            } else {
                                " ".repeat(key_width)
                            };

                            lines.push(format!("{pipe} {} {wrapped}", label.dim().italic()));
                        }
                    }
                }

                ReportItem::Child(child) => {
                    lines.push(format!("{pipe} "));
                    for nested in child.render(width.saturating_sub(2)) {
                        lines.push(format!("{pipe} {nested}"));
                    }
                }
            }
        }

        let mut footer = format!("{}{}{} ", "└".dim(), "─".dim(), "─".dim());
        for (index, fragment) in self.footer.iter().enumerate() {
            if index > 0 {
                footer.push_str(&format!(" {} ", "─".dim()));
            }
            footer.push_str(fragment);
        }
        lines.push(footer);

        lines
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = match textwrap::termwidth() {
            wide if wide > 40 => wide - 10,
            narrow => narrow,
        };

        write!(f, "{}", self.render(width).join("\n"))
    }
}
