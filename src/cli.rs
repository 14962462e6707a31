//! Terminal output helpers shared by the subcommands.

pub mod progress;
pub mod report;

pub use report::{Report, ReportItem};

/// `1 test`, `2 tests`.
pub fn pluralize(count: usize, singular: &str) -> String {
    match count {
        1 => format!("1 {singular}"),
        _ => format!("{count} {singular}s"),
    }
}

/// Wrap text to a width, breaking overlong words so nested reports cannot
/// overflow the terminal.
pub fn pretty_wrap(text: &str, width: usize) -> Vec<std::borrow::Cow<'_, str>> {
    textwrap::wrap(
        text,
        textwrap::Options::new(width.max(1))
            .break_words(true)
            .wrap_algorithm(textwrap::WrapAlgorithm::OptimalFit(Default::default())),
    )
}
