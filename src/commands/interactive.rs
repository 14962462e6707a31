//! A menu-driven front end over the run orchestrator.
//!
//! The session edits a small option bundle and re-invokes the engine on
//! demand. Input and output are injectable so the menu logic is testable
//! without a terminal.

use crate::Verbosity;
use crate::commands::run::{self, RunSettings};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use yansi::Paint;

/// The editable option bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub filter: Option<String>,
    pub tag: Option<String>,
    pub parallel: usize,
    pub incremental: bool,
    pub watch: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            filter: None,
            tag: None,
            parallel: 1,
            incremental: false,
            watch: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
enum MenuAction {
    Filter,
    Tag,
    Parallel,
    Incremental,
    Watch,
    Run,
    Clear,
    Exit,
}

pub struct InteractiveSession<R, W> {
    input: R,
    output: W,
    options: SessionOptions,
}

impl<R: BufRead, W: Write> InteractiveSession<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            options: SessionOptions::default(),
        }
    }

    /// Loop over the menu until `exit` or end of input. Unknown actions are
    /// no-ops; `run` hands the current options to `engine`.
    pub fn run(&mut self, mut engine: impl FnMut(&SessionOptions) -> Result<()>) -> Result<()> {
        loop {
            self.print_menu()?;

            let Some(line) = self.read_line()? else {
                break;
            };

            let Ok(action) = MenuAction::from_str(line.trim()) else {
                continue;
            };

            match action {
                MenuAction::Filter => {
                    self.options.filter = self.prompt("Case name pattern (empty to clear): ")?;
                }
                MenuAction::Tag => {
                    self.options.tag = self.prompt("Tag (empty to clear): ")?;
                }
                MenuAction::Parallel => match self.prompt("Worker count: ")?.and_then(|count| count.parse().ok()) {
                    Some(count) if count >= 1 => self.options.parallel = count,
                    _ => writeln!(self.output, "{}", "Worker count must be at least 1".red())?,
                },
                MenuAction::Incremental => self.options.incremental = !self.options.incremental,
                MenuAction::Watch => self.options.watch = !self.options.watch,
                MenuAction::Run => {
                    engine(&self.options)?;

                    // A watch run blocks until interrupted, so the pause
                    // would never be reached anyway.
                    if !self.options.watch {
                        writeln!(self.output, "Press Enter to continue")?;
                        if self.read_line()?.is_none() {
                            break;
                        }
                    }
                }
                MenuAction::Clear => self.options = SessionOptions::default(),
                MenuAction::Exit => break,
            }
        }

        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", "prism interactive".bold())?;
        writeln!(
            self.output,
            "  filter={} tag={} parallel={} incremental={} watch={}",
            self.options.filter.as_deref().unwrap_or("-"),
            self.options.tag.as_deref().unwrap_or("-"),
            self.options.parallel,
            self.options.incremental,
            self.options.watch
        )?;

        let actions: Vec<String> = MenuAction::iter().map(|action| action.to_string()).collect();
        writeln!(self.output, "  actions: {}", actions.join(", "))?;
        write!(self.output, "> ")?;
        self.output.flush()?;
        Ok(())
    }

    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        Ok(self.read_line()?.map(|line| line.trim().to_string()).filter(|line| !line.is_empty()))
    }

    /// `None` on end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line))
    }
}

/// Wire the session to the real engine on stdin/stdout.
pub fn interactive(verbosity: Verbosity) -> Result<ExitCode> {
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout();

    InteractiveSession::new(stdin, stdout).run(|options| {
        let settings = RunSettings {
            paths: Vec::new(),
            adapter: None,
            directory: None,
            filter: options.filter.clone(),
            exclude: None,
            tag: options.tag.clone(),
            path: None,
            parallel: options.parallel,
            incremental: options.incremental,
            watch: options.watch,
            watch_interval: 2,
            verbose: false,
            snapshot: false,
            baseline: None,
            coverage: false,
            json: false,
            only_failed: false,
        };

        let _ = run::run(verbosity, &settings)?;
        Ok(())
    })?;

    Ok(ExitCode::SUCCESS)
}
