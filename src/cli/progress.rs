//! Progress rendering during a run.
//!
//! Compact mode keeps a single bar updated in place; verbose mode prints one
//! line per case. Both share the same lifecycle: `start` sizes and resets
//! the counters, `advance` consumes one result, `finish` prints the summary.
//! Calls out of order are no-ops so the runner never has to care whether a
//! reporter was actually started.

use crate::suite::TestResult;
use std::io::Write;
use std::time::Instant;
use yansi::Paint;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// A single in-place progress bar.
    Compact,
    /// One line per case plus error details.
    Verbose,
}

pub struct ProgressReporter {
    mode: ProgressMode,
    out: Box<dyn Write + Send>,
    started: Option<Instant>,
    total: usize,
    current: usize,
    passed: usize,
    failed: usize,
}

impl ProgressReporter {
    pub fn stderr(mode: ProgressMode) -> Self {
        Self::with_writer(mode, Box::new(std::io::stderr()))
    }

    pub fn with_writer(mode: ProgressMode, out: Box<dyn Write + Send>) -> Self {
        Self {
            mode,
            out,
            started: None,
            total: 0,
            current: 0,
            passed: 0,
            failed: 0,
        }
    }

    /// Begin a run of `total` expected cases. Resets all counters.
    pub fn start(&mut self, total: usize) {
        self.started = Some(Instant::now());
        self.total = total;
        self.current = 0;
        self.passed = 0;
        self.failed = 0;
    }

    /// Consume one result. Does nothing before `start`.
    pub fn advance(&mut self, result: &TestResult) {
        if self.started.is_none() {
            return;
        }

        self.current += 1;
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }

        match self.mode {
            ProgressMode::Compact => self.draw_bar(),
            ProgressMode::Verbose => self.print_case(result),
        }
    }

    /// Print the summary and reset. Does nothing before `start`.
    pub fn finish(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };

        if self.mode == ProgressMode::Compact && self.current > 0 {
            writeln!(self.out).ok();
        }

        writeln!(
            self.out,
            "Completed in {:.2}s | {} passed, {} failed",
            started.elapsed().as_secs_f64(),
            self.passed,
            self.failed
        )
        .ok();
        writeln!(self.out).ok();
        writeln!(self.out).ok();
        self.out.flush().ok();
    }

    fn draw_bar(&mut self) {
        let percent = if self.total == 0 {
            100
        } else {
            (self.current * 100 / self.total).min(100)
        };
        let filled = BAR_WIDTH * percent / 100;

        write!(
            self.out,
            "\r[{}{}] {}/{} ({percent}%)",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            self.current,
            self.total
        )
        .ok();
        self.out.flush().ok();
    }

    fn print_case(&mut self, result: &TestResult) {
        let mark = if result.passed {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };

        writeln!(
            self.out,
            "{mark} {} – {} ({}s)",
            result.group,
            result.description,
            format!("{:.3}", result.duration).dim()
        )
        .ok();

        if !result.passed
            && let Some(error) = result.error.as_deref().filter(|error| !error.is_empty())
        {
            writeln!(self.out, "  {}", error.dim()).ok();
        }

        self.out.flush().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// A writer that exposes what was written.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn result(passed: bool, error: Option<&str>) -> TestResult {
        TestResult {
            id: "suite:file:0:0".to_string(),
            file: PathBuf::from("file.json"),
            group: "numbers".to_string(),
            description: "zero is valid".to_string(),
            data: json!(0),
            expected: true,
            actual: passed,
            passed,
            error: error.map(str::to_string),
            duration: 0.002,
            tags: Vec::new(),
        }
    }

    fn reporter(mode: ProgressMode) -> (ProgressReporter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (ProgressReporter::with_writer(mode, Box::new(buffer.clone())), buffer)
    }

    #[test]
    fn advance_and_finish_without_start_are_no_ops() {
        let (mut progress, buffer) = reporter(ProgressMode::Verbose);
        progress.advance(&result(true, None));
        progress.finish();
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn compact_mode_draws_a_bar_with_counts() {
        let (mut progress, buffer) = reporter(ProgressMode::Compact);
        progress.start(4);
        progress.advance(&result(true, None));
        progress.advance(&result(false, None));

        let output = buffer.contents();
        assert!(output.contains("[###############---------------] 2/4 (50%)"), "got: {output}");
    }

    #[test]
    fn verbose_mode_prints_one_line_per_case() {
        yansi::disable();
        let (mut progress, buffer) = reporter(ProgressMode::Verbose);
        progress.start(2);
        progress.advance(&result(true, None));
        progress.advance(&result(false, Some("expected valid")));
        yansi::enable();

        let output = buffer.contents();
        assert!(output.contains("✓ numbers – zero is valid (0.002s)"), "got: {output}");
        assert!(output.contains("✗ numbers – zero is valid (0.002s)"));
        assert!(output.contains("  expected valid"));
    }

    #[test]
    fn failures_without_an_error_have_no_continuation_line() {
        yansi::disable();
        let (mut progress, buffer) = reporter(ProgressMode::Verbose);
        progress.start(1);
        progress.advance(&result(false, Some("")));
        yansi::enable();

        let output = buffer.contents();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn finish_prints_the_summary_and_two_blank_lines() {
        let (mut progress, buffer) = reporter(ProgressMode::Verbose);
        progress.start(1);
        progress.advance(&result(true, None));
        progress.finish();

        let output = buffer.contents();
        assert!(output.contains("| 1 passed, 0 failed"), "got: {output}");
        assert!(output.ends_with("\n\n\n"), "two blank lines after the summary");
    }

    #[test]
    fn counters_reset_on_start() {
        let (mut progress, buffer) = reporter(ProgressMode::Verbose);
        progress.start(1);
        progress.advance(&result(false, None));
        progress.finish();

        progress.start(1);
        progress.advance(&result(true, None));
        progress.finish();

        let output = buffer.contents();
        assert!(output.contains("| 0 passed, 1 failed"));
        assert!(output.contains("| 1 passed, 0 failed"));
    }
}
