//! The trait implemented by all error types in this library.

use std::io::Write;

use owo_colors::{OwoColorize, Stream::Stderr};

/// Implemented by all error types in this library to provide consistent
/// human-readable error output.
///
pub trait DcmstreamError {
  /// Returns lines of text describing this error.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String>;

  /// Prints this error to stderr, including all contextual information the
  /// error carries.
  ///
  fn print(&self, task_description: &str) {
    print_error_lines(&self.to_lines(task_description));
  }
}

/// Prints lines of error information to stderr as a single delimited report.
///
pub fn print_error_lines(lines: &[String]) {
  // Flush stdout first so the report doesn't interleave with buffered output
  let _ = std::io::stdout().flush();

  let report_length =
    lines.iter().map(|line| line.len() + 1).sum::<usize>() + 8;

  let mut report = String::with_capacity(report_length);
  report.push_str("\n-----\n");
  for line in lines {
    report.push_str(line);
    report.push('\n');
  }

  eprintln!("{}", report.if_supports_color(Stderr, |text| text.red()));
}
