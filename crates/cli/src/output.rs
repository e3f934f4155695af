//! Terminal presentation.
//!
//! Every decorative line goes through a [`Console`]; raw mode suppresses all
//! of them so stdout carries nothing but NDJSON records.

use std::io::Write;

use colored::{ColoredString, Colorize};
use contracts::{DeliveryOutcome, RunResult, StreamRecord};

use crate::commands::SignedPreview;

const CN_WIDTH: usize = 28;
const RULE_WIDTH: usize = 36;

/// Presentation settings, threaded explicitly through the run
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
    raw: bool,
}

impl Console {
    /// Create a console. Color is disabled when `NO_COLOR` is set.
    pub fn new(color: bool, raw: bool) -> Self {
        let color = color && std::env::var_os("NO_COLOR").is_none();
        Self { color, raw }
    }

    /// Whether decorative output is suppressed
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }

    fn out(&self, line: impl AsRef<str>) {
        if !self.raw {
            println!("{}", line.as_ref());
        }
    }

    /// Startup banner
    pub fn banner(&self, version: &str, targets: &str, mode: &str, stream_seconds: Option<u64>) {
        let title = format!("CertWatch Webhook CLI v{}", version);
        let mode_line = match stream_seconds {
            Some(secs) if secs > 0 => {
                format!("{}{} Stream: {}s", mode, self.dim(" ·"), secs)
            }
            _ => mode.to_string(),
        };

        self.out("");
        self.out(format!("  {}", self.paint(&title, |t| t.bold())));
        self.out(format!("  {} {}", self.dim("Target:"), targets));
        self.out(format!("  {} {}", self.dim("Mode:  "), mode_line));
        self.out("");
    }

    pub fn connecting(&self) {
        self.out(format!("  {}", self.dim("Connecting...")));
    }

    pub fn connected(&self) {
        let mark = self.paint("✓", |t| t.green());
        let text = self.paint("Connected", |t| t.green());
        self.out(format!("  {} {}", mark, text));
        self.out("");
    }

    /// One line per HTTP delivery
    pub fn delivery(&self, outcome: &DeliveryOutcome) {
        let head = self.row_head(outcome.index, &outcome.common_name);

        let line = if outcome.status == 0 {
            let error = outcome.error.as_deref().unwrap_or_default();
            format!("{} {}", head, self.paint(&format!("ERR {}", error), |t| t.red()))
        } else {
            let status = format!("{} {}", outcome.status, outcome.status_text);
            let status = status.trim_end();
            let status = if outcome.success {
                self.paint(status, |t| t.green())
            } else {
                self.paint(status, |t| t.red())
            };
            let latency = self.dim(&format!("({}ms)", outcome.latency_ms));
            format!("{} {}  {}", head, status, latency)
        };

        self.out(line);
    }

    /// Progress line when only the file sink is active
    pub fn saved(&self, index: u64, common_name: &str) {
        let head = self.row_head(index, common_name);
        self.out(format!("{} {}", head, self.paint("saved", |t| t.green())));
    }

    fn row_head(&self, index: u64, common_name: &str) -> String {
        let index = format!("#{:<3}", index);
        let cn = format!("{:<width$}", truncate(common_name, CN_WIDTH), width = CN_WIDTH);
        format!("  {} {} {}", self.dim(&index), cn, self.dim("->"))
    }

    /// Pretty-printed record under its progress line
    pub fn payload(&self, record: &StreamRecord) {
        let Ok(pretty) = serde_json::to_string_pretty(record) else {
            return;
        };
        for line in pretty.lines() {
            self.out(format!("    {}", self.dim(line)));
        }
    }

    pub fn info(&self, message: &str) {
        self.out(format!("  {} {}", self.paint("Info:", |t| t.cyan()), message));
    }

    /// Error line on stderr (suppressed in raw mode)
    pub fn error(&self, message: &str) {
        if !self.raw {
            self.fatal(message);
        }
    }

    /// Error line on stderr, printed in every mode
    pub fn fatal(&self, message: &str) {
        eprintln!("  {} {}", self.paint("Error:", |t| t.red()), message);
    }

    /// Delivery summary block
    pub fn summary(&self, result: &RunResult) {
        let rule = "─".repeat(RULE_WIDTH);
        let delivered = format!(
            "{}/{} ({:.1}%)",
            result.succeeded,
            result.total,
            result.success_pct()
        );
        let delivered = if result.succeeded < result.total {
            self.paint(&delivered, |t| t.yellow())
        } else {
            self.paint(&delivered, |t| t.green())
        };

        self.out("");
        self.out(format!("  {}", self.dim(&rule)));
        self.out(format!("  {}", self.paint("Summary", |t| t.bold())));
        self.out(format!("  {}", self.dim(&rule)));
        self.out(format!("  {} {}", self.dim("Delivered:"), delivered));
        if result.failed > 0 {
            let failed = result.failed.to_string();
            self.out(format!("  {} {}", self.dim("Failed:   "), self.paint(&failed, |t| t.red())));
        }
        self.out(format!(
            "  {} {:.1}s",
            self.dim("Elapsed:  "),
            result.elapsed.as_secs_f64()
        ));
        if result.total > 0 {
            self.out(format!("  {} {}ms", self.dim("Avg:      "), result.avg_latency_ms));
        }
        self.out("");
    }

    /// Rendered request for the `preview` command
    pub fn preview(&self, version: &str, preview: &SignedPreview) {
        let title = format!("CertWatch Webhook CLI v{}", version);
        self.out("");
        self.out(format!("  {}", self.paint(&title, |t| t.bold())));
        self.out(format!("  {}", self.dim("Sample webhook request")));
        self.out("");

        self.out(format!("  {}", self.paint("Headers", |t| t.bold())));
        for (name, value) in &preview.headers {
            self.out(format!("    {} {}", self.dim(&format!("{}:", name)), value));
        }
        self.out("");

        self.out(format!("  {}", self.paint("Body", |t| t.bold())));
        for line in preview.pretty.lines() {
            self.out(format!("    {}", line));
        }
        self.out("");

        self.out(format!("  {} {}", self.dim("Secret:"), preview.secret));
        if preview.generated_secret {
            self.info("random secret generated; pass --secret to preview with your own");
        }
        self.out("");
        self.out(format!(
            "  {}",
            self.dim("Verify: HMAC-SHA256(secret, raw compact body) as hex, prefixed with sha256=")
        ));
        self.out(format!(
            "  {}",
            self.dim("        certwatch-webhook verify --secret <secret> --signature <value> --body-file <file>")
        ));
        self.out("");
    }

    pub fn interrupted(&self) {
        self.info("Interrupted by signal");
    }

    /// Flush stdout so progress lines appear before a blocking read
    pub fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

/// Shorten to `max` characters, ending in `...` when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut cut: String = text.chars().take(max - 3).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("example.com", 28), "example.com");
        assert_eq!(
            truncate("a-very-long-subdomain.of.some.example.com", 28),
            "a-very-long-subdomain.of...."
        );
        assert_eq!(truncate("a-very-long-subdomain.of.some.example.com", 28).len(), 28);
        assert_eq!(truncate("abcdef", 3), "abc");
    }

    #[test]
    fn test_row_head_layout() {
        let console = Console::new(false, false);
        let head = console.row_head(7, "example.com");
        assert_eq!(head, format!("  #7   {:<28} ->", "example.com"));
    }

    #[test]
    fn test_no_color_is_plain() {
        let console = Console::new(false, false);
        assert_eq!(console.dim("x"), "x");
    }
}
