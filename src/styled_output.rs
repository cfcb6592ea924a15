//! Styled output formatting for hostscan using anstyle.
//!
//! Renders a `ScanResult` as a colored terminal report. Colors are disabled
//! automatically when stdout is not a terminal or `NO_COLOR` is set.

use anstyle::{AnsiColor, Color, Style};
use std::fmt::Write;
use std::io::{self, Write as IoWrite};

use crate::report::ScanResult;
use crate::risk::RiskLevel;

/// Style definitions for different UI elements
pub struct Styles {
    pub header: Style,
    pub label: Style,
    pub muted: Style,
    pub bold: Style,
    pub ip: Style,
    pub port: Style,
    pub vuln: Style,
    pub risk_low: Style,
    pub risk_medium: Style,
    pub risk_high: Style,
    pub risk_critical: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            label: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            ip: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
            port: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            vuln: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))),
            risk_low: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
            risk_medium: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            risk_high: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
            risk_critical: Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::BrightRed))),
        }
    }
}

/// Styled output formatter for scan results
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl StyledFormatter {
    /// Create a new styled formatter
    pub fn new() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    /// Determine if colors should be used based on environment
    fn should_use_colors() -> bool {
        atty::is(atty::Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    /// Apply style to text if colors are enabled
    fn styled(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    fn risk_style(&self, level: RiskLevel) -> &Style {
        match level {
            RiskLevel::Low => &self.styles.risk_low,
            RiskLevel::Medium => &self.styles.risk_medium,
            RiskLevel::High => &self.styles.risk_high,
            RiskLevel::Critical => &self.styles.risk_critical,
        }
    }

    /// Format a scan result as a multi-section report
    pub fn format_scan(&self, result: &ScanResult) -> Result<String, std::fmt::Error> {
        let mut output = String::new();

        self.write_header(&mut output, result)?;
        self.write_exposure(&mut output, result)?;
        self.write_vulnerabilities(&mut output, result)?;
        self.write_footer(&mut output, result)?;

        Ok(output)
    }

    fn rule(&self) -> String {
        self.styled(
            "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━",
            &self.styles.muted,
        )
    }

    fn write_header(&self, output: &mut String, result: &ScanResult) -> std::fmt::Result {
        writeln!(output)?;
        writeln!(output, "{}", self.rule())?;
        writeln!(
            output,
            "  {} {}",
            self.styled("🛡️ Security Posture for", &self.styles.header),
            self.styled(result.ip(), &self.styles.ip)
        )?;
        writeln!(
            output,
            "  ⚠️ Risk Level: {}",
            self.styled(result.risk_level().as_str(), self.risk_style(result.risk_level()))
        )?;
        writeln!(output, "{}", self.rule())?;
        Ok(())
    }

    fn write_exposure(&self, output: &mut String, result: &ScanResult) -> std::fmt::Result {
        writeln!(output)?;
        if !result.hostnames().is_empty() {
            writeln!(
                output,
                "  {} {}",
                self.styled("🌍 Hostnames:", &self.styles.label),
                self.styled(&result.hostnames().join(", "), &self.styles.bold)
            )?;
        }

        if result.ports().is_empty() {
            writeln!(
                output,
                "  {} {}",
                self.styled("📡 Open Ports:", &self.styles.label),
                self.styled("none reported", &self.styles.muted)
            )?;
        } else {
            let ports: Vec<String> = result
                .ports()
                .iter()
                .map(|p| self.styled(&p.to_string(), &self.styles.port))
                .collect();
            writeln!(
                output,
                "  {} {} ({})",
                self.styled("📡 Open Ports:", &self.styles.label),
                ports.join(", "),
                result.ports().len()
            )?;
        }

        if !result.cpes().is_empty() {
            writeln!(output, "  {}", self.styled("🧩 CPE:", &self.styles.label))?;
            for cpe in result.cpes() {
                writeln!(output, "     • {}", cpe)?;
            }
        }

        if !result.tags().is_empty() {
            writeln!(
                output,
                "  {} {}",
                self.styled("🏷️ Tags:", &self.styles.label),
                result.tags().join(", ")
            )?;
        }
        Ok(())
    }

    fn write_vulnerabilities(&self, output: &mut String, result: &ScanResult) -> std::fmt::Result {
        writeln!(output)?;
        if result.vulns().is_empty() {
            writeln!(
                output,
                "  {} {}",
                self.styled("🔐 Vulnerabilities:", &self.styles.label),
                self.styled("No known security flaws detected", &self.styles.risk_low)
            )?;
            return Ok(());
        }

        writeln!(
            output,
            "  {} {}",
            self.styled("🔐 Vulnerabilities:", &self.styles.label),
            self.styled(
                &format!("{} known CVE(s)", result.vulns().len()),
                &self.styles.bold
            )
        )?;
        for cve in result.vulns() {
            writeln!(output, "     • {}", self.styled(cve, &self.styles.vuln))?;
        }
        Ok(())
    }

    fn write_footer(&self, output: &mut String, _result: &ScanResult) -> std::fmt::Result {
        writeln!(output)?;
        writeln!(output, "{}", self.rule())?;
        writeln!(
            output,
            "  {}",
            self.styled(
                &format!(
                    "Scanned at {} · data is passive intelligence, no probes were sent",
                    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
                ),
                &self.styles.muted
            )
        )?;
        Ok(())
    }

    /// Print a scan result to stdout
    pub fn print_scan(&self, result: &ScanResult) -> Result<(), Box<dyn std::error::Error>> {
        let output = self.format_scan(result)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}
