//! Text and JSON rendering of probe results.

use anyhow::Result;
use colored::Colorize;
use filesig_core::{FileTypeRef, ProbeReport};

use crate::OutputFormat;

pub fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

pub fn print_reports(reports: &[ProbeReport], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_reports_text(reports)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
    }
    Ok(())
}

pub fn print_types(types: &[FileTypeRef], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_types_text(types)),
        OutputFormat::Json => {
            let metadata: Vec<_> = types.iter().map(|ft| ft.metadata()).collect();
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }
    Ok(())
}

fn render_reports_text(reports: &[ProbeReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let name = if report.is_unknown() {
            report.name.yellow().to_string()
        } else if report.builtin {
            report.name.green().bold().to_string()
        } else {
            report.name.cyan().bold().to_string()
        };
        out.push_str(&format!("{}: {}", report.path.display(), name));
        if !report.is_unknown() {
            out.push_str(&format!(" ({})", report.description));
            if !report.primary_mime_type.is_empty() {
                out.push_str(&format!(" {}", report.primary_mime_type.dimmed()));
            }
        }
        out.push('\n');
    }
    out
}

fn render_types_text(types: &[FileTypeRef]) -> String {
    let mut out = String::new();
    for ft in types {
        let origin = if ft.is_builtin() { "builtin" } else { "custom" };
        let extensions: Vec<&str> = ft.extensions().iter().map(String::as_str).collect();
        out.push_str(&format!(
            "{:<10} {:<8} {:<40} {}\n",
            ft.name().bold(),
            origin.dimmed(),
            ft.description(),
            extensions.join(",")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use filesig_core::{FileTypeRegistry, unknown};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn text_report_lines() {
        plain();
        let registry = FileTypeRegistry::new();
        let reports = vec![
            ProbeReport::new("a.zip", registry.find("Zip").unwrap().as_ref()),
            ProbeReport::new("b.bin", unknown().as_ref()),
        ];
        let text = render_reports_text(&reports);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "a.zip: Zip (Zip Archive) application/zip");
        assert_eq!(lines[1], "b.bin: Unknown");
    }

    #[test]
    fn type_listing_has_every_entry() {
        plain();
        let types = FileTypeRegistry::new().types();
        let text = render_types_text(&types);
        assert_eq!(text.lines().count(), types.len());
        assert!(text.lines().next().unwrap().starts_with("JPEG"));
        assert!(text.lines().last().unwrap().starts_with("Unknown"));
    }
}
