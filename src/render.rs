// 🖼️ Renderers - ANSI terminal grid, standalone HTML page, JSON

use crate::color::Rgb;
use crate::error::Result;
use crate::resolver::{Timeline, MONTHS_PER_ROW};
use crate::yearly::YearView;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fmt::Write;

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ansi,
    Html,
    Json,
}

pub fn render(timeline: &Timeline, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Ansi => Ok(render_ansi(timeline)),
        OutputFormat::Html => Ok(render_html(timeline)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(timeline)?),
    }
}

// ============================================================================
// ANSI
// ============================================================================

fn ansi_bg(color: Rgb) -> String {
    format!("\x1b[48;2;{};{};{}m", color.r, color.g, color.b)
}

fn ansi_fg(color: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

/// Truecolor grid, two columns per month, followed by the legend.
pub fn render_ansi(timeline: &Timeline) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} - as of {}", timeline.name, timeline.as_of);
    for row in timeline.rows() {
        if let Some(first) = row.first() {
            let _ = write!(out, "{} ", first.month.year());
        }
        for cell in row {
            out.push_str(&ansi_bg(cell.display_color()));
            out.push_str("  ");
        }
        out.push_str(RESET);
        out.push('\n');
    }

    if !timeline.legend.is_empty() {
        out.push('\n');
    }
    for entry in &timeline.legend {
        let _ = writeln!(
            out,
            "{}{} {} {}",
            ansi_bg(entry.color),
            ansi_fg(entry.color.contrast_text()),
            entry.label(),
            RESET
        );
    }
    out
}

/// Day grid for one year, in the same style as [`render_ansi`].
pub fn render_year_ansi(view: &YearView) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", view.year);
    for row in view.rows() {
        for cell in row {
            out.push_str(&ansi_bg(cell.color.unwrap_or(Rgb::WHITE)));
            out.push_str("  ");
        }
        out.push_str(RESET);
        out.push('\n');
    }

    if view.legend.is_empty() {
        let _ = writeln!(out, "\nNo events recorded for {}", view.year);
    } else {
        out.push('\n');
    }
    for entry in &view.legend {
        let _ = writeln!(
            out,
            "{}{} {} {}",
            ansi_bg(entry.color),
            ansi_fg(entry.color.contrast_text()),
            entry.label(),
            RESET
        );
    }
    out
}

// ============================================================================
// HTML
// ============================================================================

const PAGE_STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; margin: 2rem; }
    .grid { display: grid; gap: 2px; }
    .cell { width: 14px; height: 14px; border: 1px solid #ccc; box-sizing: border-box; }
    .legend { display: flex; align-items: center; margin: 4px 0; }
    .legend-color { width: 16px; height: 16px; margin-right: 8px; border: 1px solid #999; }
"#;

/// Self-contained page: the month grid plus the legend.
pub fn render_html(timeline: &Timeline) -> String {
    let page: Markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Life Timeline - " (timeline.name) }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                h1 { (timeline.name) }
                p { "As of " (timeline.as_of.to_string()) }
                div.grid style=(format!("grid-template-columns: repeat({}, 14px)", MONTHS_PER_ROW)) {
                    @for cell in &timeline.cells {
                        div.cell
                            title=(cell.month.to_string())
                            style=(format!("background-color: {}", cell.display_color())) {}
                    }
                }
                div #legend {
                    @for entry in &timeline.legend {
                        div.legend {
                            div."legend-color" style=(format!("background-color: {}", entry.color)) {}
                            span { (entry.label()) }
                        }
                    }
                }
            }
        }
    };
    page.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::resolver::resolve_timeline;
    use crate::yearly::resolve_year;
    use chrono::NaiveDate;

    fn timeline() -> Timeline {
        let mut config = Configuration::template();
        config.name = "<Jane & Co>".to_string();
        config.life_expectancy_years = 8;
        resolve_timeline(&config, NaiveDate::from_ymd_opt(2005, 6, 15).unwrap())
    }

    #[test]
    fn test_ansi_has_one_line_per_row() {
        let out = render_ansi(&timeline());
        let grid_lines: Vec<&str> = out.lines().skip(1).take_while(|l| !l.is_empty()).collect();

        assert_eq!(grid_lines.len(), 2);
        assert!(grid_lines[0].starts_with("2000 "));
        assert!(grid_lines[1].starts_with("2004 "));
        assert!(out.contains("\x1b[48;2;255;179;186m"));
        assert!(out.contains("Career Growth (from 2023-01)"));
    }

    #[test]
    fn test_html_escapes_names() {
        let out = render_html(&timeline());

        assert!(out.contains("<h1>&lt;Jane &amp; Co&gt;</h1>"));
        assert!(!out.contains("<Jane"));
        assert_eq!(out.matches("class=\"cell\"").count(), 96);
        assert!(out.contains("background-color: #FFB3BA"));
        assert!(out.contains("background-color: #FFFFFF"));
        assert!(out.contains("Teenage Years (from 2013-01)"));
    }

    #[test]
    fn test_json_output() {
        let out = render(&timeline(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["cells"].as_array().unwrap().len(), 96);
        assert_eq!(value["cells"][0]["month"], "2000-01");
        assert_eq!(value["cells"][0]["color"], "#FFB3BA");
        assert!(value["cells"][95]["color"].is_null());
        assert_eq!(value["legend"][1]["start"], "2013-01");
    }

    #[test]
    fn test_year_without_events_says_so() {
        let view = resolve_year(
            &Configuration::template(),
            2019,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(render_year_ansi(&view).contains("No events recorded for 2019"));
    }

    #[test]
    fn test_html_escapes_legend_labels() {
        let mut config = Configuration::template();
        config.periods[0].name = "<b>\"Kids\"</b>".to_string();
        let out = render_html(&resolve_timeline(&config, NaiveDate::from_ymd_opt(2005, 1, 1).unwrap()));

        assert!(out.contains("&lt;b&gt;&quot;Kids&quot;&lt;/b&gt; (from 2000-01)"));
        assert!(out.starts_with("<!DOCTYPE html>"));
    }
}
