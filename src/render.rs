use crate::state::HostStatusReport;
use askama_escape::{escape, Html};
use std::fmt::Write;

pub const REPORT_TITLE: &str = "Adaptec report";

const HEADER_BG: &str = "#305496";
const HEADER_FG: &str = "#FFFFFF";
const ODD_ROW_BG: &str = "#D9E1F2";
const EVEN_ROW_BG: &str = "#FFFFFF";
const CELL_PADDING: &str = "0px 5px 0px 5px";
const FONT: &str = "Century Gothic, sans-serif";

pub fn render_report(report: &HostStatusReport) -> String {
    let mut out = format!("<h2>{REPORT_TITLE}</h2>\n");
    out.push_str(&render_table(report));
    out
}

pub fn render_table(report: &HostStatusReport) -> String {
    let columns = report.device_columns();
    let mut html = String::new();

    html.push_str("<table border=\"0\" class=\"dataframe\" style=\"border-collapse: collapse\">\n");
    html.push_str("  <thead>\n    <tr>\n");
    let _ = writeln!(html, "      <th style=\"{}\"></th>", header_style());
    for column in &columns {
        let _ = writeln!(
            html,
            "      <th style=\"{}\">{}</th>",
            header_style(),
            escape(column, Html)
        );
    }
    html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

    let row_count = report.len();
    for (idx, (host, devices)) in report.iter().enumerate() {
        let style = row_style(idx, idx + 1 == row_count);
        html.push_str("    <tr>\n");
        let _ = writeln!(
            html,
            "      <th style=\"{style}\">{}</th>",
            escape(host, Html)
        );
        for column in &columns {
            let value = devices.get(column).unwrap_or("");
            let _ = writeln!(
                html,
                "      <td style=\"{style}\">{}</td>",
                escape(value, Html)
            );
        }
        html.push_str("    </tr>\n");
    }

    html.push_str("  </tbody>\n</table>\n");
    html
}

fn header_style() -> String {
    format!(
        "background-color: {HEADER_BG}; font-family: {FONT}; font-size: medium; \
         color: {HEADER_FG}; text-align: center; border-bottom: 2px solid {HEADER_BG}; \
         padding: {CELL_PADDING}"
    )
}

fn row_style(idx: usize, last: bool) -> String {
    let bg = if idx % 2 == 0 { ODD_ROW_BG } else { EVEN_ROW_BG };
    let mut style = format!(
        "background-color: {bg}; font-family: {FONT}; font-size: medium; \
         text-align: center; padding: {CELL_PADDING}"
    );
    if last {
        let _ = write!(style, "; border-bottom: 2px solid {HEADER_BG}");
    }
    style
}
