use crate::document::{Line, ReportDocument};

pub const CURRENCY: &str = "$";

pub fn format_currency(value: f64, show_zero: bool) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 && !show_zero {
        return String::new();
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    let abs_val = rounded.abs();
    format!("{sign}{CURRENCY}{}", format_with_commas(abs_val))
}

fn format_with_commas(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (whole, cents) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{grouped}.{cents}")
}

fn line_html(line: &Line) -> String {
    let text = html_escape::encode_text(&line.text);
    format!(
        r#"    <p class="{}" style="top: {}mm; left: {}mm; font-size: {}pt;">{text}</p>"#,
        line.style.class_name(),
        line.y,
        line.x,
        line.style.font_size(),
    )
}

/// Renders each page as a fixed-size A4 sheet that prints one page per sheet.
pub fn render_report_html(document: &ReportDocument) -> String {
    let title = html_escape::encode_text(&document.title);
    let page_count = document.pages.len();

    let pages: Vec<String> = document
        .pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let mut parts = vec![format!(
                r#"  <section class="page" data-page="{}">"#,
                index + 1
            )];
            parts.extend(page.lines.iter().map(line_html));
            parts.push(format!(
                r#"    <span class="page-number">{} / {page_count}</span>"#,
                index + 1
            ));
            parts.push("  </section>".to_string());
            parts.join("\n")
        })
        .collect();

    let html = [
        "<!DOCTYPE html>",
        r#"<html lang="en">"#,
        "<head>",
        r#"  <meta charset="utf-8">"#,
        &format!("  <title>{title}</title>"),
        "  <style>",
        "    @page { size: A4; margin: 0; }",
        "    body { margin: 0; background: #e5e7eb; font-family: Helvetica, Arial, sans-serif; }",
        "    section.page {",
        "      position: relative;",
        "      width: 210mm;",
        "      height: 297mm;",
        "      margin: 8mm auto;",
        "      background: #ffffff;",
        "      box-shadow: 0 4px 16px rgba(0, 0, 0, 0.12);",
        "      page-break-after: always;",
        "      break-after: page;",
        "    }",
        "    section.page p { position: absolute; margin: 0; white-space: pre; }",
        "    p.title, p.heading { font-weight: 700; }",
        "    span.page-number { position: absolute; bottom: 10mm; right: 20mm; font-size: 9pt; color: #6b7280; }",
        "    @media print {",
        "      body { background: none; }",
        "      section.page { margin: 0; box-shadow: none; }",
        "    }",
        "  </style>",
        "</head>",
        "<body>",
        &pages.join("\n"),
        "</body>",
        "</html>",
    ];

    format!("{}\n", html.join("\n"))
}
