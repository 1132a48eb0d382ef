//! HTML rendering for catalog pages
//!
//! Pages are small enough to render with `format!`; every value that comes
//! from the store goes through [`escape`].

use std::fmt::Write;

use axum::http::StatusCode;
use uhcsdb_common::db::{class_color, MicrographInfo, User};

use crate::pagination::PageNav;

const STYLE: &str = r#"
    body { font-family: system-ui, -apple-system, sans-serif; margin: 0; color: #222; }
    header { background: #1f2d3d; padding: 12px 24px; }
    header a { color: #fff; margin-right: 18px; text-decoration: none; font-weight: 600; }
    main { max-width: 1100px; margin: 24px auto; padding: 0 16px; }
    .grid { display: flex; flex-wrap: wrap; gap: 14px; }
    .card { width: 160px; font-size: 13px; text-align: center; }
    .card img { width: 140px; height: 140px; border: 3px solid #999; object-fit: cover; }
    .card .score { color: #990000; }
    .pager { margin: 24px 0; display: flex; gap: 16px; }
    .pager .disabled { color: #aaa; }
    table.meta td { padding: 3px 12px 3px 0; }
    table.meta td:first-child { color: #990000; font-weight: 600; }
    .error { border-left: 4px solid #c0392b; padding: 8px 16px; background: #fdf2f1; }
"#;

/// Escape text for HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn opt_text(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_else(|| "&mdash;".to_string())
}

fn opt_number(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) if unit.is_empty() => format!("{}", v),
        Some(v) => format!("{} {}", v, unit),
        None => "&mdash;".to_string(),
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - UHCSDB</title>
    <style>{style}</style>
</head>
<body>
    <header>
        <a href="/entries/">Entries</a>
        <a href="/all/">All</a>
        <a href="/favorites/">Favorites</a>
        <a href="/visualize">Explorer</a>
    </header>
    <main>
        <h1>{title}</h1>
{body}
    </main>
</body>
</html>"#,
        title = escape(title),
        style = STYLE,
        body = body,
    )
}

fn entry_card(entry: &MicrographInfo, score: Option<f64>) -> String {
    let border = entry
        .mstructure_class
        .as_deref()
        .and_then(class_color)
        .unwrap_or("#999999");
    let mut card = format!(
        r#"<div class="card">
    <a href="/micrograph/{id}"><img src="/{thumb}" alt="micrograph {id}" style="border-color: {border}"></a>
    <div>#{id} {class}</div>"#,
        id = entry.id,
        thumb = entry.thumbnail(),
        border = border,
        class = opt_text(entry.mstructure_class.as_deref()),
    );
    if let Some(score) = score {
        let _ = write!(card, r#"<div class="score">distance {:.3}</div>"#, score);
    }
    card.push_str("</div>");
    card
}

fn pager(nav: &PageNav, total_pages: usize) -> String {
    let prev = if nav.has_prev {
        format!(r#"<a href="/entries/{}">&laquo; previous</a>"#, nav.prev_num)
    } else {
        r#"<span class="disabled">&laquo; previous</span>"#.to_string()
    };
    let next = if nav.has_next {
        format!(r#"<a href="/entries/{}">next &raquo;</a>"#, nav.next_num)
    } else {
        r#"<span class="disabled">next &raquo;</span>"#.to_string()
    };
    format!(
        r#"<nav class="pager">{} <span>page {} of {}</span> {}</nav>"#,
        prev, nav.page, total_pages, next
    )
}

/// Thumbnail grid, optionally with pagination links
pub fn entries_page(
    title: &str,
    entries: &[MicrographInfo],
    nav: Option<(&PageNav, usize)>,
) -> String {
    let mut body = String::from(r#"<div class="grid">"#);
    for entry in entries {
        body.push_str(&entry_card(entry, None));
    }
    body.push_str("</div>");

    if entries.is_empty() {
        body.push_str("<p>No micrographs on this page.</p>");
    }

    if let Some((nav, total_pages)) = nav {
        body.push_str(&pager(nav, total_pages));
    }

    layout(title, &body)
}

fn metadata_table(entry: &MicrographInfo, author: Option<&User>) -> String {
    let scale = entry
        .microns_per_px()
        .map(|v| format!("{:.4} microns/px", v))
        .unwrap_or_else(|| "&mdash;".to_string());
    let author = author
        .map(|u| escape(&u.display_name()))
        .unwrap_or_else(|| "&mdash;".to_string());

    format!(
        r#"<table class="meta">
    <tr><td>Class</td><td>{class}</td></tr>
    <tr><td>Sample</td><td>{sample}</td></tr>
    <tr><td>Anneal temperature</td><td>{temperature}</td></tr>
    <tr><td>Anneal time</td><td>{time}</td></tr>
    <tr><td>Cooling</td><td>{cool}</td></tr>
    <tr><td>Scale</td><td>{scale}</td></tr>
    <tr><td>Magnification</td><td>{mag}</td></tr>
    <tr><td>Detector</td><td>{detector}</td></tr>
    <tr><td>Contributor</td><td>{author}</td></tr>
</table>"#,
        class = opt_text(entry.mstructure_class.as_deref()),
        sample = opt_text(entry.sample_label.as_deref()),
        temperature = opt_number(entry.anneal_temperature, "C"),
        time = opt_number(entry.anneal_time, "minutes"),
        cool = opt_text(entry.cool_method.as_deref()),
        scale = scale,
        mag = opt_number(entry.magnification, "x"),
        detector = opt_text(entry.detector.as_deref()),
        author = author,
    )
}

/// Single micrograph with its metadata and contributor
pub fn entry_page(entry: &MicrographInfo, author: Option<&User>, image_url: Option<&str>) -> String {
    let image = match image_url {
        Some(url) => format!(
            r#"<p><img src="{}" alt="micrograph {}" style="max-width: 100%"></p>"#,
            escape(url),
            entry.id
        ),
        None => "<p>No image available.</p>".to_string(),
    };
    let body = format!(
        r#"{image}
{meta}
<p><a href="/visual_query/{id}">Find visually similar micrographs</a></p>"#,
        image = image,
        meta = metadata_table(entry, author),
        id = entry.id,
    );
    layout(&format!("Micrograph {}", entry.id), &body)
}

/// Query micrograph followed by its neighbors, nearest first
pub fn query_results_page(
    query: &MicrographInfo,
    author: Option<&User>,
    results: &[(MicrographInfo, f64)],
) -> String {
    let mut body = String::from(r#"<div class="grid">"#);
    body.push_str(&entry_card(query, None));
    body.push_str("</div>");
    body.push_str(&metadata_table(query, author));
    body.push_str("<h2>Most similar</h2>");
    body.push_str(r#"<div class="grid">"#);
    for (entry, score) in results {
        body.push_str(&entry_card(entry, Some(*score)));
    }
    body.push_str("</div>");
    layout(&format!("Visual query: micrograph {}", query.id), &body)
}

/// Page hosting the live explorer session
pub fn visualize_page(explorer_fragment: &str) -> String {
    let body = format!(
        r#"<p>Hover a point to preview the micrograph; click it to open its detail page.</p>
{}"#,
        explorer_fragment
    );
    layout("Microstructure explorer", &body)
}

/// Error page carrying the status text and a message
pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(r#"<div class="error"><p>{}</p></div>"#, escape(message));
    layout(
        status.canonical_reason().unwrap_or("Error"),
        &body,
    )
}
