//! Rendering for `otactl status`

use ota_common::{Manifest, Platform};
use std::fmt::Write;

use crate::terminal_format::Styler;

const CHECKSUM_PREFIX_LEN: usize = 16;

/// Where the manifest came from, shown in the header
pub struct StatusSource<'a> {
    pub backend: &'a str,
    pub manifest_key: &'a str,
}

/// First 16 characters of a checksum followed by `...`
pub fn short_checksum(checksum: &str) -> String {
    let prefix: String = checksum.chars().take(CHECKSUM_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

pub fn render_status(manifest: &Manifest, source: &StatusSource<'_>, s: &Styler) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        s.dimmed(&format!("{} ({})", source.manifest_key, source.backend))
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", s.section_title("Announcement"));
    match &manifest.announcement {
        Some(a) => {
            let _ = writeln!(out, "  Title:    {}", s.bold(&a.title));
            let _ = writeln!(out, "  Content:  {}", a.content);
            let _ = writeln!(out, "  Confirm:  {}", yes_no(a.confirm_require));
            let _ = writeln!(out, "  MD5:      {}", s.dimmed(&a.digest()));
        }
        None => {
            let _ = writeln!(out, "  {}", s.dimmed("none"));
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", s.section_title("OTA"));
    let Some(ota) = &manifest.ota else {
        let _ = writeln!(out, "  {}", s.dimmed("no release published"));
        return out;
    };

    let content = if ota.content.is_empty() {
        s.dimmed("(empty)")
    } else {
        ota.content.clone()
    };
    let _ = writeln!(out, "  Content:  {}", content);
    let _ = writeln!(out);

    let rows: Vec<[String; 5]> = Platform::ALL
        .iter()
        .map(|&platform| match ota.release(platform) {
            Some(r) => [
                platform.as_str().to_uppercase(),
                r.version.clone(),
                yes_no(r.force_update).to_string(),
                short_checksum(&r.checksum),
                r.url.clone(),
            ],
            None => [
                platform.as_str().to_uppercase(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
            ],
        })
        .collect();
    write_table(
        &mut out,
        s,
        &["PLATFORM", "VERSION", "FORCE", "MD5", "URL"],
        &rows,
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", s.section_title("Changelog"));
    if ota.changelog.is_empty() {
        let _ = writeln!(out, "  {}", s.dimmed("empty"));
    } else {
        let rows: Vec<[String; 2]> = ota
            .changelog
            .iter()
            .map(|e| [e.version.clone(), e.changes.clone()])
            .collect();
        write_table(&mut out, s, &["VERSION", "CHANGES"], &rows);
    }

    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Left-aligned columns; the last column is not padded
fn write_table<const N: usize>(
    out: &mut String,
    s: &Styler,
    headers: &[&str; N],
    rows: &[[String; N]],
) {
    let mut widths = (*headers).map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let header = format_row(&header_cells, &widths);
    let _ = writeln!(out, "  {}", s.bold(&header));
    let _ = writeln!(out, "  {}", s.separator(header.chars().count()));
    for row in rows {
        let _ = writeln!(out, "  {}", format_row(row, &widths));
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if i == last {
                cell.clone()
            } else {
                format!("{:<width$}", cell, width = width)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
