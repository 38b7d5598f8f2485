//! Text rendering for shell command output.

use crate::storage::{human_size, RemoteStat};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// One line of an `ls` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    Folder { name: String, files: u64 },
    File { name: String, updated: DateTime<Utc> },
}

impl ListingEntry {
    fn label(&self) -> String {
        match self {
            ListingEntry::Folder { name, .. } => format!("{}/", name),
            ListingEntry::File { name, .. } => name.clone(),
        }
    }
}

/// Timestamp as listings show it, e.g. `02 Jan 06 15:04 UTC`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%d %b %y %H:%M UTC").to_string()
}

/// Folders and files of a directory listing, names padded to one column.
pub fn format_listing(entries: &[ListingEntry]) -> String {
    let width = entries.iter().map(|e| e.label().chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let detail = match entry {
            ListingEntry::Folder { files, .. } if *files == 1 => "1 file".to_string(),
            ListingEntry::Folder { files, .. } => format!("{} files", files),
            ListingEntry::File { updated, .. } => format_timestamp(updated),
        };
        out.push_str(&format!("{:<width$}  {}\n", entry.label(), detail, width = width));
    }
    out
}

/// A registered drive as `drive` lists it.
#[derive(Debug, Clone)]
pub struct DriveRow {
    pub name: String,
    pub id: i64,
    pub storage: String,
    pub description: String,
}

pub fn format_drives_table(rows: &[DriveRow]) -> String {
    if rows.is_empty() {
        return "No drives configured.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Drive", "Id", "Storage", "Description"]);
    for row in rows {
        table.add_row(vec![
            row.name.clone(),
            row.id.to_string(),
            row.storage.clone(),
            row.description.clone(),
        ]);
    }
    table.to_string()
}

/// `(usage, description)` pairs, already sorted by command name.
pub fn format_help_table(rows: &[(&str, &str)]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Command", "Description"]);
    for (usage, help) in rows {
        table.add_row(vec![usage.to_string(), help.to_string()]);
    }
    format!("{}\n\n{}", format_section_heading("Commands"), table)
}

/// Indented tree, two spaces per level; folders end in `/`.
pub fn format_outline(lines: &[(usize, String, bool)]) -> String {
    let mut out = String::new();
    for (depth, name, is_folder) in lines {
        let indent = "  ".repeat(depth.saturating_sub(1));
        let suffix = if *is_folder { "/" } else { "" };
        out.push_str(&format!("{}{}{}\n", indent, name, suffix));
    }
    out
}

/// Catalog-side facts about a file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: String,
    pub content_id: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub metadata: String,
}

pub fn format_file_info(info: &FileInfo, remote: Result<&RemoteStat, String>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format_section_heading(&info.path)));
    out.push_str(&format!("  Content id: {}\n", info.content_id));
    out.push_str(&format!("  Created:    {}\n", format_timestamp(&info.created)));
    out.push_str(&format!("  Updated:    {}\n", format_timestamp(&info.updated)));
    if !info.metadata.is_empty() {
        out.push_str(&format!("  Metadata:   {}\n", info.metadata));
    }
    out.push('\n');
    match remote {
        Ok(stat) => {
            out.push_str(&format!("  Storage:    {}\n", stat.storage));
            out.push_str(&format!("  Size:       {}\n", human_size(stat.total_size())));
            if !stat.parts.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Part", "Size", "Blake3"]);
                for part in &stat.parts {
                    table.add_row(vec![
                        part.name.clone(),
                        part.size.to_string(),
                        part.digest.clone(),
                    ]);
                }
                out.push_str(&format!("{}\n", table));
            }
        }
        Err(reason) => {
            out.push_str(&format!("  Storage:    unavailable ({})\n", reason));
        }
    }
    out
}
