// File classification helpers for listing consumers

use serde::{Deserialize, Serialize};

/// Broad content family derived from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Document,
    Spreadsheet,
    Presentation,
    Image,
    Video,
    Audio,
    Archive,
    Text,
    Other,
}

impl FileKind {
    /// Classify a lower- or mixed-case extension without the dot
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::Document,
            "xls" | "xlsx" | "csv" => FileKind::Spreadsheet,
            "ppt" | "pptx" => FileKind::Presentation,
            "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" => FileKind::Image,
            "mp4" | "webm" | "ogv" => FileKind::Video,
            "mp3" | "wav" | "ogg" | "m4a" => FileKind::Audio,
            "zip" | "rar" => FileKind::Archive,
            "txt" => FileKind::Text,
            _ => FileKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Document => "Word",
            FileKind::Spreadsheet => "Spreadsheet",
            FileKind::Presentation => "Presentation",
            FileKind::Image => "Image",
            FileKind::Video => "Video",
            FileKind::Audio => "Audio",
            FileKind::Archive => "Archive",
            FileKind::Text => "Text",
            FileKind::Other => "File",
        }
    }
}

/// Lower-cased extension after the last dot, empty if there is none
pub fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Whether a viewer can render the file inline from a presigned URL
pub fn is_previewable(ext: &str) -> bool {
    const PREVIEWABLE: &[&str] = &[
        "jpg", "jpeg", "png", "gif", "webp", "svg", "pdf", "mp4", "webm", "mp3", "wav", "txt",
    ];
    PREVIEWABLE.contains(&ext.to_ascii_lowercase().as_str())
}

/// Human-readable size: `512 B`, `1.5 KB`, `2.0 MB`, `1.25 GB`
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    }
}
