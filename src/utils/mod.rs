//! Utilities for output naming and size formatting.

/// Longest sanitized label kept in a merged file name.
pub const MAX_LABEL_LEN: usize = 50;

/// Label used when a record has no usable label.
pub const DEFAULT_LABEL: &str = "record";

/// Make `label` safe for use in a file name.
///
/// Every character other than an ASCII letter or digit becomes `_`, and the
/// result is cut to [`MAX_LABEL_LEN`] characters. An absent or empty label
/// becomes [`DEFAULT_LABEL`].
pub fn sanitize_label(label: Option<&str>) -> String {
    let sanitized: String = label
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_LABEL_LEN)
        .collect();

    if sanitized.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        sanitized
    }
}

/// File name of the merged PDF for a record.
///
/// Format: `merged-<record id>-<sanitized label>-<timestamp ms>.pdf`.
pub fn merged_file_name(record_id: i64, label: Option<&str>, timestamp_ms: i64) -> String {
    format!(
        "merged-{record_id}-{}-{timestamp_ms}.pdf",
        sanitize_label(label)
    )
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
