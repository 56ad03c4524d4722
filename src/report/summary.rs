//! Human-readable tarball summary printed as notices before the filename.

use super::Progress;
use crate::package::ArchiveResult;

/// `999B`, `1.2kB`, `3.4MB` (decimal units)
pub fn format_size(bytes: u64) -> String {
    match bytes {
        b if b < 1_000 => format!("{}B", b),
        b if b < 1_000_000 => format!("{:.1}kB", b as f64 / 1_000.0),
        b => format!("{:.1}MB", b as f64 / 1_000_000.0),
    }
}

/// Emit the contents and details of a packed tarball.
pub fn log_tarball(progress: &dyn Progress, result: &ArchiveResult, unicode: bool) {
    let header = if unicode { "📦 " } else { "package:" };

    progress.notice("");
    progress.notice(&format!("{} {}", header, result.id));
    progress.notice("=== Tarball Contents ===");
    for file in &result.files {
        progress.notice(&format!("{:<7} {}", format_size(file.size), file.path));
    }
    progress.notice("=== Tarball Details ===");

    let details = [
        ("name", result.name.clone()),
        ("version", result.version.clone()),
        ("filename", result.filename.clone()),
        ("package size", format_size(result.size)),
        ("unpacked size", format_size(result.unpacked_size)),
        ("total files", result.entry_count.to_string()),
    ];
    for (label, value) in details {
        progress.notice(&format!("{:<15} {}", format!("{}:", label), value));
    }
    progress.notice("");
}
