//! Path utilities

use std::path::{Path, PathBuf};

/// Split `NAME.EXT` into an uppercase stem and extension
#[must_use]
pub fn split_resource_name(resource: &str) -> (String, String) {
    let file = Path::new(resource)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource.to_string());
    match file.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_uppercase(), ext.to_uppercase()),
        None => (file.to_uppercase(), String::new()),
    }
}

/// Find a file in `dir` whose name matches `name` case-insensitively
///
/// Game installs mix upper and lower case freely, so an exact join is tried
/// first and a directory scan is the fallback.
#[must_use]
pub fn find_case_insensitive(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    let wanted = name.to_lowercase();
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .is_some_and(|f| f.to_string_lossy().to_lowercase() == wanted)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_resource_name() {
        assert_eq!(split_resource_name("ar0100.tis"), ("AR0100".into(), "TIS".into()));
        assert_eq!(split_resource_name("dir/Spwi101.Bam"), ("SPWI101".into(), "BAM".into()));
        assert_eq!(split_resource_name("NOEXT"), ("NOEXT".into(), String::new()));
    }
}
