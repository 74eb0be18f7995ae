//! Remote key naming.
//!
//! Keys look like `{prefix}_{unix_millis}_{token}_{base}{ext}`. The millisecond
//! timestamp plus a six character base-36 token keeps keys unique without any
//! coordination between uploaders.

use rand::Rng;
use std::path::Path;

/// Prefix used when a call site does not supply its own.
pub const DEFAULT_PREFIX: &str = "img";

const TOKEN_LEN: usize = 6;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a unique remote key for `original`.
pub fn unique_name(original: &str, prefix: &str) -> String {
    let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
    let millis = chrono::Utc::now().timestamp_millis();
    let token = random_token(&mut rand::thread_rng());
    let (base, ext) = split_name(original);
    format!("{prefix}_{millis}_{token}_{base}{ext}")
}

/// Split a file name into base name and extension (dot included).
///
/// Leading-dot names such as `.env` have no extension, matching how
/// `Path::extension` treats them.
pub fn split_name(original: &str) -> (&str, &str) {
    let file_name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original);

    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

fn random_token<R: Rng>(rng: &mut R) -> String {
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name("meet-notes.pdf", "meet-files");
        let parts: Vec<&str> = name.splitn(4, '_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "meet-files");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), TOKEN_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(parts[3], "meet-notes.pdf");
    }

    #[test]
    fn test_unique_name_preserves_base_and_ext() {
        let name = unique_name("photo.final.JPG", "img");
        assert!(name.contains("photo.final"));
        assert!(name.ends_with(".JPG"));
    }

    #[test]
    fn test_unique_name_empty_prefix_falls_back() {
        assert!(unique_name("a.png", "").starts_with("img_"));
    }

    #[test]
    fn test_unique_name_is_unique_across_calls() {
        let names: HashSet<String> = (0..500).map(|_| unique_name("same.png", "img")).collect();
        assert_eq!(names.len(), 500);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("report.docx"), ("report", ".docx"));
        assert_eq!(split_name("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_name("README"), ("README", ""));
        assert_eq!(split_name(".env"), (".env", ""));
        assert_eq!(split_name("/tmp/dir/pic.png"), ("pic", ".png"));
    }
}
