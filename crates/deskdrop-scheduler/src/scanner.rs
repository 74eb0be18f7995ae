//! Desktop scanner and the date-anchored naming predicate.

use chrono::{Local, NaiveDate};
use regex::Regex;
use std::path::{Path, PathBuf};

use deskdrop_core::types::FileCandidate;

/// Matches `^{tag}.*{YYYYMMDD}\.[^.]+$`, case-insensitively.
///
/// The date is an argument rather than captured state: the same name can
/// match today and stop matching tomorrow.
#[derive(Debug, Clone)]
pub struct DatePredicate {
    tag: String,
}

impl DatePredicate {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Compiled pattern for one calendar day.
    pub fn pattern_for(&self, date: NaiveDate) -> Option<Regex> {
        let source = format!(
            r"(?i)^{}.*{}\.[^.]+$",
            regex::escape(&self.tag),
            date.format("%Y%m%d")
        );
        match Regex::new(&source) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Invalid scan pattern for tag '{}': {e}", self.tag);
                None
            }
        }
    }

    pub fn matches_on(&self, name: &str, date: NaiveDate) -> bool {
        self.pattern_for(date).is_some_and(|re| re.is_match(name))
    }

    /// Match against the current local date.
    pub fn matches(&self, name: &str) -> bool {
        self.matches_on(name, Local::now().date_naive())
    }
}

/// Scans one fixed directory for candidates.
#[derive(Debug, Clone)]
pub struct FileScanner {
    directory: PathBuf,
    predicate: DatePredicate,
}

impl FileScanner {
    pub fn new(directory: impl Into<PathBuf>, predicate: DatePredicate) -> Self {
        Self {
            directory: directory.into(),
            predicate,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn predicate(&self) -> &DatePredicate {
        &self.predicate
    }

    pub async fn scan(&self) -> Vec<FileCandidate> {
        self.scan_on(Local::now().date_naive()).await
    }

    pub async fn scan_on(&self, date: NaiveDate) -> Vec<FileCandidate> {
        let Some(pattern) = self.predicate.pattern_for(date) else {
            return Vec::new();
        };
        scan_directory(&self.directory, |name| pattern.is_match(name)).await
    }
}

/// Regular files in `dir` whose names satisfy `predicate`, sorted by name.
///
/// A missing or unreadable directory yields an empty list.
pub async fn scan_directory(dir: &Path, predicate: impl Fn(&str) -> bool) -> Vec<FileCandidate> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("Scan directory does not exist: {}", dir.display());
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Cannot read scan directory {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Scan of {} aborted: {e}", dir.display());
                return Vec::new();
            }
        };

        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !predicate(&name) {
            continue;
        }

        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => candidates.push(FileCandidate {
                name,
                path,
                size: meta.len(),
            }),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping {}: {e}", path.display()),
        }
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_predicate_matches_tag_and_date() {
        let p = DatePredicate::new("meet");
        let today = day(2024, 1, 15);
        assert!(p.matches_on("meet-notes20240115.pdf", today));
        assert!(p.matches_on("MEET20240115.PNG", today));
        assert!(p.matches_on("meet_a_b_20240115.jpeg", today));
        assert!(!p.matches_on("report.docx", today));
        assert!(!p.matches_on("notes-meet20240115.pdf", today));
        assert!(!p.matches_on("meet20240115", today));
        assert!(!p.matches_on("meet20240115.tar.gz", today));
        assert!(!p.matches_on("meet20240115.", today));
    }

    #[test]
    fn test_predicate_flips_with_date() {
        let p = DatePredicate::new("meet");
        let name = "meet-notes20240115.pdf";
        assert!(p.matches_on(name, day(2024, 1, 15)));
        assert!(!p.matches_on(name, day(2024, 1, 16)));
    }

    #[test]
    fn test_tag_is_literal() {
        let p = DatePredicate::new("a.b");
        let today = day(2024, 1, 15);
        assert!(p.matches_on("a.b20240115.png", today));
        assert!(!p.matches_on("axb20240115.png", today));
    }

    #[test]
    fn test_matches_uses_today() {
        let p = DatePredicate::new("meet");
        let name = format!("meet{}.png", Local::now().format("%Y%m%d"));
        assert!(p.matches(&name));
    }

    #[tokio::test]
    async fn test_scan_filters_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("meet-notes20240115.pdf"), b"pdf").unwrap();
        std::fs::write(dir.path().join("report.docx"), b"doc").unwrap();
        std::fs::write(dir.path().join("meet-old20240114.pdf"), b"old").unwrap();
        std::fs::create_dir(dir.path().join("meet-folder20240115.d")).unwrap();

        let scanner = FileScanner::new(dir.path(), DatePredicate::new("meet"));
        let found = scanner.scan_on(day(2024, 1, 15)).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "meet-notes20240115.pdf");
        assert_eq!(found[0].size, 3);
        assert_eq!(found[0].path, dir.path().join("meet-notes20240115.pdf"));
    }

    #[tokio::test]
    async fn test_scan_order_is_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["meet-c20240115.png", "meet-a20240115.png", "meet-b20240115.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let scanner = FileScanner::new(dir.path(), DatePredicate::new("meet"));
        let names: Vec<String> = scanner
            .scan_on(day(2024, 1, 15))
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["meet-a20240115.png", "meet-b20240115.png", "meet-c20240115.png"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let scanner = FileScanner::new("/definitely/not/a/desktop", DatePredicate::new("meet"));
        assert!(scanner.scan().await.is_empty());
    }
}
