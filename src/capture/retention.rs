use std::{
    fs,
    path::PathBuf,
    time::SystemTime,
};

use anyhow::{Context, Result};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, utils::literal_dir_pattern};

/// Keeps the `keep_last` most recently modified files matching `pattern` in `dir`.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    dir: PathBuf,
    pattern: String,
    keep_last: usize,
}

impl RetentionPolicy {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>, keep_last: usize) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            keep_last,
        }
    }

    /// Deletes everything past the newest `keep_last` files. Returns how many were removed.
    pub fn apply(&self) -> Result<usize> {
        let pattern = literal_dir_pattern(&self.dir, &self.pattern);

        let mut artifacts: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in glob::glob(&pattern).context("invalid artifact pattern")? {
            let path = entry.context("failed to read artifact entry")?;
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .with_context(|| format!("failed to stat {}", path.display()))?;
            artifacts.push((path, modified));
        }

        if artifacts.len() <= self.keep_last {
            return Ok(0);
        }

        artifacts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = 0;
        for (path, _) in artifacts.iter().skip(self.keep_last) {
            fs::remove_file(path).with_context(|| format!("failed to delete {}", path.display()))?;
            log_debug!("Deleted old capture: {}", path.display());
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::Path, time::Duration};
    use tempfile::TempDir;

    fn write_aged(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"x").unwrap();
        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn keeps_most_recently_modified() {
        let dir = TempDir::new().unwrap();
        // Names sort opposite to age so only mtime can explain the result.
        let newest = write_aged(dir.path(), "webcam_a.jpg", 10);
        let middle = write_aged(dir.path(), "webcam_b.jpg", 20);
        let older = write_aged(dir.path(), "webcam_c.jpg", 30);
        let oldest = write_aged(dir.path(), "webcam_d.jpg", 40);
        let other = write_aged(dir.path(), "screenshot_a.jpg", 1000);

        let removed = RetentionPolicy::new(dir.path(), "webcam_*.jpg", 2).apply().unwrap();

        assert_eq!(removed, 2);
        assert!(newest.exists());
        assert!(middle.exists());
        assert!(!older.exists());
        assert!(!oldest.exists());
        assert!(other.exists());
    }

    #[test]
    fn fewer_files_than_limit_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        write_aged(dir.path(), "screenshot_1.jpg", 5);
        write_aged(dir.path(), "screenshot_2.jpg", 6);

        let removed = RetentionPolicy::new(dir.path(), "screenshot_*.jpg", 10).apply().unwrap();
        assert_eq!(removed, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn keep_zero_removes_all_matches() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write_aged(dir.path(), &format!("screenshot_{i}.jpg"), i);
        }
        let removed = RetentionPolicy::new(dir.path(), "screenshot_*.jpg", 0).apply().unwrap();
        assert_eq!(removed, 5);
    }

    #[test]
    fn missing_directory_removes_nothing() {
        let dir = TempDir::new().unwrap();
        let policy = RetentionPolicy::new(dir.path().join("absent"), "webcam_*.jpg", 1);
        assert_eq!(policy.apply().unwrap(), 0);
    }

    #[test]
    fn bracketed_directory_is_matched_literally() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("shots [work]");
        fs::create_dir(&dir).unwrap();
        for i in 0..5 {
            write_aged(&dir, &format!("screenshot_{i}.jpg"), 10 * (i + 1));
        }

        let removed = RetentionPolicy::new(&dir, "screenshot_*.jpg", 2).apply().unwrap();

        assert_eq!(removed, 3);
        assert!(dir.join("screenshot_0.jpg").exists());
        assert!(dir.join("screenshot_1.jpg").exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
    }
}
