pub mod logging;

use std::path::Path;

/// Glob pattern for `file_pattern` inside `dir`, with `dir` matched literally.
pub fn literal_dir_pattern(dir: &Path, file_pattern: &str) -> String {
    let dir = glob::Pattern::escape(&dir.to_string_lossy());
    Path::new(&dir).join(file_pattern).to_string_lossy().into_owned()
}
