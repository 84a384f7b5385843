// Directory scan: collects the local files that will make up the backup
// manifest. Deliberately simple: one directory, no recursion, `.txt`
// files only, capped at a fixed count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on manifest size. Matches the server-side expectation of
/// modest per-job file counts; anything beyond the cap is ignored.
pub const MAX_FILES: usize = 1000;

/// List the regular `.txt` files directly inside `dir`, sorted by path
/// so the manifest order is deterministic. Stops at [`MAX_FILES`].
pub fn scan_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            files.push(path);
        }
    }
    files.sort();
    files.truncate(MAX_FILES);
    Ok(files)
}
