use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Picks the upscaled image out of the tool's output directory.
///
/// The tool chooses its own file name (it appends a suffix), so the result
/// is discovered by listing rather than predicted. Entries are sorted by name
/// and the first regular file wins. If the tool ever writes more than one
/// file the choice is ambiguous; that case is logged.
pub fn find_output_artifact(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    if files.len() > 1 {
        log::warn!(
            "Upscaler wrote {} files to {}, using {}",
            files.len(),
            dir.display(),
            files[0].display()
        );
    }
    Ok(files.into_iter().next())
}
