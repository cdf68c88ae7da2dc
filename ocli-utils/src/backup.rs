use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Location of a backup artifact: `<dir>/<db>.<format>`, or
/// `<dir>/<db>_no_fs.<format>` when the filestore is excluded.
pub fn backup_file_path(dir: &Path, db_name: &str, format: &str, no_filestore: bool) -> PathBuf {
    let file_name = if no_filestore {
        format!("{}_no_fs.{}", db_name, format)
    } else {
        format!("{}.{}", db_name, format)
    };
    dir.join(file_name)
}

/// Like [`backup_file_path`], creating `dir` first when it is missing.
pub fn prepare_backup_path(
    dir: &Path,
    db_name: &str,
    format: &str,
    no_filestore: bool,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(backup_file_path(dir, db_name, format, no_filestore))
}
