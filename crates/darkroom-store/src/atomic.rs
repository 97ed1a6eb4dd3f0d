// ABOUTME: Atomic file replacement via temp-file write, fsync, and same-directory rename.
// ABOUTME: A reader sees either the full previous content or the full new content, never a partial file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use ulid::Ulid;

/// Atomically replace the file at `path` with `bytes`.
///
/// Writes to a temp file in the same directory (fresh ULID suffix so two
/// in-flight writes to the same logical path cannot collide), fsyncs, then
/// renames onto the target. A failure before the rename removes the temp
/// file and leaves the target untouched. The same-directory rename is the
/// atomicity boundary; atomicity across directories is not assumed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no parent directory")
    })?;
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "target path has no file name")
    })?;

    let tmp_path = dir.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        Ulid::new()
    ));

    let write_result: io::Result<()> = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Fsync the parent directory so the rename metadata is durable.
    // Best-effort: the rename already succeeded and the data is consistent.
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    Ok(())
}
