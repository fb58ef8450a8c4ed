//! 清理下载失败或被拒绝的残留文件。

use std::fs;
use std::io;
use std::path::Path;

/// Deletes `path` if it exists. Returns whether a file was actually removed.
pub fn remove_partial(path: impl AsRef<Path>) -> io::Result<bool> {
    match fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}
