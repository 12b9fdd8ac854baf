// Writer: idempotent emission of the generated module.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write the module, creating parent directories and leaving the file
/// untouched when the contents have not changed.
pub fn write_module(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
        }
    }
    write_if_changed(path, contents)
}

fn write_if_changed(path: &Path, new_contents: &str) -> Result<()> {
    let needs_write = match fs::read_to_string(path) {
        Ok(existing) => existing != new_contents,
        Err(_) => true,
    };
    if !needs_write {
        return Ok(());
    }
    let tmp_path = tmp_path_for(path);
    {
        let mut f = fs::File::create(&tmp_path)
            .with_context(|| format!("create tmp file {tmp_path:?}"))?;
        f.write_all(new_contents.as_bytes())
            .with_context(|| format!("write tmp file {tmp_path:?}"))?;
        f.flush().ok();
    }
    fs::rename(&tmp_path, path).with_context(|| format!("rename {tmp_path:?} -> {path:?}"))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_string_lossy().to_string();
    s.push_str(".tmp");
    PathBuf::from(s)
}
