use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Ensure the parent directory of `path` exists, 0700 on Unix.
pub fn ensure_parent_secure(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create parent directory")?;
        #[cfg(unix)]
        {
            let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o700));
        }
    }
    Ok(())
}

/// Atomically write `bytes` to `path`, 0600 on Unix.
pub fn atomic_write_secure(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = tmp_path_for(path);
    {
        let mut tmp = File::create(&tmp_path).context("Failed to create temporary file")?;
        tmp.write_all(bytes)?;
        let _ = tmp.sync_data();
    }

    #[cfg(unix)]
    set_perm_0600(&tmp_path);

    fs::rename(&tmp_path, path).context("Failed to replace file atomically")?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.tmp", path.display()))
}

#[cfg(unix)]
fn set_perm_0600(path: &Path) {
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    PathBuf::from(format!("{}.{n}", path.display()))
}

/// Rotate `<file>.1` .. `<file>.N` and write atomically.
pub fn write_with_backups(path: &Path, bytes: &[u8], backups: usize) -> Result<()> {
    ensure_parent_secure(path)?;

    if backups > 0 {
        let _ = fs::remove_file(backup_path(path, backups));

        for i in (1..backups).rev() {
            let src = backup_path(path, i);
            let dst = backup_path(path, i + 1);
            if src.exists() {
                let _ = fs::rename(&src, &dst);
                #[cfg(unix)]
                set_perm_0600(&dst);
            }
        }

        if path.exists() {
            let first = backup_path(path, 1);
            let _ = fs::rename(path, &first);
            #[cfg(unix)]
            set_perm_0600(&first);
        }
    }

    atomic_write_secure(path, bytes)
}

/// Writes an export under `dir`; an existing file is never overwritten.
pub fn write_export(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    fs::create_dir_all(dir).context("Failed to create export directory")?;
    atomic_write_secure(&path, content.as_bytes())?;
    Ok(path)
}
