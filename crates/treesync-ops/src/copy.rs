//! Filesystem primitives that apply one entry.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use treesync_core::Entry;

/// Owner bits a directory keeps until its contents are in place.
const OWNER_RWX: u32 = 0o700;

/// Create the directory at `path`, writable by the owner.
///
/// The source `mode` is only final once [`apply_mode`] runs after the
/// directory's contents are copied. The parent must already exist.
pub fn create_directory(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode | OWNER_RWX);
    }
    #[cfg(not(unix))]
    let _ = (mode, OWNER_RWX);
    builder.create(path)
}

/// Stream `source` into `dest`, creating or truncating it, then apply `mode`.
///
/// A symlink at `dest` is replaced, never written through.
/// Returns the number of bytes written.
pub fn copy_file(source: &Path, dest: &Path, mode: u32) -> io::Result<u64> {
    let mut reader = File::open(source)?;

    if fs::symlink_metadata(dest).is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(dest)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut writer = options.open(dest)?;

    let bytes = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    set_file_mode(&writer, mode)?;
    Ok(bytes)
}

/// Remove a destination entry. Directories must already be empty.
pub fn remove_entry(entry: &Entry) -> io::Result<()> {
    if entry.is_dir() {
        fs::remove_dir(&entry.absolute_path)
    } else {
        fs::remove_file(&entry.absolute_path)
    }
}

/// Overwrite the permission bits of the object at `path`, ignoring the umask.
#[cfg(unix)]
pub fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, permissions)
}

/// Set the permission bits through an open handle.
#[cfg(unix)]
fn set_file_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(file: &File, mode: u32) -> io::Result<()> {
    let mut permissions = file.metadata()?.permissions();
    permissions.set_readonly(mode & 0o222 == 0);
    file.set_permissions(permissions)
}
