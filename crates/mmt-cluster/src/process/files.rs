use std::fs;
use std::io::{self, Write};

use camino::Utf8Path;
use tempfile::Builder;

/// Writes the provided bytes to the path using an atomic persist step.
///
/// Readers either see the previous content or the complete new payload.
pub(crate) fn atomic_write(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(directory)?;

    let mut file = Builder::new()
        .prefix(path.file_name().unwrap_or("mmt"))
        .tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Reads a file, returning `None` when it does not exist.
pub(crate) fn read_optional_file(path: &Utf8Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

/// Removes a file, treating a missing file as success.
pub(crate) fn remove_if_exists(path: &Utf8Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
