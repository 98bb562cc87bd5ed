//! Row folder archiving
//!
//! Compresses a finished row folder into a sibling `<name>.zip` and, on
//! request, removes the folder afterwards. Removal is a separate step so the
//! caller can guarantee a folder is only ever deleted after its archive was
//! written successfully.

use crate::config::Compression;
use crate::error::{ArchiveError, FilesystemError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Suffix of files that are still being written; such files never live
/// inside a row folder
pub(crate) const PARTIAL_SUFFIX: &str = ".part";

/// ZIP archiver for row folders
#[derive(Clone, Copy, Debug, Default)]
pub struct Archiver {
    compression: Compression,
}

impl Archiver {
    /// Create an archiver using the given compression method
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    /// Path of the archive for `directory`: `<parent>/<name>.zip`
    pub fn archive_path_for(directory: &Path) -> Result<PathBuf, ArchiveError> {
        let name = directory
            .file_name()
            .ok_or_else(|| ArchiveError::Walk {
                directory: directory.to_path_buf(),
                reason: "directory has no final path component".to_string(),
            })?
            .to_string_lossy();
        let parent = directory.parent().unwrap_or_else(|| Path::new(""));
        Ok(parent.join(format!("{}.zip", name)))
    }

    /// Compress every file under `directory` into `<parent>/<name>.zip`
    ///
    /// Entry names are paths relative to `directory`, with `/` separators.
    /// The archive is first written as `<name>.zip.part` and renamed on
    /// success; on failure the partial file is removed and the source
    /// directory is left untouched.
    ///
    /// # Returns
    ///
    /// The path of the finished archive.
    pub async fn archive(&self, directory: &Path) -> Result<PathBuf, ArchiveError> {
        let archive_path = Self::archive_path_for(directory)?;
        let partial_path = partial_path(&archive_path);

        debug!(?directory, ?archive_path, "compressing folder");

        let directory_owned = directory.to_path_buf();
        let partial_owned = partial_path.clone();
        let method: zip::CompressionMethod = self.compression.into();

        let result = spawn_blocking(move || write_archive(&directory_owned, &partial_owned, method))
            .await
            .map_err(|e| ArchiveError::Aborted {
                directory: directory.to_path_buf(),
                reason: e.to_string(),
            })
            .and_then(|inner| inner);

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&partial_path).await
                    && remove_err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(?partial_path, error = %remove_err, "failed to remove partial archive");
                }
                return Err(e);
            }
        };

        tokio::fs::rename(&partial_path, &archive_path)
            .await
            .map_err(|e| ArchiveError::Write {
                archive: archive_path.clone(),
                reason: format!("failed to finalize archive: {}", e),
            })?;

        info!(?archive_path, entries, "created archive");
        Ok(archive_path)
    }

    /// Recursively remove a row folder after it was archived
    pub async fn remove_source(directory: &Path) -> Result<(), FilesystemError> {
        tokio::fs::remove_dir_all(directory)
            .await
            .map_err(|e| FilesystemError::RemoveDir {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!(?directory, "removed archived folder");
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write the archive synchronously, returning the number of file entries
fn write_archive(
    directory: &Path,
    archive_path: &Path,
    method: zip::CompressionMethod,
) -> Result<usize, ArchiveError> {
    let write_err = |reason: String| ArchiveError::Write {
        archive: archive_path.to_path_buf(),
        reason,
    };

    let file = File::create(archive_path)
        .map_err(|e| write_err(format!("failed to create archive: {}", e)))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default().compression_method(method);

    let mut entries = 0;
    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ArchiveError::Walk {
            directory: directory.to_path_buf(),
            reason: e.to_string(),
        })?;

        let relative = entry
            .path()
            .strip_prefix(directory)
            .map_err(|e| ArchiveError::Walk {
                directory: directory.to_path_buf(),
                reason: e.to_string(),
            })?;
        let name = entry_name(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| write_err(format!("failed to add directory entry: {}", e)))?;
        } else if file_type.is_file() {
            writer
                .start_file(name, options)
                .map_err(|e| write_err(format!("failed to start entry: {}", e)))?;
            let mut source = File::open(entry.path())
                .map_err(|e| write_err(format!("failed to open {}: {}", entry.path().display(), e)))?;
            std::io::copy(&mut source, &mut writer)
                .map_err(|e| write_err(format!("failed to copy {}: {}", entry.path().display(), e)))?;
            entries += 1;
        } else {
            debug!(?relative, "skipping non-regular file");
        }
    }

    let mut file = writer
        .finish()
        .map_err(|e| write_err(format!("failed to finish archive: {}", e)))?;
    file.flush()
        .map_err(|e| write_err(format!("failed to flush archive: {}", e)))?;

    Ok(entries)
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    /// Read an archive back as sorted (name, content) pairs, directories excluded
    fn archive_contents(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut contents = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).unwrap();
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            contents.push((file.name().to_string(), data));
        }
        contents.sort();
        contents
    }

    fn make_row_dir(root: &TempDir, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let dir = root.path().join(name);
        for (file, content) in files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn archive_path_is_sibling_zip() {
        let path = Archiver::archive_path_for(Path::new("/out/SKU.1")).unwrap();
        assert_eq!(path, PathBuf::from("/out/SKU.1.zip"));
    }

    #[tokio::test]
    async fn archives_files_with_relative_names() {
        let root = TempDir::new().unwrap();
        let dir = make_row_dir(&root, "A", &[("a.jpg", b"aaa"), ("b.jpg", b"bbbb")]);

        let archive = Archiver::default().archive(&dir).await.unwrap();

        assert_eq!(archive, root.path().join("A.zip"));
        assert_eq!(
            archive_contents(&archive),
            vec![
                ("a.jpg".to_string(), b"aaa".to_vec()),
                ("b.jpg".to_string(), b"bbbb".to_vec()),
            ]
        );
        assert!(dir.exists(), "archiving alone must not remove the folder");
        assert!(!root.path().join("A.zip.part").exists());
    }

    #[tokio::test]
    async fn preserves_subdirectory_structure() {
        let root = TempDir::new().unwrap();
        let dir = make_row_dir(
            &root,
            "nested",
            &[("top.png", b"1"), ("thumbs/small.png", b"2")],
        );

        let archive = Archiver::new(Compression::Stored).archive(&dir).await.unwrap();

        assert_eq!(
            archive_contents(&archive),
            vec![
                ("thumbs/small.png".to_string(), b"2".to_vec()),
                ("top.png".to_string(), b"1".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn archives_files_with_partial_suffix() {
        let root = TempDir::new().unwrap();
        let dir = make_row_dir(&root, "P", &[("a.jpg", b"ok"), ("manual.part", b"whole")]);

        let archive = Archiver::default().archive(&dir).await.unwrap();

        assert_eq!(
            archive_contents(&archive),
            vec![
                ("a.jpg".to_string(), b"ok".to_vec()),
                ("manual.part".to_string(), b"whole".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_directory_fails_without_leaving_archive() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("ghost");

        let err = Archiver::default().archive(&dir).await.unwrap_err();

        assert!(matches!(err, ArchiveError::Walk { .. }), "got {:?}", err);
        assert!(!root.path().join("ghost.zip").exists());
        assert!(!root.path().join("ghost.zip.part").exists());
    }

    #[tokio::test]
    async fn unwritable_archive_location_is_write_error() {
        let root = TempDir::new().unwrap();
        let dir = make_row_dir(&root, "W", &[("a.jpg", b"x")]);
        // A directory squatting on the partial archive path makes File::create fail
        std::fs::create_dir(root.path().join("W.zip.part")).unwrap();

        let err = Archiver::default().archive(&dir).await.unwrap_err();

        assert!(matches!(err, ArchiveError::Write { .. }), "got {:?}", err);
        assert!(!root.path().join("W.zip").exists());
        assert!(dir.join("a.jpg").exists());
    }

    #[tokio::test]
    async fn remove_source_deletes_folder() {
        let root = TempDir::new().unwrap();
        let dir = make_row_dir(&root, "D", &[("a.jpg", b"x")]);

        Archiver::remove_source(&dir).await.unwrap();
        assert!(!dir.exists());

        let err = Archiver::remove_source(&dir).await.unwrap_err();
        assert!(matches!(err, FilesystemError::RemoveDir { .. }));
    }
}
