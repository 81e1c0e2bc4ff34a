use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rates_core::{SnapshotError, SnapshotStore};

/// Stores each snapshot as a `.json` file in one directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn temp_path_for(
        &self,
        name: &str,
    ) -> PathBuf {
        self.dir.join(format!(".{name}.{}.tmp", std::process::id()))
    }

    /// Rejects names that would escape the snapshot directory.
    fn path_for(
        &self,
        name: &str,
    ) -> Result<PathBuf, SnapshotError> {
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|file_name| file_name == name);
        if !plain {
            return Err(SnapshotError::Storage(format!("invalid snapshot name '{name}'")));
        }
        Ok(self.dir.join(name))
    }
}

fn storage_error(
    path: &Path,
    err: io::Error,
) -> SnapshotError {
    SnapshotError::Storage(format!("{}: {err}", path.display()))
}

impl SnapshotStore for FileSnapshotStore {
    /// Writes to a temporary file first and links it into place, so a
    /// failed write never leaves a partial snapshot under `name`.
    fn save(
        &mut self,
        name: &str,
        document: &str,
    ) -> Result<(), SnapshotError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|e| storage_error(&self.dir, e))?;

        let temp = self.temp_path_for(name);
        let written = fs::File::create(&temp).and_then(|mut file| {
            file.write_all(document.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(storage_error(&temp, e));
        }

        let linked = fs::hard_link(&temp, &path);
        let _ = fs::remove_file(&temp);
        linked.map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => SnapshotError::AlreadyExists(name.to_string()),
            _ => storage_error(&path, e),
        })
    }

    fn load(
        &self,
        name: &str,
    ) -> Result<String, SnapshotError> {
        let path = self.path_for(name)?;
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SnapshotError::NotFound(name.to_string()),
            _ => storage_error(&path, e),
        })
    }

    fn list(&self) -> Result<Vec<String>, SnapshotError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(storage_error(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| storage_error(&self.dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("net-rates-store-tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn failed_write_leaves_no_file_and_allows_retry() {
        let dir = scratch_dir("failed_write");
        let mut store = FileSnapshotStore::new(&dir);
        // A directory where the temporary file should go makes the write fail.
        fs::create_dir_all(store.temp_path_for("a.json")).unwrap();

        let result = store.save("a.json", "{}");

        assert!(matches!(result, Err(SnapshotError::Storage(_))));
        assert!(!dir.join("a.json").exists());
        assert!(matches!(store.load("a.json"), Err(SnapshotError::NotFound(_))));

        fs::remove_dir(store.temp_path_for("a.json")).unwrap();
        store.save("a.json", "{}").unwrap();
        assert_eq!(store.load("a.json").unwrap(), "{}");
    }

    #[test]
    fn saves_leave_only_the_snapshot_behind() {
        let dir = scratch_dir("no_temp_files");
        let mut store = FileSnapshotStore::new(&dir);

        store.save("a.json", "{}").unwrap();
        let second = store.save("a.json", "{\"customer_name\": \"B\"}");

        assert!(matches!(second, Err(SnapshotError::AlreadyExists(_))));
        assert_eq!(dir_entries(&dir), vec!["a.json".to_string()]);
        assert_eq!(store.load("a.json").unwrap(), "{}");
    }
}
