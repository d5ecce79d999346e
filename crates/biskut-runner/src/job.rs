//! Compile job: a validated source file and the artifacts derived from it

use crate::error::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source file accepted for compilation.
///
/// The binary and the log file are named after the source's base name, so
/// two jobs for `a/main.cpp` and `b/main.cpp` in the same work directory
/// share artifact paths.
#[derive(Debug, Clone)]
pub struct CompileJob {
    source_path: PathBuf,
    binary_name: String,
    binary_path: PathBuf,
}

impl CompileJob {
    /// Validate `source` and derive the artifact paths inside `work_dir`.
    pub fn new(source: &Path, extension: &str, work_dir: &Path) -> Result<Self> {
        let matches_ext = source
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == extension);
        if !matches_ext {
            return Err(Error::InvalidInput(format!(
                "input file must have a .{} extension: {}",
                extension,
                source.display()
            )));
        }

        let binary_name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::InvalidInput(format!("cannot derive a binary name from {}", source.display()))
            })?
            .to_string();

        if !source.is_file() {
            return Err(Error::InvalidInput(format!(
                "source file not found: {}",
                source.display()
            )));
        }

        let binary_path = work_dir.join(&binary_name);

        Ok(Self {
            source_path: source.to_path_buf(),
            binary_name,
            binary_path,
        })
    }

    /// Path of the source file
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Base name of the source without extension
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }

    /// Where the compiler writes the binary
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Log file path next to the binary.
    pub fn log_path(&self) -> PathBuf {
        self.binary_path
            .with_file_name(format!("{}_output.log", self.binary_name))
    }

    /// Path to spawn. A bare file name would be looked up on `PATH`.
    pub fn executable(&self) -> PathBuf {
        if self.binary_path.components().count() == 1 {
            Path::new(".").join(&self.binary_path)
        } else {
            self.binary_path.clone()
        }
    }

    /// Delete the binary. Returns `Ok(false)` when it was already gone.
    pub fn remove_binary(&self) -> io::Result<bool> {
        match std::fs::remove_file(&self.binary_path) {
            Ok(()) => {
                debug!(path = %self.binary_path.display(), "Removed binary");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "int main() { return 0; }\n").unwrap();
        path
    }

    #[test]
    fn test_derives_binary_name() {
        let dir = TempDir::new().unwrap();
        let source = touch(&dir, "hello.cpp");
        let job = CompileJob::new(&source, "cpp", dir.path()).unwrap();

        assert_eq!(job.binary_name(), "hello");
        assert_eq!(job.binary_path(), dir.path().join("hello"));
        assert_eq!(job.log_path(), dir.path().join("hello_output.log"));
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let source = touch(&dir, "loop.xyz");
        let err = CompileJob::new(&source, "cpp", dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = CompileJob::new(&dir.path().join("ghost.cpp"), "cpp", dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_relative_binary_is_spawned_from_cwd() {
        let dir = TempDir::new().unwrap();
        let source = touch(&dir, "prog.cpp");
        let job = CompileJob::new(&source, "cpp", Path::new("")).unwrap();
        assert_eq!(job.executable(), PathBuf::from("./prog"));
    }

    #[test]
    fn test_remove_binary_twice() {
        let dir = TempDir::new().unwrap();
        let source = touch(&dir, "twice.cpp");
        let job = CompileJob::new(&source, "cpp", dir.path()).unwrap();
        std::fs::write(job.binary_path(), b"\x7fELF").unwrap();

        assert!(job.remove_binary().unwrap());
        assert!(!job.remove_binary().unwrap());
    }
}
