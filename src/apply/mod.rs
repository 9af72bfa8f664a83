use crate::errors::{GenError, GenResult};
use crate::safety;
use fs_err as fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IsDirectory,
    OutsideTarget,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::IsDirectory => "is a directory, not a file",
            SkipReason::OutsideTarget => "resolves outside the target directory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, bytes: u64, replaced: bool },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { path: PathBuf, reason: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }

    /// The per-entry error for anything that did not land on disk.
    pub fn to_error(&self, rel: &str) -> Option<GenError> {
        match self {
            WriteOutcome::Written { .. } => None,
            WriteOutcome::Skipped { reason, .. } => Some(GenError::WriteSkipped {
                path: rel.to_string(),
                reason: reason.describe().to_string(),
            }),
            WriteOutcome::Failed { reason, .. } => Some(GenError::WriteSkipped {
                path: rel.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Write `content` to `directory/path`. Never returns an error: collisions
/// with existing directories, paths escaping `directory` and I/O failures are
/// all reported in the outcome.
pub fn write_file(path: &str, content: &str, directory: &Path) -> WriteOutcome {
    let abs = directory.join(path);

    if !safety::path_is_contained(path) {
        return WriteOutcome::Skipped { path: abs, reason: SkipReason::OutsideTarget };
    }
    if abs.is_dir() {
        return WriteOutcome::Skipped { path: abs, reason: SkipReason::IsDirectory };
    }

    match write_atomic(&abs, content, directory) {
        Ok(replaced) => WriteOutcome::Written { bytes: content.len() as u64, path: abs, replaced },
        Err(e) => WriteOutcome::Failed { path: abs, reason: format!("{e:#}") },
    }
}

fn write_atomic(abs: &Path, content: &str, root: &Path) -> anyhow::Result<bool> {
    let parent = abs.parent().unwrap_or(root);
    // concurrent writers may race on shared parents; create_dir_all tolerates that
    fs::create_dir_all(parent)?;
    let replaced = abs.exists();
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(abs)?;
    Ok(replaced)
}

/// Remove and recreate `directory`. Refuses the working directory, its
/// ancestors and filesystem roots.
pub fn reset_dir(directory: &Path, cwd: &Path) -> GenResult<()> {
    if !safety::reset_is_allowed(directory, cwd) {
        return Err(GenError::UnsafeReset { path: directory.to_path_buf() });
    }
    if directory.is_dir() {
        fs::remove_dir_all(directory).map_err(|e| GenError::io(directory, e))?;
    } else if directory.exists() {
        fs::remove_file(directory).map_err(|e| GenError::io(directory, e))?;
    }
    fs::create_dir_all(directory).map_err(|e| GenError::io(directory, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_file_reads_back_byte_identical() {
        let temp = tempfile::tempdir().expect("tempdir");
        let content = "fn main() {\n    println!(\"héllo\");\n}\n";

        let outcome = write_file("src/bin/main.rs", content, temp.path());
        assert!(outcome.is_written(), "{outcome:?}");
        let back = std::fs::read_to_string(temp.path().join("src/bin/main.rs")).expect("read");
        assert_eq!(back, content);
    }

    #[test]
    fn existing_file_is_overwritten() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("a.txt"), "old").expect("seed");

        match write_file("a.txt", "new", temp.path()) {
            WriteOutcome::Written { replaced, bytes, .. } => {
                assert!(replaced);
                assert_eq!(bytes, 3);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt")).expect("read"), "new");
    }

    #[test]
    fn directory_collision_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(temp.path().join("src")).expect("mkdir");

        let outcome = write_file("src", "code", temp.path());
        assert_eq!(
            outcome,
            WriteOutcome::Skipped { path: temp.path().join("src"), reason: SkipReason::IsDirectory }
        );
        assert!(matches!(outcome.to_error("src"), Some(GenError::WriteSkipped { .. })));
        assert!(temp.path().join("src").is_dir());
    }

    #[test]
    fn escaping_path_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("out");
        let outcome = write_file("../evil.sh", "rm -rf ~", &target);
        assert!(matches!(outcome, WriteOutcome::Skipped { reason: SkipReason::OutsideTarget, .. }));
        assert!(!temp.path().join("evil.sh").exists());
    }

    #[test]
    fn reset_empties_only_the_target() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cwd = temp.path();
        let target = cwd.join("generated");
        std::fs::create_dir_all(target.join("nested")).expect("mkdir");
        std::fs::write(target.join("nested/old.txt"), "x").expect("seed");
        std::fs::write(cwd.join("keep.txt"), "y").expect("seed");

        reset_dir(&target, cwd).expect("reset");
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).expect("read_dir").count(), 0);
        assert!(cwd.join("keep.txt").exists());

        assert!(matches!(reset_dir(cwd, cwd), Err(GenError::UnsafeReset { .. })));
    }
}
