use std::path::{Component, Path};

/// True if `candidate` is a relative path that stays inside the directory it
/// is joined to. Checked lexically; nothing needs to exist on disk.
pub fn path_is_contained(candidate: &str) -> bool {
    if candidate.trim().is_empty() {
        return false;
    }
    let mut depth: usize = 0;
    for comp in Path::new(candidate).components() {
        match comp {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// A directory is safe to wipe if it is not a filesystem root and not the
/// working directory (or one of its ancestors).
pub fn reset_is_allowed(target: &Path, cwd: &Path) -> bool {
    let abs = if target.is_absolute() { target.to_path_buf() } else { cwd.join(target) };
    let abs = std::fs::canonicalize(&abs).unwrap_or(abs);
    let cwd = std::fs::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf());

    if abs.parent().is_none() {
        return false;
    }
    !cwd.starts_with(&abs)
}
