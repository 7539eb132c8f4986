use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..`
///
/// Does not touch the filesystem, so symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve `path` against `base` (unless already absolute) and normalize it
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Path of `path` relative to `base`, using `..` where they diverge
///
/// Both paths are expected to be absolute and normalized. When they share
/// no root the path is returned unchanged.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    if path_components.first() != base_components.first() {
        return path.to_path_buf();
    }

    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

/// Render a path with forward slashes, the way tsconfig patterns are written
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
