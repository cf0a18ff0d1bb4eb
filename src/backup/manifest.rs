//! Manifest file handling
//!
//! The manifest is a plain UTF-8 text file at the root of a unit listing one
//! tracked relative path per line. Lines are only ever appended; the file is
//! re-read when a unit is reconstructed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BackupError, BackupResult};

/// Well-known manifest filename inside every unit directory
pub const MANIFEST_FILE_NAME: &str = "$manifest$.txt";

/// Express `path` relative to `reference`
///
/// Relative inputs are resolved against `reference` first. Both sides are
/// normalized lexically (`.` dropped, `..` folded), so nothing needs to exist
/// on disk.
pub fn relative_to(reference: &Path, path: &Path) -> BackupResult<PathBuf> {
    let reference = normalize(reference);
    let absolute = normalize(&reference.join(path));

    let outside = || BackupError::OutsideReference {
        path: path.to_path_buf(),
        reference: reference.clone(),
    };

    let relative = absolute.strip_prefix(&reference).map_err(|_| outside())?;
    // An empty or relative reference strips nothing from an absolute path
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !plain {
        return Err(outside());
    }

    Ok(relative.to_path_buf())
}

/// Lexically normalize a path without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let after_name = matches!(last, Some(Component::Normal(_)));
                // `..` at the root stays at the root
                let at_root = matches!(last, Some(Component::RootDir | Component::Prefix(_)));

                if after_name {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render a relative path as a manifest line (always `/`-separated)
pub fn to_line(manifest: &Path, relative: &Path) -> BackupResult<String> {
    let corrupt = |reason: &str| BackupError::ManifestCorrupt {
        manifest: manifest.to_path_buf(),
        reason: format!("{}: {}", reason, relative.display()),
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| corrupt("path is not valid UTF-8"))?;
                parts.push(part);
            }
            _ => return Err(corrupt("path is not a plain relative path")),
        }
    }

    let line = parts.join("/");
    if line.contains(['\n', '\r']) {
        return Err(corrupt("path contains a line break"));
    }
    if line == MANIFEST_FILE_NAME {
        return Err(corrupt("path collides with the manifest"));
    }
    Ok(line)
}

/// Parse a single manifest line into a relative path
///
/// Accepts both `/` and the platform separator so manifests written on
/// another platform still load.
fn parse_line(manifest: &Path, line: &str) -> BackupResult<PathBuf> {
    let corrupt = |reason: &str| BackupError::ManifestCorrupt {
        manifest: manifest.to_path_buf(),
        reason: format!("{} in line {:?}", reason, line),
    };

    if Path::new(line).has_root() || Path::new(line).is_absolute() {
        return Err(corrupt("absolute path"));
    }

    let mut relative = PathBuf::new();
    for part in line.split(|c: char| c == '/' || std::path::is_separator(c)) {
        match part {
            "" | "." => {}
            ".." => return Err(corrupt("parent directory reference")),
            _ => relative.push(part),
        }
    }

    // Windows drive prefixes survive the split above
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(corrupt("absolute path"));
    }
    if relative.as_os_str().is_empty() {
        return Err(corrupt("empty path"));
    }

    Ok(relative)
}

/// Read every tracked path from a manifest, preserving order
///
/// Blank lines are ignored and repeated entries keep their first position.
pub fn read(manifest: &Path) -> BackupResult<Vec<PathBuf>> {
    let bytes = fs::read(manifest).map_err(|e| {
        BackupError::Io(format!(
            "Failed to read manifest {}: {}",
            manifest.display(),
            e
        ))
    })?;

    let text = String::from_utf8(bytes).map_err(|_| BackupError::ManifestCorrupt {
        manifest: manifest.to_path_buf(),
        reason: "not valid UTF-8".into(),
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let path = parse_line(manifest, line)?;
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    Ok(paths)
}

/// Append one entry to the manifest, creating it if absent
///
/// The line is flushed and synced before the handle is dropped.
pub fn append(manifest: &Path, relative: &Path) -> BackupResult<()> {
    let line = to_line(manifest, relative)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(manifest)
        .map_err(|e| {
            BackupError::Io(format!(
                "Failed to open manifest {}: {}",
                manifest.display(),
                e
            ))
        })?;

    writeln!(file, "{}", line)
        .map_err(|e| BackupError::Io(format!("Failed to write manifest entry: {}", e)))?;

    file.flush()
        .map_err(|e| BackupError::Io(format!("Failed to flush manifest: {}", e)))?;

    file.sync_all()
        .map_err(|e| BackupError::Io(format!("Failed to sync manifest: {}", e)))?;

    Ok(())
}

/// Infer tracked paths for a unit written before manifests existed
///
/// Every file under `root` counts except files named like the manifest, at
/// any depth. Results are sorted so repeated scans agree.
pub fn scan_legacy(root: &Path) -> BackupResult<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            BackupError::Io(format!("Failed to scan {}: {}", root.display(), e))
        })?;

        if !entry.file_type().is_file() || entry.file_name() == MANIFEST_FILE_NAME {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            paths.push(relative.to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_to_absolute_path() {
        let rel = relative_to(Path::new("/app"), Path::new("/app/Plugins/a.dll")).unwrap();
        assert_eq!(rel, PathBuf::from("Plugins/a.dll"));
    }

    #[test]
    fn test_relative_to_relative_path() {
        let rel = relative_to(Path::new("/app"), Path::new("./Libs/../Plugins/a.dll")).unwrap();
        assert_eq!(rel, PathBuf::from("Plugins/a.dll"));
    }

    #[test]
    fn test_relative_to_rejects_escape() {
        let err = relative_to(Path::new("/app"), Path::new("../etc/passwd")).unwrap_err();
        assert!(matches!(err, BackupError::OutsideReference { .. }));

        let err = relative_to(Path::new("/app"), Path::new("/other/file")).unwrap_err();
        assert!(matches!(err, BackupError::OutsideReference { .. }));
    }

    #[test]
    fn test_relative_to_rejects_absolute_path_under_relative_reference() {
        let err = relative_to(Path::new("."), Path::new("/tmp/ws/Cargo.toml")).unwrap_err();
        assert!(matches!(err, BackupError::OutsideReference { .. }));

        let err = relative_to(Path::new("sub"), Path::new("/cwd/sub/x.txt")).unwrap_err();
        assert!(matches!(err, BackupError::OutsideReference { .. }));
    }

    #[test]
    fn test_relative_to_relative_reference_with_relative_path() {
        let rel = relative_to(Path::new("sub"), Path::new("dir/x.txt")).unwrap();
        assert_eq!(rel, PathBuf::from("dir/x.txt"));
    }

    #[test]
    fn test_relative_to_rejects_reference_itself() {
        let err = relative_to(Path::new("/app"), Path::new("/app/")).unwrap_err();
        assert!(matches!(err, BackupError::OutsideReference { .. }));
    }

    #[test]
    fn test_append_and_read_preserve_order() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join(MANIFEST_FILE_NAME);

        append(&manifest, Path::new("b.txt")).unwrap();
        append(&manifest, &PathBuf::from("dir").join("a.txt")).unwrap();

        let contents = fs::read_to_string(&manifest).unwrap();
        assert_eq!(contents, "b.txt\ndir/a.txt\n");

        let paths = read(&manifest).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("b.txt"), PathBuf::from("dir").join("a.txt")]
        );
    }

    #[test]
    fn test_read_skips_blank_lines_and_duplicates() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, "a.txt\r\n\r\nb.txt\n\na.txt\n").unwrap();

        let paths = read(&manifest).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn test_read_rejects_escaping_line() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, "ok.txt\n../outside.txt\n").unwrap();

        let err = read(&manifest).unwrap_err();
        assert!(matches!(err, BackupError::ManifestCorrupt { .. }));
    }

    #[test]
    fn test_read_rejects_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join(MANIFEST_FILE_NAME);
        fs::write(&manifest, [0x66, 0xff, 0xfe, b'\n']).unwrap();

        let err = read(&manifest).unwrap_err();
        assert!(matches!(err, BackupError::ManifestCorrupt { .. }));
    }

    #[test]
    fn test_to_line_rejects_manifest_name_at_root() {
        let err = to_line(Path::new("m"), Path::new(MANIFEST_FILE_NAME)).unwrap_err();
        assert!(matches!(err, BackupError::ManifestCorrupt { .. }));

        let nested = PathBuf::from("sub").join(MANIFEST_FILE_NAME);
        assert_eq!(
            to_line(Path::new("m"), &nested).unwrap(),
            format!("sub/{}", MANIFEST_FILE_NAME)
        );
    }

    #[test]
    fn test_to_line_rejects_line_breaks() {
        let err = to_line(Path::new("m"), Path::new("bad\nname")).unwrap_err();
        assert!(matches!(err, BackupError::ManifestCorrupt { .. }));
    }

    #[test]
    fn test_scan_legacy_skips_manifest_and_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("Plugins")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("Plugins").join("a.dll"), b"a").unwrap();
        fs::write(root.join("z.json"), b"").unwrap();
        fs::write(root.join(MANIFEST_FILE_NAME), b"").unwrap();

        let paths = scan_legacy(root).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("Plugins").join("a.dll"), PathBuf::from("z.json")]
        );
    }

    #[test]
    fn test_scan_legacy_skips_nested_manifest_names() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join(MANIFEST_FILE_NAME), b"x").unwrap();
        fs::write(root.join("sub").join("kept.txt"), b"k").unwrap();

        let paths = scan_legacy(root).unwrap();
        assert_eq!(paths, vec![PathBuf::from("sub").join("kept.txt")]);
    }
}
