//! Filesystem steps of the static build

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::BuildError;

/// Remove a file or directory tree; a missing path is not an error
pub fn remove_path(path: &Path) -> Result<(), BuildError> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            tracing::info!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::Io(e)),
    }
}

/// Move every immediate child of `clone_dir` into a new `output_dir`
///
/// The output directory must not exist yet. An entry named like the output
/// directory is never moved, so an output inside the clone directory is not
/// moved into itself. Returns the moved entry names.
pub fn move_into_output(clone_dir: &Path, output_dir: &Path) -> Result<Vec<OsString>, BuildError> {
    tracing::info!("Moving files to {}", output_dir.display());

    fs::create_dir(output_dir).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => BuildError::OutputDirExists {
            path: output_dir.display().to_string(),
        },
        _ => BuildError::Io(e),
    })?;

    let output_name = output_dir.file_name();

    // Snapshot first; the directory is modified while moving
    let entries = fs::read_dir(clone_dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut moved = Vec::with_capacity(entries.len());
    for name in entries {
        if Some(name.as_os_str()) == output_name {
            continue;
        }
        move_entry(&clone_dir.join(&name), &output_dir.join(&name))?;
        moved.push(name);
    }

    tracing::debug!("Moved {} entries into {}", moved.len(), output_dir.display());
    Ok(moved)
}

/// Rename, falling back to copy and remove across filesystems
fn move_entry(from: &Path, to: &Path) -> Result<(), BuildError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!("Copying {} across filesystems", from.display());
            copy_tree(from, to)?;
            remove_path(from)
        }
        Err(e) => Err(BuildError::Io(e)),
    }
}

/// Copy a file, symlink or directory tree; links are recreated, not followed
fn copy_tree(from: &Path, to: &Path) -> Result<(), BuildError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| BuildError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| BuildError::Io(std::io::Error::other(e)))?;
        let target = if relative.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_moves_children_but_not_output_dir() {
        let dir = TempDir::new().unwrap();
        let clone = dir.path();
        fs::write(clone.join("a.txt"), "a").unwrap();
        fs::create_dir(clone.join("b")).unwrap();
        fs::write(clone.join("b").join("nested.txt"), "n").unwrap();
        let output = clone.join("_site");

        let mut moved = move_into_output(clone, &output).unwrap();
        moved.sort();

        assert_eq!(moved, vec![OsString::from("a.txt"), OsString::from("b")]);
        assert!(output.join("a.txt").is_file());
        assert!(output.join("b").join("nested.txt").is_file());
        assert!(!output.join("_site").exists());
        assert!(!clone.join("a.txt").exists());
    }

    #[test]
    fn test_existing_output_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();
        let output = dir.path().join("_site");
        fs::create_dir(&output).unwrap();

        let err = move_into_output(dir.path(), &output).unwrap_err();

        assert!(matches!(err, BuildError::OutputDirExists { .. }));
        // Nothing moved
        assert!(dir.path().join("index.html").exists());
    }

    #[test]
    fn test_output_outside_clone_dir() {
        let clone = TempDir::new().unwrap();
        let out_root = TempDir::new().unwrap();
        fs::write(clone.path().join("index.html"), "<html>").unwrap();
        let output = out_root.path().join("site");

        let moved = move_into_output(clone.path(), &output).unwrap();

        assert_eq!(moved, vec![OsString::from("index.html")]);
        assert!(output.join("index.html").exists());
    }

    #[test]
    fn test_similar_names_are_still_moved() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_site.bak"), "").unwrap();
        fs::write(dir.path().join("_sit"), "").unwrap();
        let output = dir.path().join("_site");

        let mut moved = move_into_output(dir.path(), &output).unwrap();
        moved.sort();

        assert_eq!(moved, vec![OsString::from("_sit"), OsString::from("_site.bak")]);
    }

    #[test]
    fn test_copy_tree_keeps_structure() {
        let src = TempDir::new().unwrap();
        let dst_root = TempDir::new().unwrap();
        let tree = src.path().join("assets");
        fs::create_dir_all(tree.join("css").join("vendor")).unwrap();
        fs::write(tree.join("css").join("site.css"), "body {}").unwrap();
        fs::write(tree.join("css").join("vendor").join("x.css"), "x").unwrap();
        fs::create_dir(tree.join("empty")).unwrap();
        let dst = dst_root.path().join("assets");

        copy_tree(&tree, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("css").join("site.css")).unwrap(), "body {}");
        assert!(dst.join("css").join("vendor").join("x.css").is_file());
        assert!(dst.join("empty").is_dir());
        assert!(tree.exists());
    }

    #[test]
    fn test_copy_tree_single_file() {
        let src = TempDir::new().unwrap();
        let dst_root = TempDir::new().unwrap();
        fs::write(src.path().join("index.html"), "<html>").unwrap();
        let dst = dst_root.path().join("index.html");

        copy_tree(&src.path().join("index.html"), &dst).unwrap();

        assert_eq!(fs::read_to_string(dst).unwrap(), "<html>");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_recreates_symlinks() {
        let src = TempDir::new().unwrap();
        let dst_root = TempDir::new().unwrap();
        let tree = src.path().join("site");
        fs::create_dir(&tree).unwrap();
        fs::write(tree.join("real.html"), "r").unwrap();
        std::os::unix::fs::symlink("real.html", tree.join("link.html")).unwrap();
        let dst = dst_root.path().join("site");

        copy_tree(&tree, &dst).unwrap();

        assert_eq!(
            fs::read_link(dst.join("link.html")).unwrap(),
            Path::new("real.html")
        );
    }

    #[test]
    fn test_move_entry_removes_source() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src").join("inner")).unwrap();
        fs::write(dir.path().join("src").join("inner").join("f"), "f").unwrap();

        move_entry(&dir.path().join("src"), &dir.path().join("dst")).unwrap();

        assert!(!dir.path().join("src").exists());
        assert!(dir.path().join("dst").join("inner").join("f").is_file());
    }

    #[test]
    fn test_remove_path() {
        let dir = TempDir::new().unwrap();
        let git = dir.path().join(".git");
        fs::create_dir_all(git.join("objects")).unwrap();
        fs::write(git.join("HEAD"), "ref: refs/heads/main").unwrap();

        remove_path(&git).unwrap();
        assert!(!git.exists());

        // Already gone
        remove_path(&git).unwrap();
    }
}
