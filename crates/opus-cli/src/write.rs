use crate::error::{GenerateError, GenerateResult};
use std::path::{Path, PathBuf};

/// Create `path` with `content`. Never replaces an existing file.
///
/// `display` is the project-relative path used in errors.
pub fn write_new(path: &Path, display: &Path, content: &str) -> GenerateResult<()> {
    if path.exists() {
        return Err(GenerateError::DestinationExists(display.to_path_buf()));
    }
    write_atomic(path, content)?;
    let shown = display.display();
    tracing::info!(path = %shown, "wrote file");
    Ok(())
}

fn write_atomic(path: &Path, content: &str) -> GenerateResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| GenerateError::io(parent, e))?;
        }
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content).map_err(|e| GenerateError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| GenerateError::io(path, e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_parents_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src/models/customer.rs");

        write_new(&path, Path::new("src/models/customer.rs"), "struct A;").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "struct A;");
        assert!(!dir.path().join("src/models/customer.rs.tmp").exists());
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.rs");
        std::fs::write(&path, "old").unwrap();

        let err = write_new(&path, Path::new("a.rs"), "new").unwrap_err();
        assert!(matches!(err, GenerateError::DestinationExists(p) if p == Path::new("a.rs")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }
}
