//! Reading templates and their imports from a project directory.

use std::fs;
use std::path::{Path, PathBuf};

use relative_path::{RelativePath, RelativePathBuf};

use crate::source::SourceText;

pub const TEMPLATE_EXTENSION: &str = "qtml";
/// Name of the import file applied to every template in its directory and
/// below.
pub const IMPORTS_FILE: &str = "_Imports.qtml";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid project root: {0}")]
    InvalidRoot(String),
}

/// Reads a template, labelling its source with the project-relative path.
pub fn read_template(relative_path: &RelativePath, root: &Path) -> Result<SourceText, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let content = fs::read_to_string(&absolute_path)?;
    Ok(SourceText::with_path(relative_path.as_str(), &content))
}

/// Import files that apply to a template, least specific first: the
/// project root's, then each directory's down to the template's own.
pub fn import_paths_for(relative_path: &RelativePath) -> Vec<RelativePathBuf> {
    let mut directories = Vec::new();
    let mut current = relative_path.parent();
    while let Some(directory) = current {
        directories.push(directory.join(IMPORTS_FILE));
        current = directory.parent();
    }
    directories.reverse();
    directories
}

/// The import texts that exist for a template, least specific first.
pub fn read_imports(relative_path: &RelativePath, root: &Path) -> Result<Vec<SourceText>, IoError> {
    let mut imports = Vec::new();
    for import in import_paths_for(relative_path) {
        if import.to_path(root).is_file() {
            imports.push(read_template(&import, root)?);
        }
    }
    Ok(imports)
}

/// All templates under `root`, sorted, excluding import files.
pub fn scan_templates(root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !root.is_dir() {
        return Err(IoError::InvalidRoot(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let mut files = Vec::new();
    scan_directory_recursive(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == TEMPLATE_EXTENSION
            && path.file_name().is_some_and(|name| name != IMPORTS_FILE)
        {
            files.push(path);
        }
    }
    Ok(())
}
