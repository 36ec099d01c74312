//! Assembly of captured page images into a single PDF.
//!
//! Delegates the actual encoding to the external `img2pdf` program. Page
//! images are zero-padded (`page_001.png`, `page_001_A.png`, ...) so a plain
//! lexicographic sort reproduces capture order.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::error::{Result, ScanError};

/// Assemble all page images in `image_dir` into one PDF.
///
/// On success the PDF is moved up next to `image_dir` (named after it) and
/// the now-empty image directory is removed best-effort. On converter
/// failure the directory and its images are left untouched so the raw pages
/// stay available for manual recovery.
pub fn assemble(image_dir: &Path) -> Result<PathBuf> {
    let images = page_images(image_dir)?;
    if images.is_empty() {
        return Err(ScanError::NoImages(image_dir.to_path_buf()));
    }

    let dir_name = image_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "scan".to_string());
    let pdf_name = format!("{}.pdf", dir_name);

    info!(pages = images.len(), pdf = %pdf_name, "assembling PDF");

    // Relative file names with cwd set to the image directory.
    let output = Command::new("img2pdf")
        .args(&images)
        .arg("-o")
        .arg(&pdf_name)
        .current_dir(image_dir)
        .output()
        .map_err(|source| ScanError::Spawn {
            program: "img2pdf",
            source,
        })?;

    if !output.status.success() {
        let mut detail = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !detail.trim().is_empty() {
                detail.push('\n');
            }
            detail.push_str(&stderr);
        }
        return Err(ScanError::Convert(format!("{} - {}", output.status, detail)));
    }

    // Move the PDF out of the capture directory, then drop the directory.
    let produced = image_dir.join(&pdf_name);
    let dest = match image_dir.parent() {
        Some(parent) => parent.join(&pdf_name),
        None => produced.clone(),
    };
    if dest != produced {
        fs::rename(&produced, &dest)?;
        if let Err(err) = fs::remove_dir_all(image_dir) {
            warn!(dir = %image_dir.display(), error = %err, "could not remove capture directory");
        }
    }

    Ok(dest)
}

/// Page-image file names in `dir` matching the capture naming convention,
/// sorted lexicographically (equals page order for zero-padded names).
fn page_images(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("page_") && name.ends_with(".png"))
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"png").unwrap();
    }

    #[test]
    fn empty_directory_fails_before_any_subprocess_call() {
        let dir = tempfile::tempdir().unwrap();
        let err = assemble(dir.path()).unwrap_err();
        assert!(matches!(err, ScanError::NoImages(_)));
        // Nothing created, nothing removed.
        assert!(dir.path().exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn page_images_sort_in_numeric_page_order() {
        let dir = tempfile::tempdir().unwrap();
        // Create out of order; 10 pages exercise the padding.
        for page in [10, 2, 1, 9, 3, 7, 5, 4, 8, 6] {
            touch(dir.path(), &format!("page_{:03}.png", page));
        }
        let names = page_images(dir.path()).unwrap();
        let expected: Vec<String> = (1..=10).map(|p| format!("page_{:03}.png", p)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn duplex_sides_sort_within_their_page() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "page_002_A.png");
        touch(dir.path(), "page_001_B.png");
        touch(dir.path(), "page_001_A.png");
        let names = page_images(dir.path()).unwrap();
        assert_eq!(names, ["page_001_A.png", "page_001_B.png", "page_002_A.png"]);
    }

    #[test]
    fn page_images_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "page_001.png");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "page_002.jpeg");
        let names = page_images(dir.path()).unwrap();
        assert_eq!(names, ["page_001.png"]);
    }
}
