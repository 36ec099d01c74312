//! Single-page capture against a chosen scanner device.
//!
//! One call captures exactly one logical page. In duplex mode the scanner
//! emits one image per physical side; the side files are captured into a
//! per-page scratch directory and renamed to `page_<NNN>_<side>.png`
//! (side A = front, B = back) so a later lexicographic sort reproduces
//! capture order. A failed capture is never retried; the caller stops the
//! job on the first failure.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::error::{Result, ScanError};

const RESOLUTION_DPI: u32 = 600;
const SIMPLEX_SOURCE: &str = "Automatic Document Feeder(left aligned)";
const DUPLEX_SOURCE: &str = "Automatic Document Feeder(left aligned,Duplex)";

/// One page-capture request.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// Scanner device identifier
    pub device: String,
    /// Job output directory (already created by the controller)
    pub output_dir: PathBuf,
    /// Capture both sides of the sheet
    pub duplex: bool,
    /// 1-based logical page number
    pub page: u32,
}

/// Files produced by one successful page capture. The paths exist on disk
/// before this value is returned.
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub page: u32,
    pub files: Vec<PathBuf>,
}

/// File name for a simplex page image: `page_001.png`.
pub fn page_file_name(page: u32) -> String {
    format!("page_{:03}.png", page)
}

/// File name for one side of a duplex page: `page_001_A.png`.
/// Sides are lettered in emission order (A = front, B = back).
pub fn side_file_name(page: u32, side_index: usize) -> String {
    let side = (b'A' + side_index as u8) as char;
    format!("page_{:03}_{}.png", page, side)
}

/// Capture a single page. Blocks until the scan subprocess finishes.
pub fn capture_page(req: &CaptureRequest) -> Result<PageCapture> {
    info!(page = req.page, duplex = req.duplex, "capturing page");
    if req.duplex {
        capture_duplex(req)
    } else {
        capture_simplex(req)
    }
}

fn capture_simplex(req: &CaptureRequest) -> Result<PageCapture> {
    let output_file = req.output_dir.join(page_file_name(req.page));

    let output = Command::new("scanimage")
        .arg(format!("--device-name={}", req.device))
        .arg("--format=png")
        .arg(format!("--output-file={}", output_file.display()))
        .arg(format!("--resolution={}", RESOLUTION_DPI))
        .arg(format!("--source={}", SIMPLEX_SOURCE))
        .arg("--AutoDeskew=yes")
        .arg("--AutoDocumentSize=yes")
        .output()
        .map_err(|source| ScanError::Spawn {
            program: "scanimage",
            source,
        })?;

    if !output.status.success() {
        return Err(ScanError::Capture {
            page: req.page,
            detail: format!("{} - {}", output.status, combined_output(&output)),
        });
    }

    if !output_file.exists() {
        return Err(ScanError::NoOutput { page: req.page });
    }

    Ok(PageCapture {
        page: req.page,
        files: vec![output_file],
    })
}

fn capture_duplex(req: &CaptureRequest) -> Result<PageCapture> {
    // Per-page scratch directory: batch output lands here, so leftovers from
    // any earlier attempt can never be mistaken for this page's sides.
    let scratch = req.output_dir.join(format!(".page_{:03}", req.page));
    fs::create_dir_all(&scratch)?;

    let batch_pattern = scratch.join("side_%03d.png");
    let output = Command::new("scanimage")
        .arg(format!("--device-name={}", req.device))
        .arg("--format=png")
        .arg(format!("--batch={}", batch_pattern.display()))
        .arg("--batch-count=2")
        .arg(format!("--resolution={}", RESOLUTION_DPI))
        .arg(format!("--source={}", DUPLEX_SOURCE))
        .arg("--AutoDeskew=yes")
        .arg("--AutoDocumentSize=yes")
        .output()
        .map_err(|source| ScanError::Spawn {
            program: "scanimage",
            source,
        })?;

    // Batch mode exits non-zero when the feeder runs out mid-batch. The
    // emitted side files are the source of truth: zero files is a failure
    // regardless of exit status, one file (blank back) is tolerated.
    if !output.status.success() {
        warn!(
            page = req.page,
            status = %output.status,
            "duplex batch exited non-zero, checking emitted files"
        );
    }

    let files = finalize_duplex_sides(&scratch, &req.output_dir, req.page)?;
    if files.is_empty() {
        // Keep diagnostics from the subprocess; a clean exit with no files
        // still means the page was not captured.
        let detail = combined_output(&output);
        if detail.trim().is_empty() {
            return Err(ScanError::NoOutput { page: req.page });
        }
        return Err(ScanError::Capture {
            page: req.page,
            detail: format!("no side images produced - {}", detail),
        });
    }

    Ok(PageCapture {
        page: req.page,
        files,
    })
}

/// Move emitted side files out of the scratch directory into the job output
/// directory under their deterministic names, then drop the scratch
/// directory (best-effort). Returns the renamed paths in side order.
fn finalize_duplex_sides(scratch: &Path, output_dir: &Path, page: u32) -> Result<Vec<PathBuf>> {
    let mut sides: Vec<PathBuf> = fs::read_dir(scratch)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    sides.sort();

    let mut renamed = Vec::with_capacity(sides.len());
    for (i, side) in sides.iter().enumerate() {
        let dest = output_dir.join(side_file_name(page, i));
        fs::rename(side, &dest)?;
        renamed.push(dest);
    }

    if let Err(err) = fs::remove_dir_all(scratch) {
        warn!(page, error = %err, "could not remove scratch directory");
    }

    Ok(renamed)
}

fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.trim().is_empty() {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    text
}
