//! Scan pipeline: device discovery, page capture, PDF assembly.
//!
//! All heavy lifting is delegated to external programs (`scanimage`,
//! `img2pdf`); these modules shape the requests and interpret the results.

pub mod assemble;
pub mod capture;
pub mod device;
pub mod error;

pub use assemble::assemble;
pub use capture::{capture_page, CaptureRequest, PageCapture};
pub use device::{list_devices, parse_listing, Scanner};
pub use error::{Result, ScanError};
