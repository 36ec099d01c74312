//! Scanner discovery via the external `scanimage` program.
//!
//! `scanimage -L` prints one line per device, e.g.:
//!
//! ```text
//! device `brother5:bus1;dev4' is a Brother DS-740D USB scanner
//! ```
//!
//! Lines without a backtick-quoted device token are skipped; a token with no
//! trailing "is a ..." description yields the title "Unknown Scanner".

use std::process::Command;

use regex::Regex;
use tracing::{debug, warn};

use super::error::{Result, ScanError};

/// A physical scanner device as reported by the listing program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanner {
    /// Opaque device identifier, e.g. "brother5:bus1;dev4"
    pub device: String,
    /// Human-readable name, e.g. "Brother DS-740D USB scanner"
    pub title: String,
}

/// List available scanners by running `scanimage -L`.
///
/// A non-zero exit from the listing program is reported as an empty list
/// (no devices attached), not as an error; only a failure to spawn the
/// program at all is an error.
pub fn list_devices() -> Result<Vec<Scanner>> {
    let output = Command::new("scanimage")
        .arg("-L")
        .output()
        .map_err(|source| ScanError::Spawn {
            program: "scanimage",
            source,
        })?;

    if !output.status.success() {
        warn!(status = %output.status, "scanimage -L exited non-zero, treating as no devices");
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let scanners = parse_listing(&text);
    debug!(count = scanners.len(), "parsed scanner listing");
    Ok(scanners)
}

/// Parse the raw output of `scanimage -L` into scanner records, preserving
/// the order of appearance.
pub fn parse_listing(text: &str) -> Vec<Scanner> {
    let device_re = Regex::new("`([^']+)'").unwrap();
    let title_re = Regex::new("is a (.+)$").unwrap();

    let mut scanners = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let Some(device) = device_re.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };

        let title = title_re
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| "Unknown Scanner".to_string());

        scanners.push(Scanner {
            device: device.as_str().to_string(),
            title,
        });
    }

    scanners
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_device_line() {
        let out = "device `brother5:bus1;dev4' is a Brother DS-740D USB scanner\n";
        let scanners = parse_listing(out);
        assert_eq!(scanners.len(), 1);
        assert_eq!(scanners[0].device, "brother5:bus1;dev4");
        assert_eq!(scanners[0].title, "Brother DS-740D USB scanner");
    }

    #[test]
    fn preserves_order_of_multiple_devices() {
        let out = "\
device `epson:libusb:001:002' is a Epson GT-X770 flatbed scanner
device `brother5:bus1;dev4' is a Brother DS-740D USB scanner
";
        let scanners = parse_listing(out);
        assert_eq!(scanners.len(), 2);
        assert_eq!(scanners[0].device, "epson:libusb:001:002");
        assert_eq!(scanners[1].device, "brother5:bus1;dev4");
    }

    #[test]
    fn skips_malformed_lines_without_affecting_later_ones() {
        let out = "\
scanimage: no SANE devices found on bus 2

device `net:localhost:plustek:libusb:004:002' is a Plustek scanner
";
        let scanners = parse_listing(out);
        assert_eq!(scanners.len(), 1);
        assert_eq!(scanners[0].device, "net:localhost:plustek:libusb:004:002");
    }

    #[test]
    fn device_without_description_gets_placeholder_title() {
        let out = "device `pixma:04A91234'\n";
        let scanners = parse_listing(out);
        assert_eq!(scanners.len(), 1);
        assert_eq!(scanners[0].title, "Unknown Scanner");
    }

    #[test]
    fn empty_output_yields_empty_list() {
        assert!(parse_listing("").is_empty());
        assert!(parse_listing("\n\n  \n").is_empty());
    }
}
