//! scanflow — terminal wizard for multi-page document scanning.
//!
//! Discovers scanners through the external `scanimage` program, walks the
//! user through a capture job (save folder, page count, duplex mode),
//! captures pages one at a time, and assembles the page images into a
//! single PDF via `img2pdf`.

pub mod config;
pub mod scan;
pub mod tui;
