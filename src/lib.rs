//! Interactive terminal front-end for the ExifTool binary.
//!
//! The crate wraps a system-installed `exiftool` in a thin subprocess
//! adapter ([`ExifTool`]) and layers a menu-driven session on top:
//! viewing, editing, stripping, copying and exporting metadata, plus a
//! ZIP pipeline that strips every file inside an archive without
//! touching the original.
//!
//! The adapter and the pure pieces (archive handling, CSV/JSON export,
//! browser transitions) are usable as a library; [`Session`] is the
//! terminal UI the binary runs.

pub mod archive;
pub mod browser;
pub mod error;
pub mod exiftool;
pub mod export;
pub mod session;
pub mod theme;
mod util;

pub use error::{Result, TagSweepError};
pub use exiftool::{ExifTool, TagSet};
pub use session::Session;
pub use theme::Theme;
