use std::process::ExitCode;

use env_logger::Env;

use tagsweep::{ExifTool, Session, TagSweepError, Theme};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let tool = match ExifTool::new() {
        Ok(tool) => tool,
        Err(TagSweepError::ToolNotFound) => {
            eprintln!("error: exiftool was not found on PATH");
            eprintln!();
            eprintln!("Install it first:");
            eprintln!("  Debian/Ubuntu   sudo apt install libimage-exiftool-perl");
            eprintln!("  Fedora          sudo dnf install perl-Image-ExifTool");
            eprintln!("  macOS           brew install exiftool");
            eprintln!("  Windows         https://exiftool.org  (rename to exiftool.exe)");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("error: could not start exiftool: {err}");
            return ExitCode::FAILURE;
        }
    };

    match Session::new(tool, Theme::default()).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
