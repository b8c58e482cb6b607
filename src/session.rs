use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use dialoguer::{Confirm, Input};
use indicatif::ProgressBar;
use serde_json::Value;

use crate::archive;
use crate::browser::{Browser, EntryKind, Outcome, Target};
use crate::error::Result;
use crate::exiftool::ExifTool;
use crate::theme::Theme;
use crate::util::{
    backup_path, ellipsize, expand_tilde, human_size, suggest_output_path, value_to_clean_string,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The main-menu actions, dispatched through a static key/label table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Strip,
    ZipClean,
    Gps,
    Edit,
    FolderBatch,
    Export,
    CopyTags,
}

pub const MENU: &[(&str, &str, Action)] = &[
    ("1", "View metadata", Action::View),
    ("2", "Strip metadata  (privacy)", Action::Strip),
    ("3", "ZIP cleaner  —  clean archive", Action::ZipClean),
    ("4", "GPS  —  view / edit / remove", Action::Gps),
    ("5", "Edit tags", Action::Edit),
    ("6", "Folder batch  (all files)", Action::FolderBatch),
    ("7", "Export metadata  (JSON / CSV)", Action::Export),
    ("8", "Copy tags between files", Action::CopyTags),
];

impl Action {
    pub fn from_key(key: &str) -> Option<Action> {
        MENU.iter()
            .find(|(k, _, _)| *k == key)
            .map(|&(_, _, action)| action)
    }
}

/// Tags offered on the edit screen before falling back to a custom name.
const POPULAR_TAGS: &[(&str, &str)] = &[
    ("Artist", "Author / Artist"),
    ("Copyright", "Copyright notice"),
    ("Description", "Description"),
    ("Comment", "Comment"),
    ("Title", "Title"),
    ("Subject", "Subject"),
    ("Keywords", "Keywords"),
    ("Make", "Camera manufacturer"),
    ("Model", "Camera model"),
    ("Software", "Software / App"),
    ("Creator", "Creator"),
    ("DateTimeOriginal", "Original date/time"),
    ("CreateDate", "Creation date/time"),
    ("Rating", "Rating  (0–5)"),
];

/// The interactive session: one menu loop, one adapter, one theme.
/// Strictly synchronous; every external call blocks behind a spinner.
pub struct Session {
    tool: ExifTool,
    theme: Theme,
}

impl Session {
    pub fn new(tool: ExifTool, theme: Theme) -> Self {
        Self { tool, theme }
    }

    /// Runs the main menu until the user quits. Action-level errors are
    /// rendered and the loop continues; only prompt I/O failures escape.
    pub fn run(&self) -> Result<()> {
        loop {
            self.clear();
            self.header("", "");
            let version = self
                .tool
                .version()
                .unwrap_or_else(|_| "?".to_string());
            println!(
                "  {}  {}  {}\n",
                self.theme.dim(&format!("tagsweep {VERSION}")),
                self.theme.dim("·"),
                self.theme.good(&format!("ExifTool {version}"))
            );

            for (key, label, _) in MENU {
                println!("  {}  {label}", self.theme.dim(key));
            }
            println!("\n  {}  {}", self.theme.dim("q"), self.theme.dim("Quit"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_lowercase();
            if matches!(choice.as_str(), "q" | "quit" | "exit") {
                println!("\n  {}\n", self.theme.dim("Goodbye!"));
                return Ok(());
            }

            match Action::from_key(&choice) {
                Some(action) => {
                    if let Err(err) = self.dispatch(action) {
                        self.theme.err(&err.to_string());
                        self.pause()?;
                    }
                }
                None => {
                    if !choice.is_empty() {
                        self.theme
                            .err("Invalid choice — enter a number from the menu");
                        self.pause()?;
                    }
                }
            }
        }
    }

    fn dispatch(&self, action: Action) -> Result<()> {
        match action {
            Action::View => self.act_view(),
            Action::Strip => self.act_strip(),
            Action::ZipClean => self.act_zip(),
            Action::Gps => self.act_gps(),
            Action::Edit => self.act_edit(),
            Action::FolderBatch => self.act_folder(),
            Action::Export => self.act_export(),
            Action::CopyTags => self.act_copy(),
        }
    }

    // --- Prompt and rendering helpers ---

    fn clear(&self) {
        print!("\x1b[2J\x1b[H");
        let _ = io::stdout().flush();
    }

    fn header(&self, title: &str, sub: &str) {
        let mut line = format!(
            "  {}  {}",
            self.theme.accent("tagsweep").bold(),
            "—  ExifTool front-end"
        );
        if !title.is_empty() {
            line.push_str(&format!("  ·  {}", self.theme.warning(title)));
        }
        if !sub.is_empty() {
            line.push_str(&format!("  ·  {}", self.theme.dim(sub)));
        }
        println!("{line}");
        self.theme.rule();
        println!();
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::new()
            .with_prompt(format!("  {prompt}"))
            .allow_empty(true)
            .interact_text()?)
    }

    fn ask(&self, prompt: &str, default: &str) -> Result<String> {
        let input = Input::<String>::new()
            .with_prompt(format!("  {prompt}"))
            .allow_empty(true);
        let input = if default.is_empty() {
            input
        } else {
            input.default(default.to_string())
        };
        Ok(input.interact_text()?.trim().to_string())
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(format!("  {prompt}"))
            .default(default)
            .interact()?)
    }

    fn pause(&self) -> Result<()> {
        print!("  {}", self.theme.dim("Press Enter to continue..."));
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(())
    }

    /// Indeterminate "working" indicator around one blocking external call.
    fn with_spinner<T>(&self, label: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(label.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        let result = work();
        spinner.finish_and_clear();
        result
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    /// The result panel shown after every mutating operation.
    fn show_result(
        &self,
        success: bool,
        action: &str,
        input: &Path,
        output: Option<&Path>,
        backup: Option<&Path>,
        details: &str,
    ) {
        println!();
        self.theme.rule();
        let status = if success {
            format!("{}  Success", self.theme.good("✓"))
        } else {
            format!("{}  Failed", self.theme.danger("✗"))
        };
        println!("  {}  {action}", self.theme.dim("Action"));
        println!("  {}  {status}", self.theme.dim("Status"));
        println!("  {}  {}", self.theme.dim("Input "), input.display());
        if let Some(out) = output {
            if out == input {
                println!(
                    "  {}  {}  {}",
                    self.theme.dim("Output"),
                    self.theme.good(&out.display().to_string()),
                    self.theme.dim("(modified in-place)")
                );
            } else {
                println!(
                    "  {}  {}",
                    self.theme.dim("Output"),
                    self.theme.good(&out.display().to_string())
                );
            }
        }
        if let Some(backup) = backup {
            if backup.exists() {
                println!(
                    "  {}  {}",
                    self.theme.dim("Backup"),
                    self.theme.warning(&backup.display().to_string())
                );
            } else {
                println!(
                    "  {}  {}",
                    self.theme.dim("Backup"),
                    self.theme.danger("backup not found")
                );
            }
        }
        if !details.is_empty() {
            println!("  {}  {details}", self.theme.dim("Detail"));
        }
        self.theme.rule();
        println!();
    }

    // --- Browser ---

    /// Runs the interactive browser until the user picks something or
    /// cancels. Returns `None` on cancel, which aborts the calling action.
    fn browse(&self, title: &str, target: Target) -> Result<Option<PathBuf>> {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let mut browser = Browser::new(start, target);

        loop {
            self.clear();
            self.header(title, &browser.cwd().display().to_string());

            let (entries, notice) = browser.entries();
            if let Some(notice) = notice {
                self.theme.warn(&notice);
            }

            for (i, entry) in entries.iter().enumerate() {
                let index = self.theme.dim(&format!("{:>3}", i + 1));
                let label = match entry.kind {
                    EntryKind::Parent => format!("{}", self.theme.dim("../  go up")),
                    EntryKind::Dir => {
                        format!("{}/", self.theme.accent(&entry.name))
                    }
                    EntryKind::Media => {
                        let styled = if entry.name.to_lowercase().ends_with(".zip") {
                            self.theme.warning(&entry.name)
                        } else {
                            self.theme.good(&entry.name)
                        };
                        format!("{styled}  {}", self.theme.dim(&human_size(&entry.path)))
                    }
                    EntryKind::Other => format!(
                        "{}  {}",
                        self.theme.dim(&entry.name),
                        self.theme.dim(&human_size(&entry.path))
                    ),
                };
                println!("  {index}  {label}");
            }

            println!();
            if target == Target::Directory {
                println!("  {}   Select current folder", self.theme.good("s"));
            }
            println!("  {}   Enter path manually", self.theme.dim("p"));
            println!("  {}   Cancel / Back", self.theme.dim("0"));
            self.theme.rule();

            let raw = self.read_line("→")?;
            let outcome = if raw.trim().eq_ignore_ascii_case("p") {
                let typed = self.ask("Path", "")?;
                browser.accept_manual(&typed)
            } else {
                browser.handle(&raw, &entries)
            };

            match outcome {
                Outcome::Selected(path) => return Ok(Some(path)),
                Outcome::Cancelled => return Ok(None),
                Outcome::Continue { notice: Some(msg) } => {
                    self.theme.warn(&msg);
                    self.pause()?;
                }
                Outcome::Continue { notice: None } => {}
            }
        }
    }

    /// In-place vs. save-as-copy decision shared by the strip screens.
    /// Returns `None` when the user cancels.
    fn choose_output_path(&self, src: &Path, suffix: &str) -> Result<Option<PathBuf>> {
        let default_copy = suggest_output_path(src, suffix);

        println!("\n  {}", self.theme.warning("Where should the output go?"));
        println!(
            "  {}  Overwrite original  {}",
            self.theme.dim("1"),
            self.theme.dim("(modify file in-place)")
        );
        println!(
            "  {}  Save as a new copy  {}",
            self.theme.dim("2"),
            self.theme.dim("(original stays untouched)")
        );
        println!("  {}  Cancel", self.theme.dim("0"));
        self.theme.rule();

        match self.read_line("→")?.trim() {
            "0" => Ok(None),
            "1" => Ok(Some(src.to_path_buf())),
            "2" => {
                let typed = self.ask("Save copy as", &default_copy.display().to_string())?;
                let out = expand_tilde(&typed);
                if out.exists()
                    && !self.confirm(
                        &format!("{} already exists. Overwrite?", Self::file_name(&out)),
                        false,
                    )?
                {
                    self.theme.warn("Cancelled");
                    return Ok(None);
                }
                Ok(Some(out))
            }
            _ => {
                self.theme.err("Invalid choice — enter 1, 2, or 0");
                Ok(None)
            }
        }
    }

    // --- Actions ---

    fn act_view(&self) -> Result<()> {
        let Some(path) = self.browse("View metadata  —  select a file", Target::File)? else {
            return Ok(());
        };

        self.clear();
        self.header("Metadata", &Self::file_name(&path));
        let data = self.with_spinner("Reading tags...", || self.tool.read(&path))?;

        if data.is_empty() {
            self.theme.warn("No metadata found in this file");
            return self.pause();
        }

        let mut found = false;
        for (group, values) in &data {
            if group == "SourceFile" || group == "ExifToolVersion" {
                continue;
            }
            let Value::Object(values) = values else {
                continue;
            };
            if values.is_empty() {
                continue;
            }
            found = true;
            println!("  {}", self.theme.warning(group).bold());
            for (tag, value) in values {
                let text = ellipsize(&value_to_clean_string(value), 160);
                println!("    {:<28} {text}", tag.bold());
            }
            println!();
        }

        if !found {
            self.theme.warn("No tags found");
        }
        self.pause()
    }

    fn act_strip(&self) -> Result<()> {
        let Some(path) = self.browse("Strip metadata  —  select a file", Target::File)? else {
            return Ok(());
        };

        loop {
            self.clear();
            self.header("Strip metadata", &Self::file_name(&path));
            println!(
                "  {}  {}  {}",
                self.theme.dim("1"),
                self.theme.danger("Remove ALL metadata"),
                self.theme.dim("(maximum privacy)")
            );
            println!("  {}  Remove GPS data only", self.theme.dim("2"));
            println!("  {}  Remove one specific tag", self.theme.dim("3"));
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_string();
            match choice.as_str() {
                "0" => return Ok(()),
                "1" | "2" | "3" => {}
                _ => {
                    self.theme.err("Invalid choice — enter 1, 2, 3, or 0");
                    self.pause()?;
                    continue;
                }
            }

            let Some(out_path) = self.choose_output_path(&path, "_clean")? else {
                continue;
            };
            let save_as_copy = out_path != path;
            let keep_backup = if save_as_copy {
                false
            } else {
                self.confirm("Keep a backup of the original?", false)?
            };
            let backup = keep_backup.then(|| backup_path(&path));

            match choice.as_str() {
                "1" => {
                    if !self.confirm(
                        "Remove ALL tags from this file? This cannot be undone.",
                        false,
                    )? {
                        self.theme.warn("Cancelled");
                        self.pause()?;
                        continue;
                    }
                    let result = self.with_spinner("Removing all metadata...", || {
                        if save_as_copy {
                            self.tool.strip_all_to(&path, &out_path)
                        } else {
                            self.tool.strip_all(&path, keep_backup)
                        }
                    });
                    self.render_strip_result(
                        result,
                        "Remove all metadata",
                        &path,
                        &out_path,
                        backup.as_deref(),
                    );
                }
                "2" => {
                    let result = self.with_spinner("Removing GPS...", || {
                        if save_as_copy {
                            self.tool.strip_gps_to(&path, &out_path)
                        } else {
                            self.tool.strip_gps(&path, keep_backup)
                        }
                    });
                    self.render_strip_result(
                        result,
                        "Remove GPS data",
                        &path,
                        &out_path,
                        backup.as_deref(),
                    );
                }
                _ => {
                    let tag = self.ask("Tag name to remove  (e.g. Comment, Artist, Software)", "")?;
                    if tag.is_empty() {
                        self.theme.warn("No tag specified — cancelled");
                        self.pause()?;
                        continue;
                    }
                    let result = self.with_spinner(&format!("Removing {tag}..."), || {
                        if save_as_copy {
                            self.tool.strip_tag_to(&path, &out_path, &tag)
                        } else {
                            self.tool.strip_tag(&path, &tag, keep_backup)
                        }
                    });
                    self.render_strip_result(
                        result,
                        &format!("Remove tag: {tag}"),
                        &path,
                        &out_path,
                        backup.as_deref(),
                    );
                }
            }

            self.pause()?;
            return Ok(());
        }
    }

    fn render_strip_result(
        &self,
        result: Result<String>,
        action: &str,
        input: &Path,
        output: &Path,
        backup: Option<&Path>,
    ) {
        match result {
            Ok(_) => self.show_result(true, action, input, Some(output), backup, ""),
            Err(err) => {
                self.show_result(false, action, input, Some(output), None, &err.to_string())
            }
        }
    }

    fn act_gps(&self) -> Result<()> {
        let Some(path) = self.browse("GPS  —  select a file", Target::File)? else {
            return Ok(());
        };

        loop {
            self.clear();
            self.header("GPS", &Self::file_name(&path));
            println!("  {}  View GPS coordinates", self.theme.dim("1"));
            println!("  {}  Set GPS coordinates manually", self.theme.dim("2"));
            println!("  {}  Remove GPS data", self.theme.dim("3"));
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            match self.read_line("→")?.trim() {
                "0" => return Ok(()),
                "1" => self.gps_view(&path)?,
                "2" => self.gps_set(&path)?,
                "3" => self.gps_remove(&path)?,
                _ => {
                    self.theme.err("Invalid choice — enter 1, 2, 3, or 0");
                    self.pause()?;
                }
            }
        }
    }

    fn gps_view(&self, path: &Path) -> Result<()> {
        let gps = match self.with_spinner("Reading GPS...", || self.tool.read_gps(path)) {
            Ok(gps) => gps,
            Err(err) => {
                self.theme.err(&err.to_string());
                return self.pause();
            }
        };

        self.clear();
        self.header("GPS data", &Self::file_name(path));
        let text = |tag: &str| -> String {
            gps.get(tag)
                .map(value_to_clean_string)
                .unwrap_or_else(|| "—".to_string())
        };
        let lat = text("GPSLatitude");
        let lon = text("GPSLongitude");

        if lat == "—" && lon == "—" {
            self.theme.warn("No GPS data found in this file");
            return self.pause();
        }

        let lat_ref = text("GPSLatitudeRef");
        let lon_ref = text("GPSLongitudeRef");
        println!("  {:<12} {lat} {lat_ref}", "Latitude");
        println!("  {:<12} {lon} {lon_ref}", "Longitude");
        println!("  {:<12} {}", "Altitude", text("GPSAltitude"));
        println!("  {:<12} {}", "Speed", text("GPSSpeed"));
        println!("  {:<12} {}", "GPS date", text("GPSDateStamp"));
        println!("  {:<12} {}", "GPS time", text("GPSTimeStamp"));

        // Decimal link only when the values parse as plain numbers.
        let signed = |value: &str, negative_ref: &str, reference: &str| -> Option<f64> {
            let number: f64 = value.split_whitespace().next()?.parse().ok()?;
            Some(if reference == negative_ref {
                -number
            } else {
                number
            })
        };
        if let (Some(lat), Some(lon)) = (signed(&lat, "S", &lat_ref), signed(&lon, "W", &lon_ref)) {
            println!(
                "\n  {}  {}",
                self.theme.dim("Google Maps"),
                self.theme
                    .accent(&format!("https://maps.google.com/?q={lat},{lon}"))
            );
        }
        self.pause()
    }

    fn gps_set(&self, path: &Path) -> Result<()> {
        println!(
            "\n  {}",
            self.theme
                .dim("Decimal degrees. + = North/East, - = South/West")
        );
        println!(
            "  {}\n",
            self.theme.dim("Example: New York = 40.7128, -74.0060")
        );

        let lat_raw = self.ask("Latitude   (-90 to 90)", "")?;
        if lat_raw.is_empty() {
            self.theme.warn("Cancelled");
            return self.pause();
        }
        let lon_raw = self.ask("Longitude  (-180 to 180)", "")?;
        if lon_raw.is_empty() {
            self.theme.warn("Cancelled");
            return self.pause();
        }
        let (Ok(lat), Ok(lon)) = (lat_raw.parse::<f64>(), lon_raw.parse::<f64>()) else {
            self.theme.err("Invalid number format");
            return self.pause();
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            self.theme.err("Coordinates out of valid range");
            return self.pause();
        }

        let alt_raw = self.ask("Altitude in meters  (Enter to skip)", "")?;
        let alt = if alt_raw.is_empty() {
            None
        } else {
            match alt_raw.parse::<f64>() {
                Ok(alt) => Some(alt),
                Err(_) => {
                    self.theme.err("Invalid number format");
                    return self.pause();
                }
            }
        };

        let keep_backup = self.confirm("Keep a backup of the original?", false)?;
        let backup = keep_backup.then(|| backup_path(path));
        let result = self.with_spinner("Writing GPS...", || {
            self.tool.write_gps(path, lat, lon, alt, keep_backup)
        });
        let details = format!(
            "{lat}, {lon}{}",
            alt.map(|a| format!("  alt {a} m")).unwrap_or_default()
        );
        match result {
            Ok(_) => self.show_result(
                true,
                "Write GPS coordinates",
                path,
                Some(path),
                backup.as_deref(),
                &details,
            ),
            Err(err) => self.show_result(
                false,
                "Write GPS coordinates",
                path,
                Some(path),
                None,
                &err.to_string(),
            ),
        }
        self.pause()
    }

    fn gps_remove(&self, path: &Path) -> Result<()> {
        let keep_backup = self.confirm("Keep a backup of the original?", false)?;
        let backup = keep_backup.then(|| backup_path(path));
        let result =
            self.with_spinner("Removing GPS...", || self.tool.strip_gps(path, keep_backup));
        match result {
            Ok(_) => self.show_result(
                true,
                "Remove GPS data",
                path,
                Some(path),
                backup.as_deref(),
                "",
            ),
            Err(err) => self.show_result(
                false,
                "Remove GPS data",
                path,
                Some(path),
                None,
                &err.to_string(),
            ),
        }
        self.pause()
    }

    fn act_edit(&self) -> Result<()> {
        let Some(path) = self.browse("Edit tags  —  select a file", Target::File)? else {
            return Ok(());
        };

        loop {
            self.clear();
            self.header("Edit tags", &Self::file_name(&path));
            let current = self.tool.read_flat(&path).unwrap_or_default();

            println!(
                "  {:>3}  {:<20} {:<24} {}",
                self.theme.dim("#"),
                "Tag".bold(),
                self.theme.dim("Description"),
                self.theme.warning("Current")
            );
            for (i, (tag, description)) in POPULAR_TAGS.iter().enumerate() {
                let value = current
                    .get(*tag)
                    .map(value_to_clean_string)
                    .unwrap_or_default();
                let shown = if value.is_empty() {
                    format!("{}", self.theme.dim("—"))
                } else {
                    format!("{}", self.theme.warning(&ellipsize(&value, 55)))
                };
                println!(
                    "  {:>3}  {:<20} {:<24} {shown}",
                    self.theme.dim(&(i + 1).to_string()),
                    tag,
                    self.theme.dim(description)
                );
            }

            println!("\n  {}  Enter a custom tag name", self.theme.dim("c"));
            println!("  {}  Edit multiple tags at once", self.theme.dim("m"));
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_lowercase();
            let tag = match choice.as_str() {
                "0" => return Ok(()),
                "c" => {
                    let tag = self.ask("Tag name  (e.g. XMP:Description, IPTC:Keywords)", "")?;
                    if tag.is_empty() {
                        continue;
                    }
                    tag
                }
                "m" => {
                    self.edit_multi(&path)?;
                    continue;
                }
                _ => match choice.parse::<usize>() {
                    Ok(n) if (1..=POPULAR_TAGS.len()).contains(&n) => {
                        POPULAR_TAGS[n - 1].0.to_string()
                    }
                    _ => {
                        self.theme.err("Invalid choice — enter a number, c, m, or 0");
                        self.pause()?;
                        continue;
                    }
                },
            };

            if let Some(old) = current.get(&tag) {
                println!(
                    "\n  {} {}",
                    self.theme.dim("Current value:"),
                    self.theme.warning(&value_to_clean_string(old))
                );
            }
            let value = self.ask(&format!("New value for {tag}"), "")?;
            if value.is_empty() {
                self.theme.warn("Empty value — skipped");
                continue;
            }
            let keep_backup = self.confirm("Keep a backup of the original?", false)?;
            let backup = keep_backup.then(|| backup_path(&path));
            let result = self.with_spinner("Writing...", || {
                self.tool
                    .write_tags(&path, &[(tag.clone(), value.clone())], keep_backup)
            });
            match result {
                Ok(_) => self.show_result(
                    true,
                    &format!("Write tag: {tag} = {value}"),
                    &path,
                    Some(&path),
                    backup.as_deref(),
                    "",
                ),
                Err(err) => self.show_result(
                    false,
                    &format!("Write tag: {tag}"),
                    &path,
                    Some(&path),
                    None,
                    &err.to_string(),
                ),
            }
            self.pause()?;
        }
    }

    /// Collects tag/value pairs until an empty tag name, then writes them
    /// in one call.
    fn collect_tags(&self) -> Result<Vec<(String, String)>> {
        let mut tags: Vec<(String, String)> = Vec::new();
        loop {
            let tag = self.ask("Tag  (Enter to finish)", "")?;
            if tag.is_empty() {
                return Ok(tags);
            }
            let value = self.ask(&format!("Value for {tag}"), "")?;
            println!(
                "  {}  {tag} = {}",
                self.theme.good("+"),
                self.theme.warning(&value)
            );
            tags.push((tag, value));
        }
    }

    fn edit_multi(&self, path: &Path) -> Result<()> {
        self.clear();
        self.header("Edit multiple tags", &Self::file_name(path));
        println!(
            "  {}\n",
            self.theme
                .dim("Enter tags one by one. Leave tag name blank to finish.")
        );
        let tags = self.collect_tags()?;
        if tags.is_empty() {
            self.theme.warn("No tags entered — cancelled");
            return self.pause();
        }
        let keep_backup = self.confirm("Keep a backup of the original?", false)?;
        let backup = keep_backup.then(|| backup_path(path));
        let result =
            self.with_spinner("Writing...", || self.tool.write_tags(path, &tags, keep_backup));
        match result {
            Ok(_) => self.show_result(
                true,
                &format!("Write {} tag(s)", tags.len()),
                path,
                Some(path),
                backup.as_deref(),
                "",
            ),
            Err(err) => self.show_result(
                false,
                "Write tags",
                path,
                Some(path),
                None,
                &err.to_string(),
            ),
        }
        self.pause()
    }

    fn act_zip(&self) -> Result<()> {
        loop {
            self.clear();
            self.header(
                "ZIP cleaner",
                "Strip metadata from every file inside a ZIP archive",
            );
            println!("  {}", self.theme.warning("How it works:"));
            for step in [
                "1. Select a ZIP file",
                "2. Files are extracted to a temporary folder",
                "3. ExifTool strips all metadata from each file",
                "4. Files are repacked into a clean new ZIP",
                "5. Temporary folder is removed",
            ] {
                println!("  {}", self.theme.dim(&format!("  {step}")));
            }
            println!();
            println!(
                "  {}  Clean ZIP  (remove ALL metadata from every file)",
                self.theme.dim("1")
            );
            println!(
                "  {}  Inspect ZIP  (check which files have metadata)",
                self.theme.dim("2")
            );
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_string();
            match choice.as_str() {
                "0" => return Ok(()),
                "1" | "2" => {}
                _ => {
                    self.theme.err("Invalid choice — enter 1, 2, or 0");
                    self.pause()?;
                    continue;
                }
            }

            let Some(path) = self.browse("ZIP cleaner  —  select a ZIP file", Target::File)?
            else {
                continue;
            };
            if !path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("zip"))
                .unwrap_or(false)
            {
                self.theme.err("Selected file is not a ZIP archive");
                self.pause()?;
                continue;
            }

            if choice == "2" {
                self.zip_inspect(&path)?;
            } else {
                self.zip_clean(&path)?;
            }
        }
    }

    fn zip_inspect(&self, path: &Path) -> Result<()> {
        self.clear();
        self.header("ZIP: inspect metadata", &Self::file_name(path));
        let reports = match self.with_spinner("Analysing ZIP contents...", || {
            archive::inspect_zip(&self.tool, path)
        }) {
            Ok(reports) => reports,
            Err(err) => {
                self.theme.err(&err.to_string());
                return self.pause();
            }
        };

        if reports.is_empty() {
            self.theme.ok("No metadata found — archive is clean");
            return self.pause();
        }

        println!("  {:<48} {}", "File".bold(), self.theme.warning("Tags"));
        let mut total_tags = 0;
        let mut dirty = 0;
        for report in &reports {
            total_tags += report.tag_count;
            if report.tag_count > 0 {
                dirty += 1;
            }
            let count = if report.tag_count > 0 {
                self.theme.danger(&report.tag_count.to_string())
            } else {
                self.theme.good(&report.tag_count.to_string())
            };
            println!("  {:<48} {count}", report.path.display());
        }
        if dirty > 0 {
            println!(
                "\n  {}  {}",
                self.theme
                    .danger(&format!("{dirty} file(s) contain metadata")),
                self.theme.dim(&format!("(total {total_tags} tags)"))
            );
        } else {
            self.theme.ok("All files are clean");
        }
        self.pause()
    }

    fn zip_clean(&self, path: &Path) -> Result<()> {
        self.clear();
        self.header("ZIP cleaner", &Self::file_name(path));

        let file_count = match archive::entry_count(path) {
            Ok(count) => count,
            Err(err) => {
                self.theme.err(&format!("Could not open ZIP: {err}"));
                return self.pause();
            }
        };

        println!("  {}   {}", self.theme.dim("Archive:"), Self::file_name(path));
        println!("  {}   {file_count}", self.theme.dim("Files:  "));
        println!("  {}   {}", self.theme.dim("Size:   "), human_size(path));

        let default_out = suggest_output_path(path, "_clean");
        println!(
            "\n  {}",
            self.theme.warning("Where to save the cleaned ZIP?")
        );
        let typed = self.ask("Output path", &default_out.display().to_string())?;
        let out_path = expand_tilde(&typed);

        if crate::util::absolutize(&out_path) == crate::util::absolutize(path) {
            self.theme.err(
                "Output path cannot be the same as the input ZIP — choose a different filename",
            );
            return self.pause();
        }
        if out_path.exists()
            && !self.confirm(
                &format!("{} already exists. Overwrite?", Self::file_name(&out_path)),
                false,
            )?
        {
            self.theme.warn("Cancelled");
            return Ok(());
        }

        println!();
        match self.with_spinner("Stripping metadata and repacking...", || {
            archive::clean_zip(&self.tool, path, &out_path)
        }) {
            Ok(processed) => {
                let details = format!(
                    "{processed} file(s) processed  |  Output size: {}  |  Original ZIP untouched",
                    human_size(&out_path)
                );
                self.show_result(true, "ZIP cleaner", path, Some(&out_path), None, &details);
            }
            Err(err) => {
                self.show_result(
                    false,
                    "ZIP cleaner",
                    path,
                    Some(&out_path),
                    None,
                    &err.to_string(),
                );
            }
        }
        self.pause()
    }

    fn act_folder(&self) -> Result<()> {
        loop {
            self.clear();
            self.header("Folder batch", "Process all files in a directory");
            println!(
                "  {}  {} from every file",
                self.theme.dim("1"),
                self.theme.danger("Remove ALL metadata")
            );
            println!("  {}  Remove GPS from every file", self.theme.dim("2"));
            println!("  {}  Write the same tags to every file", self.theme.dim("3"));
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_string();
            match choice.as_str() {
                "0" => return Ok(()),
                "1" | "2" | "3" => {}
                _ => {
                    self.theme.err("Invalid choice — enter 1, 2, 3, or 0");
                    self.pause()?;
                    continue;
                }
            }

            let Some(folder) = self.browse("Select folder to process", Target::Directory)? else {
                continue;
            };

            let ext_raw = self.ask(
                "File extensions to include  (e.g. jpg,png — or Enter for all files)",
                "",
            )?;
            let exts: Vec<String> = ext_raw
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
            let keep_backup = self.confirm("Keep backup copies of originals?", false)?;

            let result = match choice.as_str() {
                "1" => {
                    if !self.confirm("Remove ALL metadata from ALL files in this folder?", false)? {
                        self.theme.warn("Cancelled");
                        continue;
                    }
                    self.with_spinner("Processing folder...", || {
                        self.tool.strip_dir(&folder, &exts, keep_backup)
                    })
                    .map(|out| ("Remove all metadata (folder)".to_string(), out))
                }
                "2" => self
                    .with_spinner("Removing GPS...", || {
                        self.tool.strip_gps_dir(&folder, &exts, keep_backup)
                    })
                    .map(|out| ("Remove GPS (folder)".to_string(), out)),
                _ => {
                    println!(
                        "\n  {}\n",
                        self.theme.dim("Enter tags. Leave tag name blank to finish.")
                    );
                    let tags = self.collect_tags()?;
                    if tags.is_empty() {
                        self.theme.warn("No tags entered — cancelled");
                        continue;
                    }
                    if !self.confirm(
                        &format!("Write {} tag(s) to all files in folder?", tags.len()),
                        false,
                    )? {
                        self.theme.warn("Cancelled");
                        continue;
                    }
                    self.with_spinner("Writing...", || {
                        self.tool.write_dir(&folder, &tags, &exts, keep_backup)
                    })
                    .map(|out| (format!("Write {} tag(s) (folder)", tags.len()), out))
                }
            };

            match result {
                Ok((action, out)) => {
                    let details = out.trim();
                    self.show_result(
                        true,
                        &action,
                        &folder,
                        Some(&folder),
                        None,
                        if details.is_empty() { "Done" } else { details },
                    );
                }
                Err(err) => self.show_result(
                    false,
                    "Folder batch operation",
                    &folder,
                    Some(&folder),
                    None,
                    &err.to_string(),
                ),
            }
            self.pause()?;
        }
    }

    fn act_export(&self) -> Result<()> {
        let Some(path) = self.browse("Export metadata  —  select a file", Target::File)? else {
            return Ok(());
        };

        loop {
            self.clear();
            self.header("Export metadata", &Self::file_name(&path));
            println!("  {}  Save as JSON", self.theme.dim("1"));
            println!("  {}  Save as CSV", self.theme.dim("2"));
            println!("  {}  Back to main menu", self.theme.dim("0"));
            self.theme.rule();

            let choice = self.read_line("→")?.trim().to_string();
            let suffix = match choice.as_str() {
                "0" => return Ok(()),
                "1" => "_metadata.json",
                "2" => "_metadata.csv",
                _ => {
                    self.theme.err("Invalid choice — enter 1, 2, or 0");
                    self.pause()?;
                    continue;
                }
            };

            let default_out = crate::util::absolutize(&path)
                .with_extension("")
                .display()
                .to_string()
                + suffix;
            let typed = self.ask("Save as", &default_out)?;
            let out = expand_tilde(&typed);

            let result = self.with_spinner("Exporting...", || {
                if choice == "1" {
                    self.tool.export_json(&path, &out)
                } else {
                    self.tool.export_csv(&path, &out)
                }
            });
            match result {
                Ok(()) => {
                    let details = format!("Size: {}", human_size(&out));
                    self.show_result(true, "Export metadata", &path, Some(&out), None, &details);
                }
                Err(err) => self.show_result(
                    false,
                    "Export metadata",
                    &path,
                    Some(&out),
                    None,
                    &err.to_string(),
                ),
            }
            self.pause()?;
            return Ok(());
        }
    }

    fn act_copy(&self) -> Result<()> {
        self.clear();
        self.header("Copy tags", "Transfer metadata from one file to another");
        println!(
            "  {}\n",
            self.theme
                .dim("Step 1/2  —  Select the source file (copy tags FROM)")
        );
        let Some(src) = self.browse("Source file (copy tags from)", Target::File)? else {
            return Ok(());
        };

        println!(
            "  {}\n",
            self.theme
                .dim("Step 2/2  —  Select the destination file (copy tags TO)")
        );
        let Some(dst) = self.browse("Destination file (copy tags to)", Target::File)? else {
            return Ok(());
        };

        self.clear();
        self.header("Copy tags", "");
        println!(
            "  {}  {}",
            self.theme.dim("From:"),
            self.theme.warning(&src.display().to_string())
        );
        println!(
            "  {}  {}\n",
            self.theme.dim("To:  "),
            self.theme.warning(&dst.display().to_string())
        );

        if !self.confirm("Copy metadata from source to destination?", true)? {
            self.theme.warn("Cancelled");
            return Ok(());
        }
        let keep_backup = self.confirm("Keep a backup of the destination file?", false)?;
        let backup = keep_backup.then(|| backup_path(&dst));

        let result = self.with_spinner("Copying tags...", || {
            self.tool.copy_tags_from(&src, &dst, keep_backup)
        });
        match result {
            Ok(_) => self.show_result(true, "Copy tags", &src, Some(&dst), backup.as_deref(), ""),
            Err(err) => {
                self.show_result(false, "Copy tags", &src, Some(&dst), None, &err.to_string())
            }
        }
        self.pause()
    }
}
