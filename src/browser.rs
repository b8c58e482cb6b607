use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::util::expand_tilde;

/// Extensions shown in the "recognized media" bucket of the browser.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "heic", "heif", "gif", "bmp", "webp", "raw", "cr2",
    "cr3", "nef", "arw", "dng", "orf", "rw2", "pef", "mp4", "mov", "avi", "mkv", "m4v", "3gp",
    "wmv", "mp3", "flac", "m4a", "wav", "aac", "ogg", "pdf", "docx", "xlsx", "pptx", "zip",
];

/// What the calling action wants the user to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The synthetic `../` row, always first.
    Parent,
    Dir,
    Media,
    Other,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// One navigation step's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected(PathBuf),
    Cancelled,
    /// Stay in the browser; `notice` is a warning to show before re-rendering.
    Continue { notice: Option<String> },
}

pub fn is_media(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            MEDIA_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Lists one directory level in display order: the parent link, then
/// subdirectories (case-insensitive, hidden ones skipped), then media
/// files, then everything else.
pub fn list_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut dirs = Vec::new();
    let mut media = Vec::new();
    let mut other = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Follows symlinks; unreadable entries are simply not listed.
        let Ok(meta) = fs::metadata(entry.path()) else {
            continue;
        };
        if meta.is_dir() {
            if name.starts_with('.') {
                continue;
            }
            dirs.push(Entry {
                path: entry.path(),
                kind: EntryKind::Dir,
                name,
            });
        } else if is_media(&entry.path()) {
            media.push(Entry {
                path: entry.path(),
                kind: EntryKind::Media,
                name,
            });
        } else {
            other.push(Entry {
                path: entry.path(),
                kind: EntryKind::Other,
                name,
            });
        }
    }

    let by_name = |a: &Entry, b: &Entry| a.name.to_lowercase().cmp(&b.name.to_lowercase());
    dirs.sort_by(by_name);
    media.sort_by(by_name);
    other.sort_by(by_name);

    let mut entries = vec![Entry {
        name: "..".to_string(),
        path: dir.parent().unwrap_or(dir).to_path_buf(),
        kind: EntryKind::Parent,
    }];
    entries.extend(dirs);
    entries.extend(media);
    entries.extend(other);
    Ok(entries)
}

/// Browser state: the current directory plus what kind of selection the
/// caller is waiting for. Rendering and raw input live in the session;
/// every transition goes through [`Browser::handle`] so it stays testable.
#[derive(Debug)]
pub struct Browser {
    cwd: PathBuf,
    target: Target,
}

impl Browser {
    pub fn new(start: impl Into<PathBuf>, target: Target) -> Self {
        Self {
            cwd: start.into(),
            target,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Lists the current directory. A listing failure (permission denied,
    /// directory vanished) ascends to the parent and retries instead of
    /// failing the browse session.
    pub fn entries(&mut self) -> (Vec<Entry>, Option<String>) {
        let mut notice = None;
        loop {
            match list_entries(&self.cwd) {
                Ok(entries) => return (entries, notice),
                Err(err) => match self.cwd.parent() {
                    Some(parent) => {
                        log::warn!("cannot list {}: {err}", self.cwd.display());
                        notice = Some(format!("Cannot open {}: {err}", self.cwd.display()));
                        self.cwd = parent.to_path_buf();
                    }
                    None => return (Vec::new(), Some(format!("Cannot list root: {err}"))),
                },
            }
        }
    }

    /// Applies one line of user input against the currently displayed
    /// entries. `p` (manual path) is handled by the caller via
    /// [`Browser::accept_manual`] since it needs a follow-up prompt.
    pub fn handle(&mut self, input: &str, entries: &[Entry]) -> Outcome {
        let input = input.trim();
        if input == "0" {
            return Outcome::Cancelled;
        }
        if input.eq_ignore_ascii_case("s") {
            if self.target == Target::Directory {
                return Outcome::Selected(self.cwd.clone());
            }
            return Outcome::Continue {
                notice: Some("A file is expected here, not a folder".to_string()),
            };
        }

        let index = match input.parse::<usize>() {
            Ok(n) if (1..=entries.len()).contains(&n) => n - 1,
            _ => {
                return Outcome::Continue {
                    notice: Some("Enter a number from the list, or 0 to cancel".to_string()),
                }
            }
        };

        let entry = &entries[index];
        match entry.kind {
            EntryKind::Parent => match self.cwd.parent() {
                Some(parent) => {
                    self.cwd = parent.to_path_buf();
                    Outcome::Continue { notice: None }
                }
                None => Outcome::Continue {
                    notice: Some("Already at the filesystem root".to_string()),
                },
            },
            EntryKind::Dir => {
                self.cwd = entry.path.clone();
                Outcome::Continue { notice: None }
            }
            EntryKind::Media | EntryKind::Other => {
                if self.target == Target::Directory {
                    Outcome::Continue {
                        notice: Some(
                            "That is a file, not a folder — use s to select the current folder"
                                .to_string(),
                        ),
                    }
                } else {
                    Outcome::Selected(entry.path.clone())
                }
            }
        }
    }

    /// Validates a manually typed path against the expected target type.
    pub fn accept_manual(&self, raw: &str) -> Outcome {
        let path = expand_tilde(raw.trim());
        let valid = match self.target {
            Target::File => path.is_file(),
            Target::Directory => path.is_dir(),
        };
        if valid {
            Outcome::Selected(path)
        } else {
            Outcome::Continue {
                notice: Some("Path not found or wrong type".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Berlin")).unwrap();
        fs::create_dir(dir.path().join("amsterdam")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        File::create(dir.path().join("photo.JPG")).unwrap();
        File::create(dir.path().join("archive.zip")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        dir
    }

    #[test]
    fn entries_are_bucketed_and_sorted() {
        let dir = sample_tree();
        let entries = list_entries(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["..", "amsterdam", "Berlin", "archive.zip", "photo.JPG", "notes.txt"]
        );
        assert_eq!(entries[0].kind, EntryKind::Parent);
        assert_eq!(entries[3].kind, EntryKind::Media);
        assert_eq!(entries[5].kind, EntryKind::Other);
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = sample_tree();
        let entries = list_entries(dir.path()).unwrap();
        assert!(entries.iter().all(|e| e.name != ".git"));
    }

    #[test]
    fn media_matching_is_case_insensitive_on_extension() {
        assert!(is_media(Path::new("x.JPG")));
        assert!(is_media(Path::new("x.cr2")));
        assert!(is_media(Path::new("x.zip")));
        assert!(!is_media(Path::new("x.txt")));
        assert!(!is_media(Path::new("noext")));
    }

    #[test]
    fn going_up_at_the_root_is_a_noop() {
        let mut browser = Browser::new(PathBuf::from("/"), Target::File);
        let entries = vec![Entry {
            name: "..".to_string(),
            path: PathBuf::from("/"),
            kind: EntryKind::Parent,
        }];
        let outcome = browser.handle("1", &entries);
        assert_matches::assert_matches!(outcome, Outcome::Continue { notice: Some(_) });
        assert_eq!(browser.cwd(), Path::new("/"));
    }

    #[test]
    fn selecting_a_file_when_a_directory_is_wanted_does_not_advance() {
        let dir = sample_tree();
        let mut browser = Browser::new(dir.path(), Target::Directory);
        let (entries, _) = browser.entries();
        let file_index = entries
            .iter()
            .position(|e| e.kind == EntryKind::Media)
            .unwrap();
        let outcome = browser.handle(&(file_index + 1).to_string(), &entries);
        assert_matches::assert_matches!(outcome, Outcome::Continue { notice: Some(_) });
        assert_eq!(browser.cwd(), dir.path());

        // `s` selects the directory itself.
        let outcome = browser.handle("s", &entries);
        assert_eq!(outcome, Outcome::Selected(dir.path().to_path_buf()));
    }

    #[test]
    fn select_current_requires_directory_target() {
        let dir = sample_tree();
        let mut browser = Browser::new(dir.path(), Target::File);
        let (entries, _) = browser.entries();
        let outcome = browser.handle("s", &entries);
        assert_matches::assert_matches!(outcome, Outcome::Continue { notice: Some(_) });
    }

    #[test]
    fn descending_into_a_directory_updates_cwd() {
        let dir = sample_tree();
        let mut browser = Browser::new(dir.path(), Target::File);
        let (entries, _) = browser.entries();
        let outcome = browser.handle("2", &entries); // "amsterdam"
        assert_eq!(outcome, Outcome::Continue { notice: None });
        assert_eq!(browser.cwd(), dir.path().join("amsterdam"));
    }

    #[test]
    fn out_of_range_input_warns_without_moving() {
        let dir = sample_tree();
        let mut browser = Browser::new(dir.path(), Target::File);
        let (entries, _) = browser.entries();
        for input in ["99", "-1", "x", ""] {
            let outcome = browser.handle(input, &entries);
            assert_matches::assert_matches!(outcome, Outcome::Continue { notice: Some(_) });
        }
        assert_eq!(browser.cwd(), dir.path());
    }

    #[test]
    fn cancel_returns_no_selection() {
        let dir = sample_tree();
        let mut browser = Browser::new(dir.path(), Target::File);
        let (entries, _) = browser.entries();
        assert_eq!(browser.handle("0", &entries), Outcome::Cancelled);
    }

    #[test]
    fn manual_path_is_validated_against_target_type() {
        let dir = sample_tree();
        let file = dir.path().join("photo.JPG");

        let browser = Browser::new(dir.path(), Target::File);
        assert_eq!(
            browser.accept_manual(&file.display().to_string()),
            Outcome::Selected(file.clone())
        );

        let browser = Browser::new(dir.path(), Target::Directory);
        assert_matches::assert_matches!(
            browser.accept_manual(&file.display().to_string()),
            Outcome::Continue { notice: Some(_) }
        );
        assert_eq!(
            browser.accept_manual(&dir.path().display().to_string()),
            Outcome::Selected(dir.path().to_path_buf())
        );
    }

    #[test]
    fn unreadable_directory_falls_back_to_parent() {
        let dir = sample_tree();
        let missing = dir.path().join("gone");
        let mut browser = Browser::new(&missing, Target::File);
        let (entries, notice) = browser.entries();
        assert!(notice.is_some());
        assert_eq!(browser.cwd(), dir.path());
        assert!(!entries.is_empty());
    }
}
