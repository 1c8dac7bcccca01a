//! Platform seams: the pieces of the host environment the assistant touches.
//!
//! A browser build backs these with the DOM selection API, local storage, and
//! native editing commands. Headless builds and tests use the implementations
//! in this module.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use parking_lot::Mutex;

use crate::document::EditorDocument;

/// Reports the user's current text selection.
pub trait TextSelectionProvider: Send + Sync {
    /// Byte range of the selection within the document markup. A collapsed
    /// caret is reported as `None`.
    fn selection(&self) -> Option<Range<usize>>;

    fn set_selection(&self, selection: Option<Range<usize>>);
}

/// Small string-keyed storage that survives restarts.
pub trait PersistentKeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Executes toolbar formatting commands against the editing surface.
pub trait RichTextCommandExecutor: Send + Sync {
    /// Returns whether the document changed.
    fn execute(
        &self,
        command: &ToolbarCommand,
        document: &mut EditorDocument,
        selection: Option<Range<usize>>,
    ) -> Result<bool>;
}

/// Formatting commands offered by the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    OrderedList,
    UnorderedList,
    FontName(String),
    /// Legacy 1-7 size scale used by native editing commands.
    FontSize(u8),
    Undo,
    Redo,
}

impl ToolbarCommand {
    /// The native editing command name.
    pub fn command_name(&self) -> &'static str {
        match self {
            ToolbarCommand::Bold => "bold",
            ToolbarCommand::Italic => "italic",
            ToolbarCommand::Underline => "underline",
            ToolbarCommand::Strikethrough => "strikeThrough",
            ToolbarCommand::OrderedList => "insertOrderedList",
            ToolbarCommand::UnorderedList => "insertUnorderedList",
            ToolbarCommand::FontName(_) => "fontName",
            ToolbarCommand::FontSize(_) => "fontSize",
            ToolbarCommand::Undo => "undo",
            ToolbarCommand::Redo => "redo",
        }
    }

    pub fn value(&self) -> Option<String> {
        match self {
            ToolbarCommand::FontName(name) => Some(name.clone()),
            ToolbarCommand::FontSize(size) => Some(size.to_string()),
            _ => None,
        }
    }

    /// Parse a command name as typed on the command line, e.g. `bold` or `font-size=5`.
    pub fn parse(input: &str) -> Result<Self> {
        let (name, value) = match input.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (input.trim(), None),
        };
        let command = match (name.to_ascii_lowercase().as_str(), value) {
            ("bold", None) => ToolbarCommand::Bold,
            ("italic", None) => ToolbarCommand::Italic,
            ("underline", None) => ToolbarCommand::Underline,
            ("strikethrough", None) => ToolbarCommand::Strikethrough,
            ("ordered-list", None) => ToolbarCommand::OrderedList,
            ("unordered-list", None) => ToolbarCommand::UnorderedList,
            ("undo", None) => ToolbarCommand::Undo,
            ("redo", None) => ToolbarCommand::Redo,
            ("font", Some(font)) if !font.is_empty() => ToolbarCommand::FontName(font.to_string()),
            ("font-size", Some(size)) => {
                let size: u8 = size
                    .parse()
                    .with_context(|| format!("invalid font size {size:?}"))?;
                if !(1..=7).contains(&size) {
                    bail!("font size must be between 1 and 7, got {size}");
                }
                ToolbarCommand::FontSize(size)
            }
            _ => bail!("unknown toolbar command {input:?}"),
        };
        Ok(command)
    }
}

/// A selection set explicitly by the caller.
#[derive(Debug, Default)]
pub struct ManualSelection(Mutex<Option<Range<usize>>>);

impl ManualSelection {
    pub fn new(selection: Option<Range<usize>>) -> Self {
        Self(Mutex::new(selection))
    }
}

impl TextSelectionProvider for ManualSelection {
    fn selection(&self) -> Option<Range<usize>> {
        self.0.lock().clone().filter(|range| !range.is_empty())
    }

    fn set_selection(&self, selection: Option<Range<usize>>) {
        *self.0.lock() = selection;
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore(Mutex<BTreeMap<String, String>>);

impl PersistentKeyValueStore for InMemoryKeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.0.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A key-value store persisted as a flat JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

impl PersistentKeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::debug!("stored {key:?} in {}", self.path.display());
        Ok(())
    }
}

/// Applies toolbar commands by rewriting the document markup.
#[derive(Debug, Default)]
pub struct MarkupCommandExecutor;

impl RichTextCommandExecutor for MarkupCommandExecutor {
    fn execute(
        &self,
        command: &ToolbarCommand,
        document: &mut EditorDocument,
        selection: Option<Range<usize>>,
    ) -> Result<bool> {
        let (open, close) = match command {
            ToolbarCommand::Undo => return Ok(document.undo()),
            ToolbarCommand::Redo => return Ok(document.redo()),
            ToolbarCommand::Bold => ("<b>".to_string(), "</b>"),
            ToolbarCommand::Italic => ("<i>".to_string(), "</i>"),
            ToolbarCommand::Underline => ("<u>".to_string(), "</u>"),
            ToolbarCommand::Strikethrough => ("<s>".to_string(), "</s>"),
            ToolbarCommand::OrderedList => ("<ol><li>".to_string(), "</li></ol>"),
            ToolbarCommand::UnorderedList => ("<ul><li>".to_string(), "</li></ul>"),
            ToolbarCommand::FontName(font) => (
                format!("<font face=\"{}\">", font.replace('"', "&quot;")),
                "</font>",
            ),
            ToolbarCommand::FontSize(size) => (format!("<font size=\"{size}\">"), "</font>"),
        };

        let Some(range) = selection.filter(|range| !range.is_empty()) else {
            log::debug!("{} ignored without a selection", command.command_name());
            return Ok(false);
        };
        Ok(document.wrap_range(range, &open, close))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("preferences.json"));

        assert_eq!(store.read("theme").unwrap(), None);
        store.write("theme", "dark").unwrap();
        store.write("other", "value").unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.read("theme").unwrap(), Some("dark".to_string()));
        assert_eq!(reopened.read("other").unwrap(), Some("value".to_string()));
    }

    #[test]
    fn test_manual_selection_collapsed_is_none() {
        let selection = ManualSelection::new(Some(3..3));
        assert_eq!(selection.selection(), None);
        selection.set_selection(Some(1..4));
        assert_eq!(selection.selection(), Some(1..4));
    }

    #[test]
    fn test_parse_toolbar_commands() {
        assert_eq!(ToolbarCommand::parse("Bold").unwrap(), ToolbarCommand::Bold);
        assert_eq!(
            ToolbarCommand::parse("font=Georgia").unwrap(),
            ToolbarCommand::FontName("Georgia".into())
        );
        assert_eq!(
            ToolbarCommand::parse("font-size=5").unwrap(),
            ToolbarCommand::FontSize(5)
        );
        assert!(ToolbarCommand::parse("font-size=9").is_err());
        assert!(ToolbarCommand::parse("sparkle").is_err());
    }

    #[test]
    fn test_markup_executor_wraps_selection_and_undoes() {
        let executor = MarkupCommandExecutor;
        let mut document = EditorDocument::new("plain words");

        assert!(!executor
            .execute(&ToolbarCommand::Italic, &mut document, None)
            .unwrap());
        assert!(executor
            .execute(&ToolbarCommand::Italic, &mut document, Some(6..11))
            .unwrap());
        assert_eq!(document.markup(), "plain <i>words</i>");

        assert!(executor
            .execute(&ToolbarCommand::Undo, &mut document, None)
            .unwrap());
        assert_eq!(document.markup(), "plain words");
    }
}
