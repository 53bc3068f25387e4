use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc, serde::ts_seconds};
use rand::seq::SliceRandom;
use uuid::Uuid;
use std::fmt;

use crate::core::names::extension_of;

pub type FolderId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
    Audio,
    Video,
    #[serde(other)]
    Other,
}

impl FileKind {
    pub fn name(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Document => "document",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Other => "other",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A file record. Files carry metadata only, never content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub size: String,
    pub folder: Option<FolderId>,
}

impl File {
    pub fn new(id: u64, name: &str, kind: FileKind, size: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            size: size.to_string(),
            folder: None,
        }
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub color: String,
    pub parent: Option<FolderId>,
}

impl Folder {
    pub fn new(id: &str, name: &str, color: &str, parent: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            parent: parent.map(|p| p.to_string()),
        }
    }
}

pub const FOLDER_PALETTE: [&str; 8] = [
    "blue", "green", "purple", "orange", "pink", "red", "indigo", "teal",
];

/// Cosmetic only; nothing depends on which color a folder gets.
pub fn random_color() -> String {
    FOLDER_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("blue")
        .to_string()
}

/// The live file/folder collections.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub files: Vec<File>,
    pub folders: Vec<Folder>,
}

impl EntityStore {
    pub fn new(files: Vec<File>, folders: Vec<Folder>) -> Self {
        Self { files, folders }
    }

    pub fn defaults() -> Self {
        Self {
            files: default_files(),
            folders: default_folders(),
        }
    }

    /// Folder Lookup: exact lowercase name, then exact id, then id substring.
    /// Each tier scans the whole list before the next tier is tried. A blank
    /// query is a substring of every id, so it lands on the first folder.
    pub fn find_folder(&self, query: &str) -> Option<&Folder> {
        let query = query.trim().to_lowercase();

        self.folders.iter()
            .find(|f| f.name.to_lowercase() == query)
            .or_else(|| self.folders.iter().find(|f| f.id == query))
            .or_else(|| self.folders.iter().find(|f| f.id.contains(query.as_str())))
    }

    pub fn folder_by_id(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn contains_folder_id(&self, id: &str) -> bool {
        self.folder_by_id(id).is_some()
    }

    pub fn find_file(&self, name: &str) -> Option<&File> {
        let name = name.to_lowercase();
        self.files.iter().find(|f| f.name.to_lowercase() == name)
    }

    pub fn files_in_folder(&self, folder_id: &str) -> Vec<&File> {
        self.files.iter()
            .filter(|f| f.folder.as_deref() == Some(folder_id))
            .collect()
    }

    pub fn unorganized_files(&self) -> Vec<&File> {
        self.files.iter().filter(|f| f.folder.is_none()).collect()
    }

    /// `None` yields the top-level folders.
    pub fn subfolders(&self, parent: Option<&str>) -> Vec<&Folder> {
        self.folders.iter()
            .filter(|f| f.parent.as_deref() == parent)
            .collect()
    }

    pub fn files_with_extension(&self, extension: &str) -> Vec<&File> {
        let extension = extension.to_lowercase();
        self.files.iter()
            .filter(|f| f.extension() == extension)
            .collect()
    }
}

/// Independent copy of both collections at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub files: Vec<File>,
    pub folders: Vec<Folder>,
}

impl Snapshot {
    pub fn capture(store: &EntityStore) -> Self {
        Self {
            files: store.files.clone(),
            folders: store.folders.clone(),
        }
    }

    pub fn restore(self) -> EntityStore {
        EntityStore::new(self.files, self.folders)
    }
}

fn default_files() -> Vec<File> {
    vec![
        File::new(1, "vacation.png", FileKind::Image, "2.3 MB"),
        File::new(2, "report.pdf", FileKind::Document, "450 KB"),
        File::new(3, "song.mp3", FileKind::Audio, "5.1 MB"),
        File::new(4, "presentation.pptx", FileKind::Document, "8.2 MB"),
        File::new(5, "photo1.jpg", FileKind::Image, "3.4 MB"),
        File::new(6, "video.mp4", FileKind::Video, "45 MB"),
        File::new(7, "screenshot.png", FileKind::Image, "1.2 MB"),
        File::new(8, "notes.txt", FileKind::Document, "12 KB"),
    ]
}

fn default_folders() -> Vec<Folder> {
    vec![
        Folder::new("images", "Images", "blue", None),
        Folder::new("documents", "Documents", "green", None),
        Folder::new("media", "Media", "purple", None),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    #[serde(with = "ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: &str) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: &str) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

pub const WELCOME_MESSAGE: &str = "Hi 👋 I'm your File Organizer. Try commands like:\n\
• 'move vacation.png to Images'\n\
• 'move all png files to Images'\n\
• 'create folder called Projects'\n\
• 'create folder Photos inside Media'\n\
• 'rename Images to Pictures'\n\
• 'delete Documents folder'\n\
• 'undo' to revert last action\n\
• 'reset' to restore defaults";
