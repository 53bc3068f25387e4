use std::sync::LazyLock;
use regex::{Captures, Regex};
use tracing::debug;

use crate::core::names::{fix_name, slugify};
use crate::core::types::{EntityStore, Folder, FolderId};

pub const HELP_MESSAGE: &str = "I couldn't understand that command. Try:\n\
• 'move vacation.png to Images'\n\
• 'move all png files to Images'\n\
• 'create folder called Projects'\n\
• 'rename Images to Pictures'\n\
• 'delete Documents folder'";

pub const EMPTY_FOLDER_NAME: &str = "A folder name can't be empty.";

/// Where a move lands. A placeholder only becomes a real folder if the
/// intent reaches the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetFolder {
    Existing { id: FolderId, name: String },
    Placeholder { id: FolderId, name: String },
}

impl TargetFolder {
    fn resolve(store: &EntityStore, query: &str) -> Self {
        match store.find_folder(query) {
            Some(folder) => TargetFolder::Existing {
                id: folder.id.clone(),
                name: folder.name.clone(),
            },
            None => TargetFolder::Placeholder {
                id: slugify(query),
                name: fix_name(query),
            },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            TargetFolder::Existing { id, .. } | TargetFolder::Placeholder { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TargetFolder::Existing { name, .. } | TargetFolder::Placeholder { name, .. } => name,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, TargetFolder::Placeholder { .. })
    }
}

/// One recognised command. The summary is decided here so that lookup
/// failures never reach the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Undo,
    Reset,
    Info {
        summary: String,
    },
    List {
        summary: String,
    },
    OpenFolder {
        folder_id: FolderId,
        summary: String,
    },
    RenameFolder {
        folder_id: FolderId,
        old_name: String,
        new_name: String,
        summary: String,
    },
    DeleteFolder {
        folder_id: FolderId,
        folder_name: String,
        summary: String,
    },
    CreateNestedFolder {
        name: String,
        parent_id: FolderId,
        parent_name: String,
        summary: String,
    },
    CreateFolder {
        name: String,
        summary: String,
    },
    MoveAllByExtension {
        extension: String,
        file_names: Vec<String>,
        target: TargetFolder,
        summary: String,
    },
    MoveFile {
        file_name: String,
        target: TargetFolder,
        summary: String,
    },
}

impl Intent {
    fn info(summary: String) -> Self {
        Intent::Info { summary }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Intent::Undo => "undo",
            Intent::Reset => "reset",
            Intent::Info { .. } => "info",
            Intent::List { .. } => "list",
            Intent::OpenFolder { .. } => "open_folder",
            Intent::RenameFolder { .. } => "rename_folder",
            Intent::DeleteFolder { .. } => "delete_folder",
            Intent::CreateNestedFolder { .. } => "create_nested_folder",
            Intent::CreateFolder { .. } => "create_simple_folder",
            Intent::MoveAllByExtension { .. } => "move_all_by_extension",
            Intent::MoveFile { .. } => "move_file",
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Intent::Undo | Intent::Reset => None,
            Intent::Info { summary }
            | Intent::List { summary }
            | Intent::OpenFolder { summary, .. }
            | Intent::RenameFolder { summary, .. }
            | Intent::DeleteFolder { summary, .. }
            | Intent::CreateNestedFolder { summary, .. }
            | Intent::CreateFolder { summary, .. }
            | Intent::MoveAllByExtension { summary, .. }
            | Intent::MoveFile { summary, .. } => Some(summary),
        }
    }

    /// Mutating intents are snapshotted before they are applied.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Intent::RenameFolder { .. }
                | Intent::DeleteFolder { .. }
                | Intent::CreateNestedFolder { .. }
                | Intent::CreateFolder { .. }
                | Intent::MoveAllByExtension { .. }
                | Intent::MoveFile { .. }
        )
    }
}

type Builder = fn(&Captures<'_>, &EntityStore) -> Intent;

struct Rule {
    name: &'static str,
    pattern: Regex,
    build: Builder,
}

fn rule(name: &'static str, pattern: &str, build: Builder) -> Rule {
    Rule {
        name,
        pattern: Regex::new(pattern).expect("command pattern must compile"),
        build,
    }
}

// First match wins. Nested create must stay ahead of simple create, and the
// extension move ahead of the single-file move. Input is lowercased before
// matching and names are ASCII word characters only.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule("undo", r"^(?:undo|revert|go back|reverse|cancel)$", |_, _| Intent::Undo),
        rule("reset", r"^(?:reset|clear all|start over|restore default)$", |_, _| Intent::Reset),
        rule(
            "rename_folder",
            r#"rename\s+(?:folder\s+)?["']?([a-z0-9_\s-]+)["']?\s+to\s+["']?([a-z0-9_\s-]+)["']?"#,
            build_rename,
        ),
        rule(
            "delete_folder",
            r#"delete\s+(?:folder\s+)?["']?([a-z0-9_\s-]+)["']?"#,
            build_delete,
        ),
        rule(
            "create_nested_folder",
            r#"create\s+(?:a\s+)?(?:new\s+)?folder\s+(?:called\s+|named\s+)?["']?([a-z0-9_\s-]+)["']?\s+(?:inside|in|within|under)\s+["']?([a-z0-9_\s-]+)["']?"#,
            build_create_nested,
        ),
        rule(
            "create_simple_folder",
            r#"create\s+(?:a\s+)?(?:new\s+)?folder\s+(?:called\s+|named\s+)?["']?([a-z0-9_\s-]+)["']?"#,
            build_create_simple,
        ),
        rule(
            "move_all_by_extension",
            r#"move\s+all\s+([a-z0-9_]+)\s+(?:files?\s+)?(?:to|into)\s+["']?([a-z0-9_\s-]+)["']?"#,
            build_move_all,
        ),
        rule(
            "move_file",
            r#"move\s+["']?([a-z0-9_\s.-]+)["']?\s+(?:to|into)\s+["']?([a-z0-9_\s-]+)["']?"#,
            build_move_file,
        ),
        rule(
            "list",
            r"(?:list|show|display)\s+(?:all\s+)?(?:files|folders)",
            build_list,
        ),
        rule(
            "open_folder",
            r#"open\s+(?:folder\s+)?["']?([a-z0-9_\s-]+)["']?"#,
            build_open,
        ),
    ]
});

/// Turn one line of user text into an intent, resolving names against the
/// current store. Never fails: anything unrecognised becomes the help text.
pub fn parse_to_intent(input: &str, store: &EntityStore) -> Intent {
    let command = input.trim().to_lowercase();

    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(&command) {
            let intent = (rule.build)(&caps, store);
            debug!(rule = rule.name, verb = intent.verb(), "command matched");
            return intent;
        }
    }

    debug!(command = %command, "no command rule matched");
    Intent::info(HELP_MESSAGE.to_string())
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn folder_not_found(name: &str) -> Intent {
    Intent::info(format!("I couldn't find a folder named \"{}\".", name))
}

fn blank_folder_name() -> Intent {
    Intent::info(EMPTY_FOLDER_NAME.to_string())
}

fn build_rename(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let old_name = group(caps, 1).trim();
    let new_name = fix_name(group(caps, 2));

    let Some(folder) = store.find_folder(old_name) else {
        return folder_not_found(old_name);
    };

    if new_name.is_empty() {
        return blank_folder_name();
    }

    let taken = store.find_folder(&new_name).is_some_and(|f| f.id != folder.id);
    if taken {
        return Intent::info(format!("A folder named \"{}\" already exists.", new_name));
    }

    Intent::RenameFolder {
        folder_id: folder.id.clone(),
        old_name: folder.name.clone(),
        summary: format!("Renamed \"{}\" to \"{}\".", folder.name, new_name),
        new_name,
    }
}

fn build_delete(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let name = group(caps, 1).trim();

    // "delete documents folder" names the folder with a trailing noun
    let folder = store.find_folder(name).or_else(|| {
        name.strip_suffix(" folder")
            .and_then(|stripped| store.find_folder(stripped))
    });

    let Some(folder) = folder else {
        return folder_not_found(name);
    };

    Intent::DeleteFolder {
        folder_id: folder.id.clone(),
        folder_name: folder.name.clone(),
        summary: format!("Deleted \"{}\" folder.", folder.name),
    }
}

fn build_create_nested(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let name = fix_name(group(caps, 1));
    let parent_query = group(caps, 2).trim();

    if name.is_empty() {
        return blank_folder_name();
    }

    let Some(parent) = store.find_folder(parent_query) else {
        return folder_not_found(parent_query);
    };

    if sibling_exists(store, &name, &parent.id) {
        return Intent::info(format!(
            "A folder named \"{}\" already exists inside {}.",
            name, parent.name
        ));
    }

    Intent::CreateNestedFolder {
        summary: format!("Created \"{}\" folder inside {}.", name, parent.name),
        name,
        parent_id: parent.id.clone(),
        parent_name: parent.name.clone(),
    }
}

fn sibling_exists(store: &EntityStore, name: &str, parent_id: &str) -> bool {
    let lowered = name.to_lowercase();
    store.folders.iter().any(|f: &Folder| {
        f.name.to_lowercase() == lowered && f.parent.as_deref() == Some(parent_id)
    })
}

fn build_create_simple(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let name = fix_name(group(caps, 1));

    if name.is_empty() {
        return blank_folder_name();
    }
    if store.find_folder(&name).is_some() {
        return Intent::info(format!("A folder named \"{}\" already exists.", name));
    }

    Intent::CreateFolder {
        summary: format!("Created \"{}\" folder.", name),
        name,
    }
}

fn build_move_all(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let raw = group(caps, 1).to_lowercase();
    let extension = raw.strip_prefix('.').unwrap_or(&raw).to_string();
    let target_query = group(caps, 2).trim();

    let file_names: Vec<String> = store.files_with_extension(&extension)
        .into_iter()
        .map(|f| f.name.clone())
        .collect();

    if file_names.is_empty() {
        return Intent::info(format!("No {} files found.", extension));
    }

    let target = TargetFolder::resolve(store, target_query);
    if target.is_placeholder() && target.name().is_empty() {
        return blank_folder_name();
    }
    let count = file_names.len();
    let summary = if target.is_placeholder() {
        format!(
            "Created \"{}\" folder and moved {} {} file(s) into it.",
            target.name(), count, extension
        )
    } else {
        format!("Moved {} {} file(s) to {}.", count, extension, target.name())
    };

    Intent::MoveAllByExtension {
        extension,
        file_names,
        target,
        summary,
    }
}

fn build_move_file(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let file_query = group(caps, 1).trim();
    let target_query = group(caps, 2).trim();

    let Some(file) = store.find_file(file_query) else {
        return Intent::info(format!("I couldn't find a file named \"{}\".", file_query));
    };

    let target = TargetFolder::resolve(store, target_query);
    if target.is_placeholder() && target.name().is_empty() {
        return blank_folder_name();
    }
    let summary = if target.is_placeholder() {
        format!("Created \"{}\" folder and moved \"{}\" into it.", target.name(), file.name)
    } else {
        format!("Moved \"{}\" to {}.", file.name, target.name())
    };

    Intent::MoveFile {
        file_name: file.name.clone(),
        target,
        summary,
    }
}

fn build_list(_caps: &Captures<'_>, store: &EntityStore) -> Intent {
    Intent::List {
        summary: format!(
            "You have {} file(s) and {} folder(s).",
            store.files.len(),
            store.folders.len()
        ),
    }
}

fn build_open(caps: &Captures<'_>, store: &EntityStore) -> Intent {
    let name = group(caps, 1).trim();

    match store.find_folder(name) {
        Some(folder) => Intent::OpenFolder {
            folder_id: folder.id.clone(),
            summary: format!("Opening {} folder.", folder.name),
        },
        None => folder_not_found(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{File, FileKind};

    fn defaults() -> EntityStore {
        EntityStore::defaults()
    }

    fn summary_of(intent: &Intent) -> String {
        intent.summary().unwrap_or_default().to_string()
    }

    #[test]
    fn test_undo_and_reset_synonyms() {
        let store = defaults();
        for text in ["undo", "  Revert ", "go back", "REVERSE", "cancel"] {
            assert_eq!(parse_to_intent(text, &store), Intent::Undo, "{}", text);
        }
        for text in ["reset", "Clear All", "start over", "restore default"] {
            assert_eq!(parse_to_intent(text, &store), Intent::Reset, "{}", text);
        }
    }

    #[test]
    fn test_synonyms_need_full_match() {
        let store = defaults();
        let intent = parse_to_intent("please undo", &store);
        assert!(matches!(intent, Intent::Info { .. }));
        assert_eq!(summary_of(&intent), HELP_MESSAGE);
    }

    #[test]
    fn test_rename_folder() {
        let intent = parse_to_intent("rename Images to Pictures", &defaults());
        match intent {
            Intent::RenameFolder { folder_id, old_name, new_name, summary } => {
                assert_eq!(folder_id, "images");
                assert_eq!(old_name, "Images");
                assert_eq!(new_name, "Pictures");
                assert_eq!(summary, "Renamed \"Images\" to \"Pictures\".");
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }

    #[test]
    fn test_rename_collision_and_self_rename() {
        let store = defaults();

        let clash = parse_to_intent("rename folder images to documents", &store);
        assert_eq!(summary_of(&clash), "A folder named \"Documents\" already exists.");

        let same = parse_to_intent("rename images to images", &store);
        assert!(matches!(same, Intent::RenameFolder { .. }));
    }

    #[test]
    fn test_rename_refused_when_lookup_finds_another_folder() {
        let store = defaults();

        // "doc" is a substring of the documents id
        let intent = parse_to_intent("rename media to doc", &store);
        assert_eq!(summary_of(&intent), "A folder named \"Doc\" already exists.");

        // the lookup lands on the folder being renamed, which is allowed
        let itself = parse_to_intent("rename media to MEDIA", &store);
        assert!(matches!(itself, Intent::RenameFolder { ref new_name, .. } if new_name == "Media"));
    }

    #[test]
    fn test_blank_folder_names_are_refused() {
        let store = defaults();
        for text in [
            "create folder called '  '",
            "create folder '  ' inside media",
            "rename images to '  '",
        ] {
            assert_eq!(parse_to_intent(text, &store), Intent::info(EMPTY_FOLDER_NAME.to_string()), "{}", text);
        }
    }

    #[test]
    fn test_blank_move_target_resolves_to_first_folder() {
        let store = defaults();
        match parse_to_intent("move vacation.png to '  '", &store) {
            Intent::MoveFile { target, summary, .. } => {
                assert_eq!(target.id(), "images");
                assert!(!target.is_placeholder());
                assert_eq!(summary, "Moved \"vacation.png\" to Images.");
            }
            other => panic!("unexpected intent: {:?}", other),
        }

        let empty = EntityStore::new(store.files.clone(), Vec::new());
        let intent = parse_to_intent("move all png files to '  '", &empty);
        assert_eq!(summary_of(&intent), EMPTY_FOLDER_NAME);
    }

    #[test]
    fn test_names_are_ascii_word_characters() {
        let mut store = defaults();
        store.files.push(File::new(9, "café.png", FileKind::Image, "1 KB"));

        let intent = parse_to_intent("move café.png to images", &store);
        assert_eq!(summary_of(&intent), HELP_MESSAGE);

        // the capture stops at the first non-ASCII character
        let created = parse_to_intent("create folder called café", &store);
        assert!(matches!(created, Intent::CreateFolder { ref name, .. } if name == "Caf"));
    }

    #[test]
    fn test_rename_missing_folder() {
        let intent = parse_to_intent("rename Nope to Other", &defaults());
        assert_eq!(summary_of(&intent), "I couldn't find a folder named \"nope\".");
    }

    #[test]
    fn test_delete_folder() {
        let store = defaults();

        let intent = parse_to_intent("delete folder Media", &store);
        assert!(matches!(intent, Intent::DeleteFolder { ref folder_id, .. } if folder_id == "media"));

        let trailing = parse_to_intent("delete Documents folder", &store);
        assert!(matches!(trailing, Intent::DeleteFolder { ref folder_id, .. } if folder_id == "documents"));

        let missing = parse_to_intent("delete Music", &store);
        assert_eq!(summary_of(&missing), "I couldn't find a folder named \"music\".");
    }

    #[test]
    fn test_nested_create_tried_before_simple() {
        let intent = parse_to_intent("create a new folder called Photos inside Media", &defaults());
        match intent {
            Intent::CreateNestedFolder { name, parent_id, summary, .. } => {
                assert_eq!(name, "Photos");
                assert_eq!(parent_id, "media");
                assert_eq!(summary, "Created \"Photos\" folder inside Media.");
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }

    #[test]
    fn test_nested_create_rejections() {
        let mut store = defaults();
        let missing = parse_to_intent("create folder Photos under Archive", &store);
        assert_eq!(summary_of(&missing), "I couldn't find a folder named \"archive\".");

        store.folders.push(Folder::new("media-photos-1", "Photos", "red", Some("media")));
        let dup = parse_to_intent("create folder photos within media", &store);
        assert_eq!(summary_of(&dup), "A folder named \"Photos\" already exists inside Media.");

        let elsewhere = parse_to_intent("create folder photos in images", &store);
        assert!(matches!(elsewhere, Intent::CreateNestedFolder { .. }));
    }

    #[test]
    fn test_create_simple_folder() {
        let mut store = defaults();
        let intent = parse_to_intent("create folder called Projects", &store);
        assert_eq!(
            intent,
            Intent::CreateFolder {
                name: "Projects".to_string(),
                summary: "Created \"Projects\" folder.".to_string(),
            }
        );

        store.folders.push(Folder::new("projects-1", "Projects", "teal", None));
        let dup = parse_to_intent("create folder called projects", &store);
        assert_eq!(summary_of(&dup), "A folder named \"Projects\" already exists.");
    }

    #[test]
    fn test_move_all_by_extension() {
        let store = EntityStore::new(
            vec![
                File::new(1, "a.png", FileKind::Image, "1 KB"),
                File::new(2, "b.PNG", FileKind::Image, "1 KB"),
                File::new(3, "c.jpg", FileKind::Image, "1 KB"),
            ],
            Vec::new(),
        );

        match parse_to_intent("move all png files to Images", &store) {
            Intent::MoveAllByExtension { extension, file_names, target, summary } => {
                assert_eq!(extension, "png");
                assert_eq!(file_names, vec!["a.png".to_string(), "b.PNG".to_string()]);
                assert_eq!(
                    target,
                    TargetFolder::Placeholder { id: "images".to_string(), name: "Images".to_string() }
                );
                assert_eq!(summary, "Created \"Images\" folder and moved 2 png file(s) into it.");
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }

    #[test]
    fn test_move_all_existing_target_and_no_matches() {
        let store = defaults();

        let intent = parse_to_intent("move all png into images", &store);
        assert_eq!(summary_of(&intent), "Moved 2 png file(s) to Images.");
        assert!(matches!(intent, Intent::MoveAllByExtension { ref target, .. } if !target.is_placeholder()));

        let none = parse_to_intent("move all gif files to Images", &store);
        assert_eq!(summary_of(&none), "No gif files found.");
    }

    #[test]
    fn test_move_single_file() {
        let store = defaults();

        let existing = parse_to_intent("move Vacation.PNG to images", &store);
        match existing {
            Intent::MoveFile { file_name, target, summary } => {
                assert_eq!(file_name, "vacation.png");
                assert_eq!(target.id(), "images");
                assert_eq!(summary, "Moved \"vacation.png\" to Images.");
            }
            other => panic!("unexpected intent: {:?}", other),
        }

        let created = parse_to_intent("move notes.txt into work stuff", &store);
        match created {
            Intent::MoveFile { target, summary, .. } => {
                assert_eq!(target.id(), "work-stuff");
                assert_eq!(target.name(), "Work stuff");
                assert_eq!(summary, "Created \"Work stuff\" folder and moved \"notes.txt\" into it.");
            }
            other => panic!("unexpected intent: {:?}", other),
        }

        let missing = parse_to_intent("move ghost.doc to Images", &store);
        assert_eq!(summary_of(&missing), "I couldn't find a file named \"ghost.doc\".");
    }

    #[test]
    fn test_list_and_open() {
        let store = defaults();

        let list = parse_to_intent("show all folders", &store);
        assert_eq!(
            list,
            Intent::List { summary: "You have 8 file(s) and 3 folder(s).".to_string() }
        );

        let open = parse_to_intent("open folder media", &store);
        assert_eq!(
            open,
            Intent::OpenFolder {
                folder_id: "media".to_string(),
                summary: "Opening Media folder.".to_string(),
            }
        );

        let missing = parse_to_intent("open Secret", &store);
        assert_eq!(summary_of(&missing), "I couldn't find a folder named \"secret\".");
    }

    #[test]
    fn test_rule_order_wins_over_later_patterns() {
        // contains both "rename ... to" and "move ... to"; rename is earlier
        let intent = parse_to_intent("rename media to move stuff", &defaults());
        assert!(matches!(intent, Intent::RenameFolder { .. }));
    }

    #[test]
    fn test_mutating_classification() {
        let store = defaults();
        assert!(!parse_to_intent("undo", &store).is_mutating());
        assert!(!parse_to_intent("list files", &store).is_mutating());
        assert!(!parse_to_intent("open media", &store).is_mutating());
        assert!(parse_to_intent("create folder x1", &store).is_mutating());
    }
}
