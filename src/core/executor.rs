use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::history::History;
use crate::core::intent::{Intent, TargetFolder};
use crate::core::names::slugify;
use crate::core::types::{random_color, EntityStore, Folder, FolderId};

pub const NOTHING_TO_UNDO: &str = "Nothing to undo! You haven't made any changes yet.";
pub const UNDONE: &str = "✅ Undone! Restored to previous state.";
pub const RESET_DONE: &str = "✅ All files and folders have been reset to default!";

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("folder '{0}' no longer exists")]
    FolderNotFound(FolderId),
    #[error("file '{0}' no longer exists")]
    FileNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Keep,
    Select(FolderId),
    Clear,
}

/// Read-only view of the state an intent is applied to.
#[derive(Debug, Clone, Copy)]
pub struct Workspace<'a> {
    pub store: &'a EntityStore,
    pub history: &'a History,
    pub selection: Option<&'a str>,
}

/// Complete replacement state. Nothing is committed until the caller takes it.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub store: EntityStore,
    pub history: History,
    pub message: String,
    pub selection: SelectionChange,
    /// Store or history differ from the workspace.
    pub changed: bool,
    /// Persisted state must be wiped before the new state is saved.
    pub reset: bool,
}

impl Outcome {
    fn unchanged(ws: &Workspace<'_>, message: String) -> Self {
        Self {
            store: ws.store.clone(),
            history: ws.history.clone(),
            message,
            selection: SelectionChange::Keep,
            changed: false,
            reset: false,
        }
    }
}

pub fn execute(intent: Intent, ws: &Workspace<'_>) -> Result<Outcome, ExecError> {
    match intent {
        Intent::Info { summary } | Intent::List { summary } => {
            Ok(Outcome::unchanged(ws, summary))
        }

        Intent::OpenFolder { folder_id, summary } => {
            let mut outcome = Outcome::unchanged(ws, summary);
            outcome.selection = SelectionChange::Select(folder_id);
            Ok(outcome)
        }

        Intent::Undo => Ok(undo(ws)),

        Intent::Reset => {
            info!("resetting files and folders to defaults");
            Ok(Outcome {
                store: EntityStore::defaults(),
                history: History::with_limit(ws.history.limit()),
                message: RESET_DONE.to_string(),
                selection: SelectionChange::Clear,
                changed: true,
                reset: true,
            })
        }

        mutating => apply_mutation(mutating, ws),
    }
}

fn undo(ws: &Workspace<'_>) -> Outcome {
    let mut history = ws.history.clone();

    match history.pop() {
        Some(snapshot) => {
            debug!(remaining = history.len(), "restoring snapshot");
            Outcome {
                store: snapshot.restore(),
                history,
                message: UNDONE.to_string(),
                selection: SelectionChange::Keep,
                changed: true,
                reset: false,
            }
        }
        None => Outcome::unchanged(ws, NOTHING_TO_UNDO.to_string()),
    }
}

fn apply_mutation(intent: Intent, ws: &Workspace<'_>) -> Result<Outcome, ExecError> {
    let verb = intent.verb();
    let mut store = ws.store.clone();
    let mut history = ws.history.clone();
    let mut selection = SelectionChange::Keep;

    // Snapshot the state as it was before this intent
    history.record(ws.store);

    let message = match intent {
        Intent::CreateFolder { name, summary } => {
            let base = format!("{}-{}", slugify(&name), Utc::now().timestamp_millis());
            let id = unique_folder_id(&store, &base);
            store.folders.push(Folder::new(&id, &name, &random_color(), None));
            summary
        }

        Intent::CreateNestedFolder { name, parent_id, summary, .. } => {
            if !store.contains_folder_id(&parent_id) {
                return Err(ExecError::FolderNotFound(parent_id));
            }
            let base = format!(
                "{}-{}-{}",
                parent_id,
                slugify(&name),
                Utc::now().timestamp_millis()
            );
            let id = unique_folder_id(&store, &base);
            store.folders.push(Folder::new(&id, &name, &random_color(), Some(&parent_id)));
            summary
        }

        Intent::MoveFile { file_name, target, summary } => {
            if !store.files.iter().any(|f| f.name == file_name) {
                return Err(ExecError::FileNotFound(file_name));
            }
            let target_id = materialize_target(&mut store, &target)?;
            for file in store.files.iter_mut().filter(|f| f.name == file_name) {
                file.folder = Some(target_id.clone());
            }
            summary
        }

        Intent::MoveAllByExtension { file_names, target, summary, .. } => {
            let target_id = materialize_target(&mut store, &target)?;
            for file in store.files.iter_mut().filter(|f| file_names.contains(&f.name)) {
                file.folder = Some(target_id.clone());
            }
            summary
        }

        Intent::RenameFolder { folder_id, new_name, summary, .. } => {
            let folder = store.folders.iter_mut()
                .find(|f| f.id == folder_id)
                .ok_or_else(|| ExecError::FolderNotFound(folder_id.clone()))?;
            folder.name = new_name;
            summary
        }

        Intent::DeleteFolder { folder_id, summary, .. } => {
            if !store.contains_folder_id(&folder_id) {
                return Err(ExecError::FolderNotFound(folder_id));
            }

            let mut unlinked = 0;
            for file in store.files.iter_mut() {
                if file.folder.as_deref() == Some(folder_id.as_str()) {
                    file.folder = None;
                    unlinked += 1;
                }
            }

            // One level only: grandchildren keep their (now dangling) parent
            store.folders.retain(|f| {
                f.id != folder_id && f.parent.as_deref() != Some(folder_id.as_str())
            });

            if ws.selection == Some(folder_id.as_str()) {
                selection = SelectionChange::Clear;
            }

            if unlinked > 0 {
                format!("{} {} file(s) moved to \"All Files\".", summary, unlinked)
            } else {
                summary
            }
        }

        // Non-mutating intents never get here
        other => return Ok(Outcome::unchanged(ws, other.summary().unwrap_or_default().to_string())),
    };

    info!(verb, history = history.len(), "applied command");

    Ok(Outcome {
        store,
        history,
        message,
        selection,
        changed: true,
        reset: false,
    })
}

/// Create the placeholder folder if needed and return the id files should point at.
fn materialize_target(store: &mut EntityStore, target: &TargetFolder) -> Result<FolderId, ExecError> {
    match target {
        TargetFolder::Existing { id, .. } => {
            if store.contains_folder_id(id) {
                Ok(id.clone())
            } else {
                Err(ExecError::FolderNotFound(id.clone()))
            }
        }
        TargetFolder::Placeholder { id, name } => {
            let id = unique_folder_id(store, id);
            debug!(folder = %id, "creating move target");
            store.folders.push(Folder::new(&id, name, &random_color(), None));
            Ok(id)
        }
    }
}

fn unique_folder_id(store: &EntityStore, base: &str) -> FolderId {
    if !store.contains_folder_id(base) {
        return base.to_string();
    }

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !store.contains_folder_id(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
