use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::executor::{execute, ExecError, Outcome, SelectionChange, Workspace};
use crate::core::history::History;
use crate::core::intent::parse_to_intent;
use crate::core::persistence::{
    PersistedState, StateKey, StateStore, StoreError, MAX_PANEL_HEIGHT, MIN_PANEL_HEIGHT,
};
use crate::core::types::{EntityStore, File, Folder, FolderId, Message};

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(600);
pub const INTERNAL_ERROR: &str = "❌ An error occurred while processing your command.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a command is already being processed")]
    Busy,
    #[error("panel height {0} is outside 300..=800")]
    PanelHeight(u32),
    #[error("no folder with id '{0}'")]
    UnknownFolder(FolderId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a submitted command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub verb: &'static str,
    pub message: String,
    pub changed: bool,
    /// The command could not be applied; `message` is the generic error.
    pub failed: bool,
}

/// Files and subfolders visible for the current selection.
#[derive(Debug)]
pub struct View<'a> {
    pub folder: Option<&'a Folder>,
    pub files: Vec<&'a File>,
    pub subfolders: Vec<&'a Folder>,
}

/// Runs commands one at a time against the persisted state.
pub struct Session {
    state: PersistedState,
    backend: Box<dyn StateStore>,
    latency: Duration,
    processing: bool,
}

impl Session {
    /// Loads every key from `backend`. Nothing is written back until the
    /// first change, so stored state is never overwritten by defaults.
    pub fn open(backend: Box<dyn StateStore>, latency: Duration) -> Self {
        let state = PersistedState::load(&*backend);
        info!(
            files = state.store.files.len(),
            folders = state.store.folders.len(),
            history = state.history.len(),
            "session loaded"
        );

        Self {
            state,
            backend,
            latency,
            processing: false,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.state.store
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn transcript(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn selected_folder(&self) -> Option<&str> {
        self.state.selected_folder.as_deref()
    }

    pub fn panel_height(&self) -> u32 {
        self.state.panel_height
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Process one line of user input to completion. Blank input is ignored.
    pub fn submit(&mut self, text: &str) -> Result<Option<Reply>, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.processing {
            return Err(SessionError::Busy);
        }

        self.processing = true;
        let reply = self.process(text);
        self.processing = false;

        Ok(Some(reply))
    }

    /// Once a command is taken it always produces a reply. Save failures from
    /// here on are logged and the in-memory state stays authoritative.
    fn process(&mut self, text: &str) -> Reply {
        self.state.messages.push(Message::user(text));
        self.persist_or_log(&[StateKey::Messages]);

        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }

        let intent = parse_to_intent(text, &self.state.store);
        let verb = intent.verb();

        let outcome = {
            let ws = Workspace {
                store: &self.state.store,
                history: &self.state.history,
                selection: self.state.selected_folder.as_deref(),
            };
            execute(intent, &ws)
        };

        let reply = match outcome {
            Ok(outcome) => self.commit(verb, outcome),
            Err(e) => self.fail(verb, e),
        };

        self.state.messages.push(Message::assistant(&reply.message));
        self.persist_or_log(&[StateKey::Messages]);

        reply
    }

    fn commit(&mut self, verb: &'static str, outcome: Outcome) -> Reply {
        let Outcome { store, history, message, selection, changed, reset } = outcome;

        if reset {
            if let Err(e) = self.clear_persisted() {
                error!(error = %e, "could not clear stored state");
            }
            self.state.messages = PersistedState::default().messages;
        }

        self.state.store = store;
        self.state.history = history;

        let mut dirty = Vec::new();
        if changed {
            dirty.extend([StateKey::Files, StateKey::Folders, StateKey::History]);
        }

        match selection {
            SelectionChange::Keep => {}
            SelectionChange::Select(id) => {
                self.state.selected_folder = Some(id);
                dirty.push(StateKey::SelectedFolder);
            }
            SelectionChange::Clear => {
                self.state.selected_folder = None;
                dirty.push(StateKey::SelectedFolder);
            }
        }

        if reset {
            dirty.push(StateKey::Messages);
        }
        self.persist_or_log(&dirty);

        Reply { verb, message, changed, failed: false }
    }

    fn fail(&self, verb: &'static str, e: ExecError) -> Reply {
        error!(verb, error = %e, "command failed, state left untouched");
        Reply {
            verb,
            message: INTERNAL_ERROR.to_string(),
            changed: false,
            failed: true,
        }
    }

    /// Every key except the panel height.
    fn clear_persisted(&mut self) -> Result<(), SessionError> {
        for key in StateKey::ALL {
            if key != StateKey::PanelHeight {
                self.backend.remove(key)?;
            }
        }
        Ok(())
    }

    fn persist(&mut self, keys: &[StateKey]) -> Result<(), SessionError> {
        self.state.save(&mut *self.backend, keys)?;
        Ok(())
    }

    fn persist_or_log(&mut self, keys: &[StateKey]) {
        if let Err(e) = self.persist(keys) {
            error!(error = %e, "could not save state");
        }
    }

    pub fn set_panel_height(&mut self, height: u32) -> Result<(), SessionError> {
        if !(MIN_PANEL_HEIGHT..=MAX_PANEL_HEIGHT).contains(&height) {
            return Err(SessionError::PanelHeight(height));
        }
        self.state.panel_height = height;
        self.persist(&[StateKey::PanelHeight])
    }

    /// Direct selection, outside the command language. `None` shows "All Files".
    pub fn select(&mut self, folder_id: Option<&str>) -> Result<(), SessionError> {
        if let Some(id) = folder_id {
            if !self.state.store.contains_folder_id(id) {
                return Err(SessionError::UnknownFolder(id.to_string()));
            }
        }
        self.state.selected_folder = folder_id.map(str::to_string);
        self.persist(&[StateKey::SelectedFolder])
    }

    pub fn view(&self) -> View<'_> {
        let store = &self.state.store;

        match self.selected_folder() {
            Some(id) => {
                let folder = store.folder_by_id(id);
                if folder.is_none() {
                    warn!(folder = id, "selected folder no longer exists");
                }
                View {
                    folder,
                    files: store.files_in_folder(id),
                    subfolders: store.subfolders(Some(id)),
                }
            }
            None => View {
                folder: None,
                files: store.unorganized_files(),
                subfolders: Vec::new(),
            },
        }
    }
}
