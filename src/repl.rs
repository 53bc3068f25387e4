use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;

use crate::output::Printer;

pub struct Repl {
    editor: DefaultEditor,
    history_file: PathBuf,
    printer: Printer,
}

impl Repl {
    pub fn new(history_file: PathBuf) -> Result<Self, String> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| format!("Failed to initialize line editor: {}", e))?;

        if let Some(dir) = history_file.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
            }
        }

        // Line-editor recall only; the command transcript is persisted separately
        if history_file.exists() {
            editor.load_history(&history_file).ok();
        }

        Ok(Self {
            editor,
            history_file,
            printer: Printer::new(),
        })
    }

    /// `Ok(None)` on an empty line or Ctrl+C; `Err(Eof)` ends the session.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ReadlineError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    return Ok(None);
                }
                self.editor.add_history_entry(line)?;
                Ok(Some(line.to_string()))
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn save_history(&mut self) -> Result<(), String> {
        self.editor.save_history(&self.history_file)
            .map_err(|e| format!("Failed to save REPL history: {}", e))
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }
}
