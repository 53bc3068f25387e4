mod config;
mod core;
mod logging;
mod output;
mod repl;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::persistence::{JsonFileStore, MemoryStore, StateStore, StoreError};
use crate::core::session::Session;
use crate::core::types::{EntityStore, Folder, Sender};
use crate::output::Printer;
use crate::repl::Repl;

const PROMPT: &str = "organize> ";

fn main() -> io::Result<()> {
    let printer = Printer::new();

    let config = match Config::from_env().and_then(|c| c.with_args(std::env::args().skip(1))) {
        Ok(config) => config,
        Err(e) => {
            printer.error(&e.to_string());
            show_usage();
            std::process::exit(2);
        }
    };

    if config.show_usage {
        show_usage();
        return Ok(());
    }

    if let Err(e) = logging::init_logging(&config) {
        printer.warning(&format!("Logging disabled: {}", e));
    }

    let session = match open_session(&config) {
        Ok(session) => session,
        Err(e) => {
            printer.error(&format!("Could not open saved state: {}", e));
            std::process::exit(1);
        }
    };

    match &config.script {
        Some(path) => match execute_org_file(path, session, &printer) {
            Ok(_) => Ok(()),
            Err(e) => {
                printer.error(&e);
                std::process::exit(1);
            }
        },
        None => interactive_mode(&config, session),
    }
}

fn open_session(config: &Config) -> Result<Session, StoreError> {
    let backend: Box<dyn StateStore> = if config.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::open(config.state_dir())?)
    };
    info!(home = %config.home.display(), ephemeral = config.ephemeral, "opening session");
    Ok(Session::open(backend, config.latency))
}

fn setup_ctrlc_handler() {
    // Ctrl+C must not cut a command short; rustyline handles it at the prompt
    if let Err(e) = ctrlc::set_handler(|| {
        debug!("interrupt ignored");
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}

fn interactive_mode(config: &Config, mut session: Session) -> io::Result<()> {
    setup_ctrlc_handler();

    let mut repl = match Repl::new(config.repl_history_file()) {
        Ok(repl) => repl,
        Err(e) => {
            let printer = Printer::new();
            printer.warning(&format!("{}", e));
            printer.info("Falling back to basic input mode...");
            return interactive_mode_fallback(session, &printer);
        }
    };

    show_banner(&session, repl.printer());

    loop {
        match repl.read_line(PROMPT) {
            Ok(Some(line)) => {
                if let Flow::Exit = handle_line(&line, &mut session, repl.printer()) {
                    break;
                }
                println!();
            }
            Ok(None) => continue,
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(e) => {
                repl.printer().error(&format!("Input error: {}", e));
                break;
            }
        }
    }

    if let Err(e) = repl.save_history() {
        repl.printer().warning(&e);
    }
    repl.printer().success("Goodbye!");
    Ok(())
}

fn interactive_mode_fallback(mut session: Session, printer: &Printer) -> io::Result<()> {
    show_banner(&session, printer);

    let stdin = io::stdin();
    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Flow::Exit = handle_line(line, &mut session, printer) {
            break;
        }
        println!();
    }

    printer.success("Goodbye!");
    Ok(())
}

enum Flow {
    Continue,
    Exit,
}

/// Meta commands start with ':' and never reach the command parser.
fn handle_line(line: &str, session: &mut Session, printer: &Printer) -> Flow {
    match line {
        "exit" | "quit" | ":quit" | ":q" => return Flow::Exit,
        ":help" => show_help(printer),
        ":tree" => show_tree(session.store(), printer),
        ":ls" => show_view(session, printer),
        ":transcript" => show_transcript(session, printer),
        _ if line.starts_with(":height") => {
            let arg = line.trim_start_matches(":height").trim();
            match arg.parse::<u32>() {
                Ok(height) => match session.set_panel_height(height) {
                    Ok(()) => printer.success(&format!("Panel height set to {}", height)),
                    Err(e) => printer.error(&e.to_string()),
                },
                Err(_) if arg.is_empty() => {
                    printer.info(&format!("Panel height is {}", session.panel_height()));
                }
                Err(_) => printer.error(&format!("Not a number: '{}'", arg)),
            }
        }
        _ if line.starts_with(':') => {
            printer.error(&format!("Unknown command '{}'. Type :help", line));
        }
        _ => {
            run_command(line, session, printer);
        }
    }
    Flow::Continue
}

/// Returns false when the command could not be applied.
fn run_command(line: &str, session: &mut Session, printer: &Printer) -> bool {
    match session.submit(line) {
        Ok(Some(reply)) => {
            if reply.failed {
                printer.error(&reply.message);
                return false;
            }
            if reply.changed {
                printer.success(&reply.message);
            } else {
                printer.info(&reply.message);
            }
            true
        }
        Ok(None) => true,
        Err(e) => {
            printer.error(&e.to_string());
            false
        }
    }
}

fn execute_org_file(path: &Path, mut session: Session, printer: &Printer) -> Result<(), String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read file '{}': {}", path.display(), e))?;

    printer.header(&format!("Executing script: {}", path.display()));

    let mut success_count = 0;
    let mut error_count = 0;

    for (line_num, line) in content.lines().enumerate() {
        let line = match line.find('#') {
            Some(comment_start) => line[..comment_start].trim(),
            None => line.trim(),
        };
        if line.is_empty() {
            continue;
        }

        println!("{}{}", PROMPT, line);
        let ok = if line.starts_with(':') {
            if let Flow::Exit = handle_line(line, &mut session, printer) {
                break;
            }
            true
        } else {
            run_command(line, &mut session, printer)
        };

        if ok {
            success_count += 1;
        } else {
            debug!(line = line_num + 1, "script command failed");
            error_count += 1;
        }
    }

    printer.success(&format!(
        "Script complete: {} commands, {} success, {} errors",
        success_count + error_count,
        success_count,
        error_count
    ));
    Ok(())
}

fn show_banner(session: &Session, printer: &Printer) {
    printer.header("File Organizer");
    if let Some(last) = session.transcript().last() {
        printer.info(&last.text);
    }
    println!("Type ':help' for more, 'exit' to quit.");
    println!();
}

fn show_usage() {
    println!("Usage: organizer [--ephemeral] [--verbose] [script.org]");
    println!();
    println!("  --ephemeral    keep state in memory only");
    println!("  -v, --verbose  mirror logs to stderr");
    println!("  script.org     run commands from a file, one per line ('#' starts a comment)");
    println!();
    println!("Environment: ORGANIZER_HOME, ORGANIZER_LATENCY_MS, ORGANIZER_LOG");
}

fn show_help(printer: &Printer) {
    printer.header("Commands");

    printer.subheader("Folders");
    println!("  create folder called <name>");
    println!("  create folder <name> inside <parent>");
    println!("  rename <folder> to <new name>");
    println!("  delete <folder>");
    println!("  open <folder>");

    printer.subheader("Files");
    println!("  move <file> to <folder>          - creates the folder if needed");
    println!("  move all <ext> files to <folder>");
    println!("  list files");

    printer.subheader("History");
    println!("  undo | revert | go back | reverse | cancel");
    println!("  reset | clear all | start over | restore default");

    printer.subheader("Session");
    println!("  :tree         - folder tree with file counts");
    println!("  :ls           - contents of the open folder");
    println!("  :transcript   - conversation so far");
    println!("  :height [N]   - show or set the panel height (300-800)");
    println!("  exit          - quit");
}

fn show_tree(store: &EntityStore, printer: &Printer) {
    printer.header("Folders");
    printer.print_key_value("All Files", &format!("{} files", store.unorganized_files().len()), 2);

    for folder in store.subfolders(None) {
        print_folder(store, folder, 1, printer);
    }

    let detached: Vec<&Folder> = store.folders.iter()
        .filter(|f| f.parent.as_deref().is_some_and(|p| !store.contains_folder_id(p)))
        .collect();
    if !detached.is_empty() {
        printer.subheader("Detached (parent was deleted)");
        for folder in detached {
            print_folder(store, folder, 1, printer);
        }
    }
}

fn print_folder(store: &EntityStore, folder: &Folder, depth: usize, printer: &Printer) {
    // A corrupt saved state could hold a parent cycle
    if depth > store.folders.len() {
        return;
    }

    let files = store.files_in_folder(&folder.id).len();
    let children = store.subfolders(Some(&folder.id));
    let counts = if children.is_empty() {
        format!("{} files", files)
    } else {
        format!("{} files • {} folders", files, children.len())
    };

    println!(
        "{}{}  ({})",
        "  ".repeat(depth),
        printer.folder_label(&folder.name, &folder.color),
        counts
    );
    for child in children {
        print_folder(store, child, depth + 1, printer);
    }
}

fn show_view(session: &Session, printer: &Printer) {
    let view = session.view();
    let title = match (view.folder, session.selected_folder()) {
        (Some(folder), _) => folder.name.clone(),
        (None, Some(id)) => format!("{} (missing)", id),
        (None, None) => "All Files".to_string(),
    };
    printer.header(&title);

    for folder in &view.subfolders {
        println!("  {}", printer.folder_label(&folder.name, &folder.color));
    }
    if view.files.is_empty() {
        println!("  (no files)");
    }
    for file in &view.files {
        printer.print_list_item(&format!("{:<24} {:<9} {}", file.name, file.kind, file.size), 2);
    }
}

fn show_transcript(session: &Session, printer: &Printer) {
    printer.header("Transcript");
    for message in session.transcript() {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "organizer",
        };
        printer.print_key_value(
            &format!("{} {}", message.timestamp.format("%H:%M:%S"), who),
            &message.text,
            2,
        );
    }
}
