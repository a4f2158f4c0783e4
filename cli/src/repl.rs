//! REPL (Read-Eval-Print Loop) for interactive consultation

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use solace_application::{SessionManager, TurnObserver};
use solace_domain::{
    Message, MessageId, MessageKind, RiskLevel, Sender, Session, SessionId, TurnOutcome,
};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Renders streamed turn events straight to the terminal.
///
/// Deltas are flushed as they arrive so the reply appears to type itself;
/// risk warnings break the flow on their own line.
pub struct ReplObserver;

impl TurnObserver for ReplObserver {
    fn turn_started(&self, _message_id: MessageId) {
        print!("{} ", "solace>".cyan().bold());
        let _ = std::io::stdout().flush();
    }

    fn delta(&self, chunk: &str) {
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    }

    fn risk_warning(&self, content: &str) {
        println!();
        println!("{} {}", "[risk]".red().bold(), content.yellow());
        print!("{} ", "solace>".cyan().bold());
        let _ = std::io::stdout().flush();
    }
}

/// Interactive consultation REPL
pub struct ConsultRepl {
    manager: Arc<SessionManager>,
    history_file: Option<String>,
}

impl ConsultRepl {
    pub fn new(manager: Arc<SessionManager>, history_file: Option<String>) -> Self {
        Self {
            manager,
            history_file,
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self
            .history_file
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|p| p.join("solace").join("history.txt")));

        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome().await;

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line).await {
                            break;
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    async fn print_welcome(&self) {
        let session = self.manager.current_session().await;
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│          Solace - Consultation Mode         │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Session: {}", session.display_title());
        println!();
        println!("Commands:");
        println!("  /help       - Show this help");
        println!("  /sessions   - List your sessions");
        println!("  /new        - Start a new conversation");
        println!("  /quit       - Exit");
        println!();
        println!("Type anything else to talk. Ctrl-C during a reply cancels it.");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&self, cmd: &str) -> bool {
        let (name, arg) = match cmd.split_once(' ') {
            Some((name, rest)) => (name, rest.trim()),
            None => (cmd, ""),
        };

        match name {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                true
            }
            "/help" | "/h" | "/?" => {
                self.print_help();
                false
            }
            "/sessions" | "/ls" => {
                let page = arg.parse::<u32>().unwrap_or(1);
                self.list_sessions(page).await;
                false
            }
            "/open" => {
                match arg.parse::<i64>() {
                    Ok(id) => self.open_session(SessionId::new(id)).await,
                    Err(_) => println!("Usage: /open <session-id>"),
                }
                false
            }
            "/new" => {
                self.manager.start_draft().await;
                println!("Started a new conversation.");
                false
            }
            "/rename" => {
                if arg.is_empty() {
                    println!("Usage: /rename <title>");
                } else {
                    match self.manager.rename_current(arg).await {
                        Ok(()) => println!("Renamed to \"{arg}\"."),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                }
                false
            }
            "/delete" | "/rm" => {
                self.delete_session(arg).await;
                false
            }
            "/history" => {
                self.print_transcript().await;
                false
            }
            "/mood" => {
                self.print_mood().await;
                false
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?       - Show this help");
        println!("  /sessions [page]    - List your sessions");
        println!("  /open <id>          - Switch to a listed session");
        println!("  /new                - Start a new conversation");
        println!("  /rename <title>     - Rename the current session");
        println!("  /delete [id]        - Delete a session (current if no id)");
        println!("  /history            - Show the current transcript");
        println!("  /mood               - Show the latest emotion reading");
        println!("  /quit, /exit, /q    - Exit");
        println!();
    }

    async fn list_sessions(&self, page: u32) {
        match self.manager.list_sessions(page, 20).await {
            Ok(listing) => {
                println!();
                if listing.records.is_empty() {
                    println!("No sessions on page {page}.");
                } else {
                    for record in &listing.records {
                        println!("  {:>6}  {}", record.id.get(), record.title);
                    }
                    println!();
                    println!("{} session(s) total.", listing.total);
                }
                println!();
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    async fn open_session(&self, id: SessionId) {
        match self.manager.list_sessions(1, 100).await {
            Ok(listing) => match listing.records.iter().find(|r| r.id == id) {
                Some(record) => {
                    self.manager.switch_to(Session::from_record(record)).await;
                    println!("Opened \"{}\".", record.title);
                }
                None => println!("No session {id} in the directory listing."),
            },
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    async fn delete_session(&self, arg: &str) {
        let target = if arg.is_empty() {
            self.manager.current_session().await
        } else {
            match arg.parse::<i64>() {
                Ok(id) => Session::persisted(SessionId::new(id), ""),
                Err(_) => {
                    println!("Usage: /delete [session-id]");
                    return;
                }
            }
        };

        match self.manager.delete_session(&target).await {
            Ok(()) => println!("Deleted."),
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    async fn print_transcript(&self) {
        let messages = self.manager.messages().await;
        println!();
        if messages.is_empty() {
            println!("Nothing here yet.");
        }
        for message in &messages {
            self.print_message(message);
        }
        println!();
    }

    fn print_message(&self, message: &Message) {
        match (message.sender, message.kind) {
            (_, MessageKind::RiskWarning) => {
                println!("{} {}", "[risk]".red().bold(), message.content.yellow());
            }
            (Sender::User, _) => {
                println!("{} {}", "you>".green().bold(), message.content);
            }
            (Sender::Assistant, _) => {
                println!("{} {}", "solace>".cyan().bold(), message.content);
            }
        }
    }

    async fn print_mood(&self) {
        let mood = self.manager.current_mood().await;
        let risk = match mood.risk_level {
            RiskLevel::None => mood.risk_level.to_string().normal(),
            RiskLevel::Mild => mood.risk_level.to_string().yellow(),
            _ => mood.risk_level.to_string().red().bold(),
        };
        println!();
        println!(
            "Mood: {} (score {:.0}, risk {})",
            mood.primary_emotion.bold(),
            mood.score,
            risk
        );
        if !mood.keywords.is_empty() {
            println!("Keywords: {}", mood.keywords.join(", "));
        }
        if !mood.suggestion.is_empty() {
            println!("Suggestion: {}", mood.suggestion);
        }
        println!();
    }

    async fn process_message(&self, text: &str) {
        let outcome_rx = match self.manager.send_message(text).await {
            Ok((_message_id, outcome_rx)) => outcome_rx,
            Err(e) => {
                eprintln!("Error: {e}");
                return;
            }
        };

        println!();
        self.await_turn(outcome_rx).await;
        println!();
    }

    /// Block the prompt until the turn settles; Ctrl-C cancels it.
    async fn await_turn(&self, mut outcome_rx: oneshot::Receiver<TurnOutcome>) {
        tokio::select! {
            outcome = &mut outcome_rx => {
                println!();
                match outcome.unwrap_or(TurnOutcome::Cancelled) {
                    TurnOutcome::Completed => {}
                    TurnOutcome::Failed => {
                        eprintln!("{}", "The reply failed; see the transcript.".red());
                    }
                    TurnOutcome::Cancelled => {
                        println!("{}", "(reply cancelled)".dimmed());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                self.manager.cancel_turn().await;
                println!();
                println!("{}", "(reply cancelled)".dimmed());
            }
        }
    }
}
