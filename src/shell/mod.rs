use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustyline::{config::Configurer, error::ReadlineError, history::FileHistory, Editor};
use tracing::{info, warn};

mod executor;

use crate::{
    core::{
        commands::{CommandExecutor, Outcome, FAREWELL},
        config::Config,
    },
    error::ShellError,
    highlight::SyntaxHighlighter,
    input::ShellHelper,
    process::{SignalCallbacks, SignalGuard, SignalPolicy},
};

use executor::CommandHandler;

const WELCOME: &str = "cronsh: type `exit` or press Ctrl-D to leave.";

pub struct Shell {
    pub(crate) editor: Editor<ShellHelper, FileHistory>,
    pub(crate) current_dir: String,
    pub(crate) config: Config,
    pub(crate) executor: CommandExecutor,
    pub(crate) highlighter: SyntaxHighlighter,
    reload_requested: Arc<AtomicBool>,
    _signals: SignalGuard,
}

impl Shell {
    pub fn new() -> Result<Self, ShellError> {
        let mut editor = Editor::<ShellHelper, FileHistory>::new()?;
        editor.set_helper(Some(ShellHelper::new()));
        editor.set_auto_add_history(true);

        let current_dir = env::current_dir()?.to_string_lossy().to_string();

        let mut config = Config::new()?;
        config.load()?;
        let executor = CommandExecutor::new(config.settings());

        let reload_requested = Arc::new(AtomicBool::new(false));
        let signals = install_signals(Arc::clone(&reload_requested))?;

        let mut shell = Shell {
            editor,
            current_dir,
            config,
            executor,
            highlighter: SyntaxHighlighter::new(),
            reload_requested,
            _signals: signals,
        };
        shell.load_history();
        Ok(shell)
    }

    pub fn run(&mut self) -> Result<(), ShellError> {
        println!("{}", self.highlighter.highlight_success(WELCOME));

        loop {
            self.reload_if_requested();

            let prompt = format!("{} > ", self.current_dir);
            match self.editor.readline(&prompt) {
                Ok(line) => match self.execute_command(&line) {
                    Ok(Outcome::Exit) => break,
                    Ok(Outcome::Continue) => {}
                    Err(e) => self.report(&e),
                },
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!("{}", FAREWELL);
                    break;
                }
                Err(e) => {
                    self.report(&ShellError::Readline(e));
                    continue;
                }
            }
        }
        Ok(())
    }

    fn report(&self, error: &ShellError) {
        eprintln!("{}", self.highlighter.highlight_error(&error.to_string()));
    }

    /// Seeds arrow-key recall from the persistent history file.
    fn load_history(&mut self) {
        let entries = match self.executor.history_log().entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "cannot read history file");
                return;
            }
        };
        for entry in entries {
            if let Err(e) = self.editor.add_history_entry(entry.as_str()) {
                warn!(error = %e, "cannot seed line editor history");
                return;
            }
        }
    }

    fn reload_if_requested(&mut self) {
        if !self.reload_requested.swap(false, Ordering::SeqCst) {
            return;
        }

        match self.config.load() {
            Ok(()) => {
                self.executor = CommandExecutor::new(self.config.settings());
                info!(rc = ?self.config.rc_path(), "configuration reloaded");
            }
            Err(e) => self.report(&ShellError::Config(e)),
        }
    }
}

fn install_signals(reload_requested: Arc<AtomicBool>) -> Result<SignalGuard, ShellError> {
    let callbacks = SignalCallbacks {
        on_reload: Box::new(move || {
            println!("\nConfiguration reloaded");
            reload_requested.store(true, Ordering::SeqCst);
        }),
        on_interrupt: Box::new(|| {}),
    };
    Ok(SignalPolicy::new(callbacks).install()?)
}
