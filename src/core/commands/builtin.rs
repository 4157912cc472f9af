use super::CommandError;

pub const FAREWELL: &str = "Leaving cronsh. Goodbye!";

/// Which built-in a command line names. `External` covers everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Builtin(Builtin),
    External(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    History,
    MountVfs,
    Snapshot(String),
    BootCheck(String),
    Echo(Vec<String>),
    Env(String),
    Cd(Option<String>),
}

impl Builtin {
    pub const NAMES: &'static [&'static str] = &[
        "exit",
        "\\q",
        "history",
        "mount-vfs",
        "\\cron",
        "snapshot",
        "\\mem",
        "bootcheck",
        "\\l",
        "echo",
        "env",
        "\\e",
        "cd",
    ];

    pub fn is_builtin_name(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }
}

impl CommandKind {
    /// First match wins. A built-in missing its required argument falls
    /// through to `External`.
    pub fn classify(args: Vec<String>) -> Option<Self> {
        let name = args.first()?.as_str();
        let first_arg = args.get(1).cloned();

        let builtin = match (name, first_arg) {
            ("exit" | "\\q", _) => Some(Builtin::Exit),
            ("history", _) => Some(Builtin::History),
            ("mount-vfs" | "\\cron", _) => Some(Builtin::MountVfs),
            ("snapshot" | "\\mem", Some(pid)) => Some(Builtin::Snapshot(pid)),
            ("bootcheck" | "\\l", Some(device)) => Some(Builtin::BootCheck(device)),
            ("echo", _) => Some(Builtin::Echo(args[1..].to_vec())),
            ("env" | "\\e", Some(token)) => Some(Builtin::Env(token)),
            ("cd", target) => Some(Builtin::Cd(target)),
            _ => None,
        };

        Some(match builtin {
            Some(builtin) => CommandKind::Builtin(builtin),
            None => CommandKind::External(args),
        })
    }
}

pub fn echo(words: &[String]) -> String {
    words.join(" ")
}

/// Resolves a `$NAME` token to the variable's value or a not-found message.
pub fn env_lookup(token: &str) -> Result<String, CommandError> {
    let name = token
        .strip_prefix('$')
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CommandError::InvalidArguments("usage: env $NAME".to_string()))?;

    Ok(match std::env::var_os(name) {
        Some(value) => value.to_string_lossy().into_owned(),
        None => format!("environment variable {} not found", name),
    })
}
