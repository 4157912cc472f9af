use std::{borrow::Cow, collections::BTreeSet, env, fs};

use rustyline::{
    completion::{Completer, FilenameCompleter, Pair},
    highlight::{CmdKind, Highlighter},
    hint::Hinter,
    validate::Validator,
    Context, Helper,
};

use crate::core::commands::Builtin;
use crate::highlight::SyntaxHighlighter;

/// Line editor helper: command-name and path completion plus highlighting.
pub struct ShellHelper {
    commands: BTreeSet<String>,
    files: FilenameCompleter,
    highlighter: SyntaxHighlighter,
}

impl Default for ShellHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellHelper {
    pub fn new() -> Self {
        let mut helper = Self {
            commands: BTreeSet::new(),
            files: FilenameCompleter::new(),
            highlighter: SyntaxHighlighter::new(),
        };
        helper.refresh_commands();
        helper
    }

    pub fn refresh_commands(&mut self) {
        self.commands = Builtin::NAMES.iter().map(|name| name.to_string()).collect();
        self.commands.extend(path_commands());
    }

    pub fn complete_command(&self, prefix: &str) -> Vec<Pair> {
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect()
    }
}

fn path_commands() -> Vec<String> {
    let Some(path_var) = env::var_os("PATH") else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for dir in env::split_paths(&path_var) {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let is_file = entry
                .file_type()
                .map(|t| t.is_file() || t.is_symlink())
                .unwrap_or(false);
            if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names
}

impl Helper for ShellHelper {}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight_command(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(self.highlighter.highlight_hint(hint))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Validator for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before_cursor = &line[..pos];
        let word_start = before_cursor
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);

        if before_cursor[..word_start].trim().is_empty() {
            Ok((word_start, self.complete_command(&before_cursor[word_start..])))
        } else {
            self.files.complete(line, pos, ctx)
        }
    }
}
