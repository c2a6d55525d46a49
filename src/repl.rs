//! Interactive front end.
//!
//! Reads lines with `rustyline`, feeds them through the quoting grammar
//! and dispatches them on the shared [`Shell`]. Tab completion offers verb
//! names for the first word and node paths for path arguments, using the
//! shell's suggestion cache.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::debug;

use crate::command::{Command, Verb, EXIT};
use crate::path;
use crate::shell::Shell;
use crate::Result;

/// Prompt shown before each line.
pub const PROMPT: &str = ">>> ";

/// Run the interactive loop until `exit` or end of input.
pub fn run(shell: Shell) -> Result<()> {
    let shell = Rc::new(RefCell::new(shell));
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ShellHelper {
        shell: Rc::clone(&shell),
    }));

    println!(
        "zk-shell {}: an interactive tree store client",
        env!("CARGO_PKG_VERSION")
    );

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            editor.add_history_entry(line.as_str())?;
        }

        let cmd = Command::parse(&line);
        if cmd.is_exit() {
            break;
        }

        let mut out = io::stdout().lock();
        shell.borrow_mut().run(&cmd, &mut out);
        out.flush()?;
    }

    shell.borrow_mut().shutdown();
    Ok(())
}

/// Completion candidates for `line` with the cursor at `pos`.
///
/// Returns the byte offset the candidates replace from, and the
/// candidates themselves.
pub fn complete(shell: &mut Shell, line: &str, pos: usize) -> (usize, Vec<String>) {
    let head = &line[..pos];
    let start = head.rfind(' ').map_or(0, |i| i + 1);
    let word = &head[start..];
    let mut before = head[..start].split(' ').filter(|t| !t.is_empty());

    let Some(verb) = before.next() else {
        let verbs = Verb::ALL
            .iter()
            .map(Verb::as_str)
            .chain([EXIT])
            .filter(|v| v.starts_with(word))
            .map(str::to_string)
            .collect();
        return (start, verbs);
    };

    let takes_path = verb.parse::<Verb>().is_ok_and(|v| v.takes_path());
    if !takes_path || before.next().is_some() {
        return (start, Vec::new());
    }
    (start, complete_path(shell, word))
}

fn complete_path(shell: &mut Shell, word: &str) -> Vec<String> {
    let word = if word.is_empty() { path::ROOT } else { word };
    let Some(slash) = word.rfind('/') else {
        return Vec::new();
    };
    let parent = path::normalize(&word[..=slash]);
    let prefix = &word[slash + 1..];

    let candidates: Vec<String> = shell
        .suggest_children(parent)
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .map(|name| path::join(parent, &name))
        .collect();
    debug!(parent, prefix, count = candidates.len(), "path completion");
    candidates
}

/// `rustyline` adapter over the shared shell.
struct ShellHelper {
    shell: Rc<RefCell<Shell>>,
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, items) = complete(&mut self.shell.borrow_mut(), line, pos);
        let pairs = items
            .into_iter()
            .map(|item| Pair {
                display: item.clone(),
                replacement: item,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}
