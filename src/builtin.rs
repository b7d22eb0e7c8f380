//! Built-in commands: interpreted by the shell process itself.
//!
//! Only four verbs are built in: `exit`/`quit`, `true`, `false` and `cd`.
//! Variable assignment (`FOO=bar`) is recognized structurally from the verb
//! word, before the verb text is even looked at; see the executor.

use std::path::PathBuf;

use crate::command::Word;
use crate::env;
use crate::word;

/// The built-in verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    /// `exit` / `quit`: terminate the whole shell process with status 0.
    Exit,
    /// `true`: status 0.
    True,
    /// `false`: status 1.
    False,
    /// `cd`: change the working directory of the shell process.
    Cd,
}

/// Map a resolved verb to a built-in, `None` for external programs.
pub(crate) fn classify(verb: &str) -> Option<Builtin> {
    match verb {
        "exit" | "quit" => Some(Builtin::Exit),
        "true" => Some(Builtin::True),
        "false" => Some(Builtin::False),
        "cd" => Some(Builtin::Cd),
        _ => None,
    }
}

/// Change the working directory.
///
/// With no target, changes to `$HOME`; with a target word, to its resolved
/// path. Returns `false` when the change fails (missing HOME, nonexistent or
/// unreachable directory). Never fatal to the shell.
pub(crate) fn change_dir(target: Option<&Word>) -> bool {
    let path = match target {
        Some(word) => PathBuf::from(word::resolve(word)),
        None => match env::lookup("HOME") {
            Some(home) => PathBuf::from(home),
            None => return false,
        },
    };
    std::env::set_current_dir(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_knows_every_builtin() {
        assert_eq!(classify("exit"), Some(Builtin::Exit));
        assert_eq!(classify("quit"), Some(Builtin::Exit));
        assert_eq!(classify("true"), Some(Builtin::True));
        assert_eq!(classify("false"), Some(Builtin::False));
        assert_eq!(classify("cd"), Some(Builtin::Cd));
        assert_eq!(classify("echo"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn cd_to_missing_directory_fails_and_keeps_cwd() {
        let _guard = crate::test_lock::lock();
        let before = std::env::current_dir().expect("cwd");
        let ok = change_dir(Some(&Word::literal("/nonexistent-minish-dir")));
        assert!(!ok);
        assert_eq!(std::env::current_dir().expect("cwd"), before);
    }

    #[test]
    fn cd_to_existing_directory_succeeds() {
        let _guard = crate::test_lock::lock();
        let before = std::env::current_dir().expect("cwd");
        let ok = change_dir(Some(&Word::literal("/")));
        // Restore early so a failing assertion doesn't poison other tests.
        std::env::set_current_dir(&before).ok();
        assert!(ok);
    }
}
