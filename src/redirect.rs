//! Redirection: swapping files onto the standard streams and back.
//!
//! [`apply`] opens every redirection target a simple command carries,
//! remembers the original standard descriptors, and rebinds the streams.
//! [`restore`](SavedIo::restore) undoes the swap and closes everything that
//! was opened. The two must pair up on every exit path of a redirected
//! command, including built-in paths that never reach exec.

use std::fs::{File, OpenOptions};
use std::os::fd::{IntoRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;

use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{close, dup, dup2};

use crate::command::SimpleCommand;
use crate::error::ShellError;
use crate::word;

/// Creation mode for redirection targets: rw-r--r--.
const CREATE_MODE: u32 = 0o644;

/// One rebound standard stream: which stream, the duplicate of its original
/// descriptor, and the descriptor opened for the target file.
#[derive(Debug)]
struct Swap {
    stream: RawFd,
    saved: RawFd,
    opened: RawFd,
}

/// The original standard-stream descriptors of a redirected command, plus
/// the descriptors opened for its targets.
///
/// Dropping a `SavedIo` without calling [`restore`](Self::restore) leaks the
/// swap, hence the `must_use`.
#[derive(Debug)]
#[must_use = "redirected streams must be restored on every exit path"]
pub struct SavedIo {
    swaps: Vec<Swap>,
}

impl SavedIo {
    /// Re-duplicate the saved descriptors back onto the standard streams and
    /// close every descriptor [`apply`] opened, the saved duplicates
    /// included. Best-effort: a failing close cannot be meaningfully
    /// reported at this point.
    pub fn restore(self) {
        for swap in self.swaps.into_iter().rev() {
            let _ = dup2(swap.saved, swap.stream);
            let _ = close(swap.saved);
            let _ = close(swap.opened);
        }
    }
}

/// Open every redirection target of `cmd` and rebind the standard streams.
///
/// Streams are processed in input, output, error order. A target that cannot
/// be opened yields [`ShellError::RedirectOpen`] naming the resolved path;
/// any streams already rebound at that point are restored before returning,
/// so the caller observes all-or-nothing behavior.
pub fn apply(cmd: &SimpleCommand) -> Result<SavedIo, ShellError> {
    let mut saved = SavedIo { swaps: Vec::new() };
    match apply_all(cmd, &mut saved) {
        Ok(()) => Ok(saved),
        Err(err) => {
            saved.restore();
            Err(err)
        }
    }
}

fn apply_all(cmd: &SimpleCommand, saved: &mut SavedIo) -> Result<(), ShellError> {
    let (out_append, err_append) = effective_append(cmd);

    if let Some(target) = &cmd.input {
        let path = word::resolve(target);
        let file = File::open(&path).map_err(|source| ShellError::RedirectOpen {
            path: path.clone(),
            source,
        })?;
        saved.swaps.push(swap_stream(STDIN_FILENO, file)?);
    }

    if let Some(target) = &cmd.output {
        let path = word::resolve(target);
        let file = open_for_write(&path, out_append)?;
        saved.swaps.push(swap_stream(STDOUT_FILENO, file)?);
    }

    if let Some(target) = &cmd.error {
        let path = word::resolve(target);
        let file = open_for_write(&path, err_append)?;
        saved.swaps.push(swap_stream(STDERR_FILENO, file)?);
    }

    Ok(())
}

/// Decide append-vs-truncate for the output and error streams.
///
/// Each stream appends when its own append flag is set. Additionally, when
/// both streams target the same resolved path, both open in append mode:
/// truncating the shared file on the second open would discard what the
/// first stream already wrote.
pub(crate) fn effective_append(cmd: &SimpleCommand) -> (bool, bool) {
    let same_target = match (&cmd.output, &cmd.error) {
        (Some(out), Some(err)) => word::resolve(out) == word::resolve(err),
        _ => false,
    };
    (cmd.out_append || same_target, cmd.err_append || same_target)
}

fn open_for_write(path: &str, append: bool) -> Result<File, ShellError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(append)
        .truncate(!append)
        .mode(CREATE_MODE)
        .open(path)
        .map_err(|source| ShellError::RedirectOpen {
            path: path.to_string(),
            source,
        })
}

/// Duplicate `stream` for later restoration, then rebind it onto `file`.
fn swap_stream(stream: RawFd, file: File) -> Result<Swap, ShellError> {
    let saved = dup(stream)?;
    let opened = file.into_raw_fd();
    if let Err(errno) = dup2(opened, stream) {
        let _ = close(opened);
        let _ = close(saved);
        return Err(errno.into());
    }
    Ok(Swap {
        stream,
        saved,
        opened,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{SimpleCommand, Word};
    use nix::sys::stat::fstat;
    use std::io::Write;

    #[test]
    fn append_flags_pass_through_when_targets_differ() {
        let cmd = SimpleCommand::new("x", &[])
            .with_output(Word::literal("/tmp/a"), true)
            .with_error(Word::literal("/tmp/b"), false);
        assert_eq!(effective_append(&cmd), (true, false));
    }

    #[test]
    fn same_target_forces_append_on_both_streams() {
        let cmd = SimpleCommand::new("x", &[])
            .with_output(Word::literal("/tmp/shared"), false)
            .with_error(Word::literal("/tmp/shared"), false);
        assert_eq!(effective_append(&cmd), (true, true));
    }

    #[test]
    fn same_target_detection_uses_resolved_paths() {
        let _guard = crate::test_lock::lock();
        crate::env::assign("MINISH_REDIR_TEST_SHARED", "/tmp/shared");
        let cmd = SimpleCommand::new("x", &[])
            .with_output(Word::variable("MINISH_REDIR_TEST_SHARED"), false)
            .with_error(Word::literal("/tmp/shared"), true);
        assert_eq!(effective_append(&cmd), (true, true));
    }

    #[test]
    fn open_failure_names_the_path() {
        let cmd = SimpleCommand::new("x", &[])
            .with_input(Word::literal("/definitely/not/here/minish-test"));
        match apply(&cmd) {
            Err(ShellError::RedirectOpen { path, .. }) => {
                assert_eq!(path, "/definitely/not/here/minish-test");
            }
            other => panic!("expected RedirectOpen, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn input_swap_round_trips_stdin() {
        let _guard = crate::test_lock::lock();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("in.txt");
        let mut f = std::fs::File::create(&path).expect("create");
        writeln!(f, "payload").expect("write");
        drop(f);

        let before = fstat(STDIN_FILENO).expect("fstat before");

        let cmd = SimpleCommand::new("x", &[])
            .with_input(Word::literal(path.to_string_lossy().as_ref()));
        let saved = apply(&cmd).expect("apply");

        let during = fstat(STDIN_FILENO).expect("fstat during");
        assert_ne!(
            (before.st_dev, before.st_ino),
            (during.st_dev, during.st_ino),
            "stdin should point at the redirection target"
        );

        saved.restore();

        let after = fstat(STDIN_FILENO).expect("fstat after");
        assert_eq!(
            (before.st_dev, before.st_ino),
            (after.st_dev, after.st_ino),
            "stdin should be restored to its original target"
        );
    }
}
