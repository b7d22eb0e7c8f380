//! The command tree consumed by the evaluator.
//!
//! A parsed command line is a binary tree: leaves hold one [`SimpleCommand`],
//! internal nodes join two subtrees with an [`Operator`]. The tree is built
//! once by the parser (or by hand in tests) and is read-only during
//! evaluation.

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// One fragment of a [`Word`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Literal text, used verbatim.
    Literal(String),
    /// The name of an environment variable whose value is substituted at
    /// resolution time. An unset variable substitutes the empty string.
    Variable(String),
}

/// A shell word: an ordered sequence of fragments whose concatenation, after
/// variable substitution, yields one string.
///
/// `echo $HOME/bin` produces the words `[Literal("echo")]` and
/// `[Variable("HOME"), Literal("/bin")]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Word {
    pub parts: Vec<WordPart>,
}

impl Word {
    /// A word made of a single literal fragment.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Literal(text.into())],
        }
    }

    /// A word made of a single variable-reference fragment.
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            parts: vec![WordPart::Variable(name.into())],
        }
    }

    /// A word built from an explicit fragment list.
    pub fn from_parts(parts: Vec<WordPart>) -> Self {
        Self { parts }
    }

    /// True when the word carries no fragments at all. A simple command with
    /// an empty verb is structurally invalid.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// A single program invocation: verb, parameters and redirections.
///
/// Immutable during evaluation; owned by the leaf node that carries it.
#[derive(Debug, Clone, Default)]
pub struct SimpleCommand {
    /// The command name. May carry an `=` fragment in second position, in
    /// which case the command is a variable assignment (`FOO=bar`).
    pub verb: Word,
    /// Positional parameters, in order.
    pub params: Vec<Word>,
    /// Redirection target for standard input (`< file`).
    pub input: Option<Word>,
    /// Redirection target for standard output (`> file`, `>> file`).
    pub output: Option<Word>,
    /// Redirection target for standard error (`2> file`, `2>> file`).
    pub error: Option<Word>,
    /// Open standard output in append mode instead of truncating.
    pub out_append: bool,
    /// Open standard error in append mode instead of truncating.
    pub err_append: bool,
}

impl SimpleCommand {
    /// Convenience constructor for a command with a literal verb and literal
    /// parameters, no redirections. Mostly useful in tests.
    pub fn new(verb: &str, params: &[&str]) -> Self {
        Self {
            verb: Word::literal(verb),
            params: params.iter().map(|p| Word::literal(*p)).collect(),
            ..Self::default()
        }
    }

    /// Redirect standard input from `target`.
    pub fn with_input(mut self, target: Word) -> Self {
        self.input = Some(target);
        self
    }

    /// Redirect standard output to `target`; `append` selects `>>` over `>`.
    pub fn with_output(mut self, target: Word, append: bool) -> Self {
        self.output = Some(target);
        self.out_append = append;
        self
    }

    /// Redirect standard error to `target`; `append` selects `2>>` over `2>`.
    pub fn with_error(mut self, target: Word, append: bool) -> Self {
        self.error = Some(target);
        self.err_append = append;
        self
    }
}

/// Operator joining the two children of an internal tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `left ; right`: run left, then right; the right status wins.
    Sequence,
    /// `left & right`: run both concurrently, wait for both.
    Parallel,
    /// `left | right`: left's standard output feeds right's standard input.
    Pipe,
    /// `left && right`: run right only if left exited with 0.
    IfZero,
    /// `left || right`: run right only if left exited non-zero.
    IfNonZero,
}

/// A node of the command tree.
#[derive(Debug, Clone)]
pub enum CommandNode {
    /// Leaf: one simple command.
    Simple(SimpleCommand),
    /// Internal node: an operator joining two subtrees. Children are always
    /// present; the parser never produces a one-armed operator.
    Operator {
        op: Operator,
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
}

impl CommandNode {
    /// Wrap a simple command in a leaf node.
    pub fn simple(cmd: SimpleCommand) -> Self {
        CommandNode::Simple(cmd)
    }

    /// Join two subtrees with an operator.
    pub fn operator(op: Operator, left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The simple command carried by this node, if it is a leaf.
    pub fn as_simple(&self) -> Option<&SimpleCommand> {
        match self {
            CommandNode::Simple(cmd) => Some(cmd),
            CommandNode::Operator { .. } => None,
        }
    }

    /// Short tag used in trace diagnostics.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            CommandNode::Simple(_) => "simple",
            CommandNode::Operator { op, .. } => match op {
                Operator::Sequence => "sequence",
                Operator::Parallel => "parallel",
                Operator::Pipe => "pipe",
                Operator::IfZero => "if-zero",
                Operator::IfNonZero => "if-nonzero",
            },
        }
    }
}
