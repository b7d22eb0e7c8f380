//! Construction of the binary command tree from a token stream.
//!
//! Operators bind loosest first: `;`, then `&`, then `&&`/`||`, then `|`.
//! All are left-associative, so `a ; b ; c` becomes
//! `Sequence(Sequence(a, b), c)`.

use thiserror::Error;

use crate::command::{CommandNode, Operator, SimpleCommand, Word};
use crate::lexer::Token;

/// Errors that can occur while building the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsingError {
    /// A token that cannot start or continue a command at this position.
    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),
    /// An operator with no command on its right-hand side.
    #[error("expected a command")]
    ExpectedCommand,
    /// A redirection operator not followed by a target word.
    #[error("expected a redirection target")]
    ExpectedRedirectTarget,
}

struct TreeBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl TreeBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        TreeBuilder { tokens, pos: 0 }
    }

    fn build(mut self) -> Result<Option<CommandNode>, ParsingError> {
        if self.peek().is_none() {
            return Ok(None);
        }
        let tree = self.parse_sequence()?;
        if let Some(extra) = self.peek() {
            return Err(ParsingError::UnexpectedToken(extra.clone()));
        }
        Ok(Some(tree))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// sequence: parallel (';' parallel)* — a trailing ';' is accepted.
    fn parse_sequence(&mut self) -> Result<CommandNode, ParsingError> {
        let mut node = self.parse_parallel()?;
        while let Some(Token::Semicolon) = self.peek() {
            self.consume();
            if self.peek().is_none() {
                break;
            }
            let right = self.parse_parallel()?;
            node = CommandNode::operator(Operator::Sequence, node, right);
        }
        Ok(node)
    }

    /// parallel: conditional ('&' conditional)*
    ///
    /// `&` is a binary operator here; a trailing `&` (background job) is not
    /// supported and reported as a missing right-hand command.
    fn parse_parallel(&mut self) -> Result<CommandNode, ParsingError> {
        let mut node = self.parse_conditional()?;
        while let Some(Token::Ampersand) = self.peek() {
            self.consume();
            let right = self.parse_conditional()?;
            node = CommandNode::operator(Operator::Parallel, node, right);
        }
        Ok(node)
    }

    /// conditional: pipeline (('&&' | '||') pipeline)*
    fn parse_conditional(&mut self) -> Result<CommandNode, ParsingError> {
        let mut node = self.parse_pipeline()?;
        loop {
            let op = match self.peek() {
                Some(Token::AndIf) => Operator::IfZero,
                Some(Token::OrIf) => Operator::IfNonZero,
                _ => break,
            };
            self.consume();
            let right = self.parse_pipeline()?;
            node = CommandNode::operator(op, node, right);
        }
        Ok(node)
    }

    /// pipeline: simple ('|' simple)*
    fn parse_pipeline(&mut self) -> Result<CommandNode, ParsingError> {
        let mut node = self.parse_simple()?;
        while let Some(Token::Pipe) = self.peek() {
            self.consume();
            let right = self.parse_simple()?;
            node = CommandNode::operator(Operator::Pipe, node, right);
        }
        Ok(node)
    }

    /// simple: (word | redirect)+ — the first word is the verb, later words
    /// are parameters, redirections attach to the command wherever they
    /// appear.
    fn parse_simple(&mut self) -> Result<CommandNode, ParsingError> {
        let mut cmd = SimpleCommand::default();
        let mut saw_verb = false;
        let mut saw_redirect = false;

        loop {
            match self.peek() {
                Some(Token::Word(_)) => {
                    let word = self.take_word()?;
                    if saw_verb {
                        cmd.params.push(word);
                    } else {
                        cmd.verb = word;
                        saw_verb = true;
                    }
                }
                Some(Token::RedirectIn) => {
                    self.consume();
                    cmd.input = Some(self.take_word()?);
                    saw_redirect = true;
                }
                Some(Token::RedirectOut) | Some(Token::RedirectOutAppend) => {
                    let append = matches!(self.consume(), Some(Token::RedirectOutAppend));
                    cmd.output = Some(self.take_word()?);
                    cmd.out_append = append;
                    saw_redirect = true;
                }
                Some(Token::RedirectErr) | Some(Token::RedirectErrAppend) => {
                    let append = matches!(self.consume(), Some(Token::RedirectErrAppend));
                    cmd.error = Some(self.take_word()?);
                    cmd.err_append = append;
                    saw_redirect = true;
                }
                Some(Token::RedirectBoth) => {
                    self.consume();
                    let target = self.take_word()?;
                    cmd.output = Some(target.clone());
                    cmd.error = Some(target);
                    cmd.out_append = false;
                    cmd.err_append = false;
                    saw_redirect = true;
                }
                _ => break,
            }
        }

        if !saw_verb && !saw_redirect {
            return Err(ParsingError::ExpectedCommand);
        }
        Ok(CommandNode::simple(cmd))
    }

    fn take_word(&mut self) -> Result<Word, ParsingError> {
        match self.consume() {
            Some(Token::Word(parts)) => Ok(Word::from_parts(parts)),
            Some(token) => Err(ParsingError::UnexpectedToken(token)),
            None => Err(ParsingError::ExpectedRedirectTarget),
        }
    }
}

/// Build a command tree from a token stream.
///
/// Returns `Ok(None)` for an empty stream (a blank line is not an error,
/// there is simply nothing to evaluate).
pub fn construct_tree(tokens: Vec<Token>) -> Result<Option<CommandNode>, ParsingError> {
    TreeBuilder::from(tokens).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_tokens;

    fn parse(line: &str) -> CommandNode {
        construct_tree(split_into_tokens(line).unwrap())
            .unwrap()
            .expect("non-empty tree")
    }

    fn verb_of(node: &CommandNode) -> String {
        crate::word::resolve(&node.as_simple().expect("leaf").verb)
    }

    #[test]
    fn empty_line_yields_no_tree() {
        assert!(construct_tree(vec![]).unwrap().is_none());
        assert!(
            construct_tree(split_into_tokens("   ").unwrap())
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn simple_command_with_params() {
        let tree = parse("echo a b");
        let cmd = tree.as_simple().expect("leaf");
        assert_eq!(crate::word::resolve(&cmd.verb), "echo");
        assert_eq!(cmd.params.len(), 2);
    }

    #[test]
    fn precedence_sequence_loosest_pipe_tightest() {
        // a ; b && c | d  =>  Sequence(a, IfZero(b, Pipe(c, d)))
        let tree = parse("a ; b && c | d");
        let CommandNode::Operator { op, left, right } = &tree else {
            panic!("expected operator root");
        };
        assert_eq!(*op, Operator::Sequence);
        assert_eq!(verb_of(left), "a");

        let CommandNode::Operator { op, left, right } = right.as_ref() else {
            panic!("expected conditional under sequence");
        };
        assert_eq!(*op, Operator::IfZero);
        assert_eq!(verb_of(left), "b");

        let CommandNode::Operator { op, left, right } = right.as_ref() else {
            panic!("expected pipe under conditional");
        };
        assert_eq!(*op, Operator::Pipe);
        assert_eq!(verb_of(left), "c");
        assert_eq!(verb_of(right), "d");
    }

    #[test]
    fn sequence_is_left_associative() {
        let tree = parse("a ; b ; c");
        let CommandNode::Operator { op, left, right } = &tree else {
            panic!("expected operator root");
        };
        assert_eq!(*op, Operator::Sequence);
        assert_eq!(verb_of(right), "c");
        let CommandNode::Operator { op, left, right } = left.as_ref() else {
            panic!("expected nested sequence");
        };
        assert_eq!(*op, Operator::Sequence);
        assert_eq!(verb_of(left), "a");
        assert_eq!(verb_of(right), "b");
    }

    #[test]
    fn parallel_binds_between_sequence_and_conditional() {
        // a & b && c  =>  Parallel(a, IfZero(b, c))
        let tree = parse("a & b && c");
        let CommandNode::Operator { op, left, right } = &tree else {
            panic!("expected operator root");
        };
        assert_eq!(*op, Operator::Parallel);
        assert_eq!(verb_of(left), "a");
        let CommandNode::Operator { op, .. } = right.as_ref() else {
            panic!("expected conditional on the right");
        };
        assert_eq!(*op, Operator::IfZero);
    }

    #[test]
    fn redirections_attach_to_the_simple_command() {
        let tree = parse("cmd < in > out 2>> err");
        let cmd = tree.as_simple().expect("leaf");
        assert!(cmd.input.is_some());
        assert!(cmd.output.is_some());
        assert!(!cmd.out_append);
        assert!(cmd.error.is_some());
        assert!(cmd.err_append);
    }

    #[test]
    fn redirect_both_targets_one_word() {
        let tree = parse("cmd &> all.txt");
        let cmd = tree.as_simple().expect("leaf");
        assert_eq!(cmd.output, cmd.error);
        assert!(cmd.output.is_some());
    }

    #[test]
    fn trailing_semicolon_is_accepted() {
        let tree = parse("echo done ;");
        assert_eq!(verb_of(&tree), "echo");
    }

    #[test]
    fn parse_errors() {
        let tokens = split_into_tokens("&& a").unwrap();
        assert!(matches!(
            construct_tree(tokens),
            Err(ParsingError::ExpectedCommand)
        ));

        let tokens = split_into_tokens("a &&").unwrap();
        assert!(matches!(
            construct_tree(tokens),
            Err(ParsingError::ExpectedCommand)
        ));

        let tokens = split_into_tokens("a >").unwrap();
        assert!(matches!(
            construct_tree(tokens),
            Err(ParsingError::ExpectedRedirectTarget)
        ));

        let tokens = split_into_tokens("a & ").unwrap();
        assert!(matches!(
            construct_tree(tokens),
            Err(ParsingError::ExpectedCommand)
        ));
    }
}
