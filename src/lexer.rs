//! Lexical analysis of a command line into operator and word tokens.

use thiserror::Error;

use crate::command::WordPart;

/// A token produced by lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word, possibly composed of several fragments. An unquoted `=` gets
    /// its own literal fragment so that assignment detection can look at the
    /// verb's fragment list.
    Word(Vec<WordPart>),
    /// `;`
    Semicolon,
    /// `&`
    Ampersand,
    /// `&&`
    AndIf,
    /// `||`
    OrIf,
    /// `|`
    Pipe,
    /// `<`
    RedirectIn,
    /// `>`
    RedirectOut,
    /// `>>`
    RedirectOutAppend,
    /// `2>`
    RedirectErr,
    /// `2>>`
    RedirectErrAppend,
    /// `&>`: both standard output and standard error.
    RedirectBoth,
}

/// Errors that can occur during lexical analysis.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexingError {
    /// A closing single or double quote was not found.
    #[error("unterminated quote")]
    UnfinishedQuote,
    /// A closing brace for `${...}` was not found.
    #[error("unterminated ${{...}} reference")]
    UnfinishedParamSubst,
    /// `$(...)` is not supported by this shell.
    #[error("command substitution is not supported")]
    UnsupportedCommandSubst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    current_word: Vec<WordPart>,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            current_word: Vec::new(),
            buffer: String::new(),
        }
    }

    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            _ => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' => {}
            ';' => out.push(Token::Semicolon),
            '|' => {
                if self.peek_char() == Some('|') {
                    self.pos += 1;
                    out.push(Token::OrIf);
                } else {
                    out.push(Token::Pipe);
                }
            }
            '&' => match self.peek_char() {
                Some('&') => {
                    self.pos += 1;
                    out.push(Token::AndIf);
                }
                Some('>') => {
                    self.pos += 1;
                    out.push(Token::RedirectBoth);
                }
                _ => out.push(Token::Ampersand),
            },
            '<' => out.push(Token::RedirectIn),
            '>' => {
                if self.peek_char() == Some('>') {
                    self.pos += 1;
                    out.push(Token::RedirectOutAppend);
                } else {
                    out.push(Token::RedirectOut);
                }
            }
            // `2>` / `2>>` only when the digit starts a fresh token, so
            // `echo 2 > f` still passes the literal 2 through.
            '2' if self.peek_char() == Some('>') => {
                self.pos += 1;
                if self.peek_char() == Some('>') {
                    self.pos += 1;
                    out.push(Token::RedirectErrAppend);
                } else {
                    out.push(Token::RedirectErr);
                }
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '$' => {
                self.read_variable()?;
                self.state = LexingState::ReadingWord;
            }
            '=' => {
                self.current_word.push(WordPart::Literal("=".to_string()));
                self.state = LexingState::ReadingWord;
            }
            _ => {
                self.buffer.push(ch);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            ';' | '|' | '&' | '<' | '>' => {
                self.finish_word(out);
                self.state = LexingState::Start;
                self.handle_start(ch, out)?;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            '$' => self.read_variable()?,
            '=' => {
                self.flush_literal();
                self.current_word.push(WordPart::Literal("=".to_string()));
            }
            _ => self.buffer.push(ch),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        if ch == '\'' {
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '$' => self.read_variable()?,
            _ => self.buffer.push(ch),
        }
        Ok(())
    }

    /// Consume a variable reference after its `$`. A bare `$` with nothing
    /// referenceable after it stays a literal dollar sign.
    fn read_variable(&mut self) -> Result<(), LexingError> {
        match self.peek_char() {
            Some('(') => Err(LexingError::UnsupportedCommandSubst),
            Some('{') => {
                self.pos += 1;
                let mut name = String::new();
                loop {
                    match self.read_char() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(LexingError::UnfinishedParamSubst),
                    }
                }
                self.flush_literal();
                self.current_word.push(WordPart::Variable(name));
                Ok(())
            }
            Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                self.flush_literal();
                self.current_word.push(WordPart::Variable(name));
                Ok(())
            }
            _ => {
                self.buffer.push('$');
                Ok(())
            }
        }
    }

    fn flush_literal(&mut self) {
        if !self.buffer.is_empty() {
            self.current_word
                .push(WordPart::Literal(std::mem::take(&mut self.buffer)));
        }
    }

    fn finish_word(&mut self, out: &mut Vec<Token>) {
        self.flush_literal();
        if !self.current_word.is_empty() {
            out.push(Token::Word(std::mem::take(&mut self.current_word)));
        }
    }
}

/// Tokenize one command line.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    LexingFSM::new(line).make_tokens()
}
