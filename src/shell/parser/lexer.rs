use std::iter::Peekable;
use std::str::Chars;

use crate::shell::error::LexError;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Word(String),
    Redirect(RedirectOp),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
}

impl RedirectOp {
    pub fn stream_name(&self) -> &'static str {
        match self {
            RedirectOp::Input => "standard input",
            RedirectOp::Output => "standard output",
        }
    }
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    /// Returns `Ok(None)` once the line is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        match self.peek_char() {
            None => Ok(None),
            Some('<') => {
                self.read_char();
                Ok(Some(Token::Redirect(RedirectOp::Input)))
            }
            Some('>') => {
                self.read_char();
                Ok(Some(Token::Redirect(RedirectOp::Output)))
            }
            Some(_) => self.read_word().map(Some),
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    // Quoted regions glue onto the surrounding word: a"b c"d is one word.
    fn read_word(&mut self) -> Result<Token, LexError> {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || c == '<' || c == '>' {
                break;
            }
            self.read_char();
            match c {
                '"' => self.read_double_quoted(&mut word)?,
                '\'' => self.read_single_quoted(&mut word)?,
                c => word.push(c),
            }
        }

        Ok(Token::Word(word))
    }

    fn read_double_quoted(&mut self, word: &mut String) -> Result<(), LexError> {
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            match (escaped, c) {
                (true, '"') | (true, '\\') => {
                    word.push(c);
                    escaped = false;
                }
                (true, c) => {
                    word.push('\\');
                    word.push(c);
                    escaped = false;
                }
                (false, '\\') => escaped = true,
                (false, '"') => return Ok(()),
                (false, c) => word.push(c),
            }
        }

        Err(LexError::UnmatchedQuote)
    }

    fn read_single_quoted(&mut self, word: &mut String) -> Result<(), LexError> {
        while let Some(c) = self.read_char() {
            if c == '\'' {
                return Ok(());
            }
            word.push(c);
        }

        Err(LexError::UnmatchedQuote)
    }
}

/// Splits one input line into tokens. A blank line yields no tokens.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
