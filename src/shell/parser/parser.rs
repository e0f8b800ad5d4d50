use std::vec::IntoIter;

use super::ast::Command;
use super::lexer::{RedirectOp, Token};
use crate::shell::error::SyntaxError;

pub struct Parser {
    tokens: IntoIter<Token>,
    current_token: Option<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter();
        let current_token = tokens.next();
        Parser {
            tokens,
            current_token,
        }
    }

    fn next_token(&mut self) {
        self.current_token = self.tokens.next();
    }

    pub fn parse_command(&mut self) -> Result<Command, SyntaxError> {
        // Command name
        let program = match self.current_token.take() {
            Some(Token::Word(word)) if !word.is_empty() => word,
            _ => return Err(SyntaxError::MissingCommandName),
        };
        self.next_token();

        let mut arguments = Vec::new();
        let mut stdin = None;
        let mut stdout = None;
        let mut stdin_count = 0;
        let mut stdout_count = 0;

        // Arguments and redirections
        while let Some(token) = self.current_token.take() {
            match token {
                Token::Word(word) => {
                    arguments.push(word);
                    self.next_token();
                }
                Token::Redirect(op) => {
                    let count = match op {
                        RedirectOp::Input => &mut stdin_count,
                        RedirectOp::Output => &mut stdout_count,
                    };
                    *count += 1;
                    if *count > 1 {
                        return Err(SyntaxError::MultipleRedirection(op));
                    }
                    let filename = self.parse_redirection(op)?;
                    match op {
                        RedirectOp::Input => stdin = Some(filename),
                        RedirectOp::Output => stdout = Some(filename),
                    }
                }
            }
        }

        Ok(Command::new(program, arguments, stdin, stdout))
    }

    fn parse_redirection(&mut self, operator: RedirectOp) -> Result<String, SyntaxError> {
        self.next_token(); // skip the operator

        match self.current_token.take() {
            Some(Token::Word(filename)) => {
                self.next_token();
                Ok(filename)
            }
            _ => Err(SyntaxError::MissingFileName(operator)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::lexer::tokenize;

    #[allow(clippy::unwrap_used)]
    fn parse(line: &str) -> Result<Command, SyntaxError> {
        Parser::new(tokenize(line).unwrap()).parse_command()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let cmd = parse("ls -l /tmp").unwrap();
        assert_eq!(cmd.name(), "ls");
        assert_eq!(cmd.arguments(), ["-l", "/tmp"]);
        assert_eq!(cmd.stdin_path(), None);
        assert_eq!(cmd.stdout_path(), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_interleaved_with_arguments() {
        let cmd = parse("sort > out.txt -r < in.txt -n").unwrap();
        assert_eq!(cmd.name(), "sort");
        assert_eq!(cmd.arguments(), ["-r", "-n"]);
        assert_eq!(cmd.stdin_path(), Some("in.txt"));
        assert_eq!(cmd.stdout_path(), Some("out.txt"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_argument_order_is_preserved() {
        let cmd = parse("echo one two < f three").unwrap();
        assert_eq!(cmd.arguments(), ["one", "two", "three"]);
    }

    #[test]
    fn test_missing_command_name() {
        assert_eq!(parse("< in cat"), Err(SyntaxError::MissingCommandName));
        assert_eq!(parse("> out"), Err(SyntaxError::MissingCommandName));
        assert_eq!(parse(r#""" arg"#), Err(SyntaxError::MissingCommandName));
        assert_eq!(
            Parser::new(Vec::new()).parse_command(),
            Err(SyntaxError::MissingCommandName)
        );
    }

    #[test]
    fn test_multiple_stdin() {
        assert_eq!(
            parse("cat < a < b"),
            Err(SyntaxError::MultipleRedirection(RedirectOp::Input))
        );
    }

    #[test]
    fn test_multiple_stdout() {
        assert_eq!(
            parse("cat > a x > b"),
            Err(SyntaxError::MultipleRedirection(RedirectOp::Output))
        );
    }

    #[test]
    fn test_trailing_redirection() {
        assert_eq!(
            parse("cat <"),
            Err(SyntaxError::MissingFileName(RedirectOp::Input))
        );
        assert_eq!(
            parse("ls -l >"),
            Err(SyntaxError::MissingFileName(RedirectOp::Output))
        );
    }

    #[test]
    fn test_redirection_followed_by_marker() {
        assert_eq!(
            parse("cat < > out"),
            Err(SyntaxError::MissingFileName(RedirectOp::Input))
        );
    }

    #[test]
    fn test_duplicate_reported_before_missing_file() {
        assert_eq!(
            parse("cat < a <"),
            Err(SyntaxError::MultipleRedirection(RedirectOp::Input))
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_redirect_is_argument() {
        let cmd = parse(r#"echo ">" file"#).unwrap();
        assert_eq!(cmd.arguments(), [">", "file"]);
        assert_eq!(cmd.stdout_path(), None);
    }
}
