use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub error_style: Box<dyn Fn(String) -> String>,
}

impl Theme {
    /// No escape codes: used when input is not a terminal.
    pub fn plain() -> Self {
        Theme {
            prompt: String::from("% "),
            error_style: Box::new(|s| s),
        }
    }

    pub fn interactive() -> Self {
        Theme {
            prompt: "% ".bright_cyan().to_string(),
            error_style: Box::new(|s| s.bright_red().to_string()),
        }
    }

    pub fn for_terminal(is_terminal: bool) -> Self {
        if is_terminal {
            Theme::interactive()
        } else {
            Theme::plain()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_theme_has_no_escapes() {
        let theme = Theme::plain();
        assert_eq!(theme.prompt, "% ");
        assert_eq!((theme.error_style)("ish: oops".to_string()), "ish: oops");
    }
}
