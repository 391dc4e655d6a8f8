use std::fmt::Display;

use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxError {
    message: String,
    line: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Syntax error on line {}: {}", self.line, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ArrhError {
    #[error("IO Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("{0}")]
    Structural(SyntaxError),
    #[error("Tokenize Error: {0}")]
    Tokenize(String),
    #[error("Tree Error: {0}")]
    Tree(String),
    #[error("Bind Error: {0}")]
    Bind(String),
    #[error("Runtime Error: {0}")]
    Runtime(String),
}

impl ArrhError {
    pub fn structural(message: impl Into<String>, line: usize) -> Self {
        Self::Structural(SyntaxError::new(message, line))
    }

    pub fn unknown(kind: &str, index: &str) -> Self {
        Self::Bind(format!("Unknown reference to {} \"{}\"", kind, index))
    }

    // Prefix compile-stage errors with the function they were raised in and
    // the line of its header.
    pub fn in_function(self, index: &str, line: usize) -> Self {
        let context =
            |message: String| format!("in function [{}] (line {}): {}", index, line, message);
        match self {
            Self::Tokenize(message) => Self::Tokenize(context(message)),
            Self::Tree(message) => Self::Tree(context(message)),
            Self::Bind(message) => Self::Bind(context(message)),
            other => other,
        }
    }
}

pub type ArrhResult<T = ()> = Result<T, ArrhError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = ArrhError::structural("Wrong end", 4);
        assert_eq!(err.to_string(), "Syntax error on line 4: Wrong end");
    }

    #[test]
    fn function_context() {
        let err = ArrhError::Tree("Unterminated block".into()).in_function("12", 7);
        assert_eq!(
            err.to_string(),
            "Tree Error: in function [12] (line 7): Unterminated block"
        );
        let err = ArrhError::Runtime("Division by zero".into()).in_function("12", 7);
        assert_eq!(err.to_string(), "Runtime Error: Division by zero");
    }
}
