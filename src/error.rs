use std::io;
use std::result;

use thiserror::Error;

/// Everything that can stop a program. Every variant is fatal to the program
/// being run; the caller decides how to report it.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// Lexer or reader failure; nothing has been evaluated yet.
    #[error("Syntax Error: {0}")]
    Read(String),

    /// Malformed special form.
    #[error("{0}")]
    Syntax(String),

    #[error("{name}: undefined;\ncannot reference undefined identifier")]
    Unbound { name: String },

    #[error("{name}: undefined;\ncannot use before initialization")]
    Uninitialized { name: String },

    /// Wrong runtime tag handed to a primitive.
    #[error("{procedure}: contract violation\nexpected: {expected}\ngiven: {given}{}",
        position_suffix(.position))]
    Contract {
        procedure: String,
        expected: &'static str,
        given: String,
        position: Option<usize>,
    },

    /// Wrong runtime tag handed to a special form.
    #[error("{0}")]
    Type(String),

    #[error("{procedure}: arity mismatch;\nthe expected number of arguments does not match \
        the given number\nexpected: {expected}\ngiven: {given}")]
    Arity {
        procedure: String,
        expected: String,
        given: usize,
    },

    #[error("{procedure}: divide by 0 error")]
    DivideByZero { procedure: &'static str },

    #[error("application: not a procedure;\nexpected a procedure that can be applied to \
        arguments\ngiven: {given}")]
    Application { given: String },

    #[error("Evaluation Error: {0}")]
    Evaluation(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = result::Result<T, Error>;

fn position_suffix(position: &Option<usize>) -> String {
    match position {
        Some(n) => format!("\nargument position: {}", n),
        None => String::new(),
    }
}

impl Error {
    pub fn syntax<S: ToString>(msg: S) -> Error {
        Error::Syntax(msg.to_string())
    }

    pub fn unbound(name: &str) -> Error {
        Error::Unbound {
            name: name.to_string(),
        }
    }

    pub fn arity<P: ToString, E: ToString>(procedure: P, expected: E, given: usize) -> Error {
        Error::Arity {
            procedure: procedure.to_string(),
            expected: expected.to_string(),
            given,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[test]
fn test_contract_message() {
    let err = Error::Contract {
        procedure: "+".to_string(),
        expected: "number?",
        given: "\"a\"".to_string(),
        position: Some(2),
    };
    assert_eq!(
        err.to_string(),
        "+: contract violation\nexpected: number?\ngiven: \"a\"\nargument position: 2"
    );
}

#[test]
fn test_unbound_message() {
    assert_eq!(
        Error::unbound("x").to_string(),
        "x: undefined;\ncannot reference undefined identifier"
    );
}
