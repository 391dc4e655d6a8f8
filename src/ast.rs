use super::error::*;
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Modulo,
    Divide,
}

impl ArithmeticOp {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '%' => Some(Self::Modulo),
            '/' => Some(Self::Divide),
            _ => None,
        }
    }

    pub fn apply(self, left: i64, right: i64) -> ArrhResult<i64> {
        let result = match self {
            Self::Add => left.checked_add(right),
            Self::Subtract => left.checked_sub(right),
            Self::Modulo if right == 0 => {
                return Err(ArrhError::Runtime("Modulo by zero".into()))
            }
            Self::Modulo => left.checked_rem(right),
            Self::Divide if right == 0 => {
                return Err(ArrhError::Runtime("Division by zero".into()))
            }
            Self::Divide => left.checked_div(right),
        };
        result.ok_or_else(|| {
            ArrhError::Runtime(format!("Integer overflow in {} {} {}", left, self, right))
        })
    }
}

impl Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Modulo => "%",
            Self::Divide => "/",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
}

impl CompareOp {
    // Two-character comparators come first so `<=` is never read as `<`.
    pub const SEARCH_ORDER: [(&'static str, CompareOp); 5] = [
        ("<=", CompareOp::LessEqual),
        (">=", CompareOp::GreaterEqual),
        ("==", CompareOp::Equal),
        ("<", CompareOp::Less),
        (">", CompareOp::Greater),
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
        }
    }

    /// `==` compares text verbatim, the ordering comparators compare integers.
    pub fn compare(self, left: &str, right: &str) -> ArrhResult<bool> {
        if self == Self::Equal {
            return Ok(left == right);
        }
        let left = integer(left)?;
        let right = integer(right)?;
        Ok(match self {
            Self::Less => left < right,
            Self::Greater => left > right,
            Self::LessEqual => left <= right,
            Self::GreaterEqual => left >= right,
            Self::Equal => left == right,
        })
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

pub fn integer(value: &str) -> ArrhResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ArrhError::Runtime(format!("Expected an integer, got \"{}\"", value)))
}

/// Target of a user function call.
#[derive(Clone, Debug, PartialEq)]
pub enum Callee {
    /// `[f](...)`
    Entry(String),
    /// `[object][f](...)`, run inside the object's environment.
    Method { object: String, function: String },
}

impl Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(index) => write!(f, "[{}]", index),
            Self::Method { object, function } => write!(f, "[{}][{}]", object, function),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(String),
    Read(String),
    Write {
        index: String,
        value: Box<Expr>,
    },
    LocalRead(String),
    LocalWrite {
        index: String,
        value: Box<Expr>,
    },
    ElementRead {
        index: String,
        element: Box<Expr>,
    },
    Append {
        index: String,
        value: Box<Expr>,
    },
    ParameterRead(String),
    Reference(String),
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Concat {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: Callee,
        arguments: Vec<Expr>,
    },
    Builtin {
        name: String,
        arguments: Vec<Expr>,
    },
    If {
        condition: Box<Expr>,
        body: Vec<Expr>,
    },
    For {
        condition: Box<Expr>,
        increment: Box<Expr>,
        body: Vec<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub index: String,
    pub params: Vec<String>,
    pub body: Vec<Expr>,
    // Line of the declaring header
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    Scalar(String),
    Array(Vec<String>),
    Object(Vec<Entry>),
    Function(Function),
}

/// A top level declaration, ready to be compiled into an environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub index: String,
    pub kind: EntryKind,
}
