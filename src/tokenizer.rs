use super::{ast::*, error::*, scanner::is_index};
use log::trace;

const LOCAL_PREFIX: &str = "[here]";

/// Left hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// `[i] = ...`
    Entry(String),
    /// `[here][i] = ...`
    Local(String),
    /// `[i][] = ...`
    Append(String),
    /// `$name = ...`, rejected when the tree is built.
    Parameter(String),
}

/// One statement line, classified.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    If {
        condition: Box<Token>,
    },
    For {
        condition: Box<Token>,
        increment: Box<Token>,
    },
    Assign {
        target: Target,
        value: Box<Token>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Token>,
        right: Box<Token>,
    },
    Compare {
        op: CompareOp,
        left: Box<Token>,
        right: Box<Token>,
    },
    Call {
        callee: Callee,
        arguments: Vec<Token>,
    },
    Builtin {
        name: String,
        arguments: Vec<Token>,
    },
    Concat {
        left: Box<Token>,
        right: Box<Token>,
    },
    Local(String),
    Parameter(String),
    Entry(String),
    Element {
        index: String,
        element: Box<Token>,
    },
    Reference(String),
    Literal(String),
    Terminator,
}

/// Classify a full statement line. Control headers and the blank block
/// terminator are only recognized here, never inside an expression.
pub fn tokenize_line(line: &str) -> ArrhResult<Token> {
    let line = line.trim();
    trace!("Tokenize \"{}\"", line);
    if let Some(rest) = keyword(line, "if") {
        let condition = tokenize_clause(strip_parens(rest))?;
        return Ok(Token::If {
            condition: Box::new(condition),
        });
    }
    if let Some(rest) = keyword(line, "for") {
        let header = rest
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| ArrhError::Tokenize(format!("Malformed for header \"{}\"", line)))?;
        let split = find_top_level(header, ";")
            .ok_or_else(|| ArrhError::Tokenize(format!("Malformed for header \"{}\"", line)))?;
        let condition = tokenize_clause(&header[..split])?;
        let increment = tokenize(&header[split + 1..])?;
        return Ok(Token::For {
            condition: Box::new(condition),
            increment: Box::new(increment),
        });
    }
    if line.is_empty() {
        return Ok(Token::Terminator);
    }
    tokenize(line)
}

/// Classify an expression. Recognizers run in a fixed order and the first
/// match wins.
pub fn tokenize(text: &str) -> ArrhResult<Token> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ArrhError::Tokenize("Missing operand".into()));
    }

    if let Some(split) = find_assignment(text) {
        return Ok(Token::Assign {
            target: parse_target(&text[..split])?,
            value: Box::new(tokenize(&text[split + 1..])?),
        });
    }

    if let Some((split, op)) = find_operator(text) {
        return Ok(Token::Arithmetic {
            op,
            left: Box::new(tokenize(&text[..split])?),
            right: Box::new(tokenize(&text[split + 1..])?),
        });
    }

    for (symbol, op) in CompareOp::SEARCH_ORDER {
        if let Some(split) = find_top_level(text, symbol) {
            return Ok(Token::Compare {
                op,
                left: Box::new(tokenize(&text[..split])?),
                right: Box::new(tokenize(&text[split + symbol.len()..])?),
            });
        }
    }

    if let Some(call) = tokenize_call(text)? {
        return Ok(call);
    }

    if let Some(split) = find_top_level(text, "^") {
        return Ok(Token::Concat {
            left: Box::new(tokenize(&text[..split])?),
            right: Box::new(tokenize(&text[split + 1..])?),
        });
    }

    if let Some(rest) = text.strip_prefix(LOCAL_PREFIX) {
        return match whole_bracket(rest) {
            Some(index) if is_index(index) => Ok(Token::Local(index.into())),
            _ => Err(unrecognized(text)),
        };
    }

    if let Some(name) = text.strip_prefix('$') {
        return if is_index(name) {
            Ok(Token::Parameter(name.into()))
        } else {
            Err(unrecognized(text))
        };
    }

    if text.starts_with('[') {
        return tokenize_entry(text);
    }

    if let Some(rest) = text.strip_prefix('&') {
        return match whole_bracket(rest) {
            Some(index) if is_index(index) => Ok(Token::Reference(index.into())),
            _ => Err(unrecognized(text)),
        };
    }

    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Ok(Token::Literal(text[1..text.len() - 1].into()));
    }
    if text.parse::<i64>().is_ok() {
        return Ok(Token::Literal(text.into()));
    }

    Err(unrecognized(text))
}

fn unrecognized(text: &str) -> ArrhError {
    ArrhError::Tokenize(format!("Unrecognized statement \"{}\"", text))
}

// `if`/`for` conditions have to be comparisons.
fn tokenize_clause(text: &str) -> ArrhResult<Token> {
    match tokenize(text)? {
        token @ Token::Compare { .. } => Ok(token),
        _ => Err(ArrhError::Tokenize(format!(
            "Invalid clause \"{}\"",
            text.trim()
        ))),
    }
}

// `[i]`, or `[i][e]` where `e` is a literal key or any expression.
fn tokenize_entry(text: &str) -> ArrhResult<Token> {
    let (index, rest) = split_bracket(text).ok_or_else(|| unrecognized(text))?;
    if !is_index(index) {
        return Err(unrecognized(text));
    }
    if rest.is_empty() {
        return Ok(Token::Entry(index.into()));
    }
    let element = whole_bracket(rest).ok_or_else(|| unrecognized(text))?;
    let element = if is_index(element) {
        Token::Literal(element.into())
    } else {
        tokenize(element)?
    };
    Ok(Token::Element {
        index: index.into(),
        element: Box::new(element),
    })
}

// `[f](...)`, `[o][f](...)` or `name(...)`. Anything else is left for the
// later recognizers.
fn tokenize_call(text: &str) -> ArrhResult<Option<Token>> {
    if !text.ends_with(')') {
        return Ok(None);
    }
    let open = match find_top_level_char(text, '(') {
        Some(open) => open,
        None => return Ok(None),
    };
    if closing_paren(text, open) != Some(text.len() - 1) {
        return Ok(None);
    }
    let callee = text[..open].trim();
    let inner = &text[open + 1..text.len() - 1];

    if callee.starts_with('[') {
        let callee = match split_bracket(callee) {
            Some((index, "")) if is_index(index) => Callee::Entry(index.into()),
            Some((object, rest)) if is_index(object) => match whole_bracket(rest) {
                Some(function) if is_index(function) => Callee::Method {
                    object: object.into(),
                    function: function.into(),
                },
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        return Ok(Some(Token::Call {
            callee,
            arguments: tokenize_arguments(inner)?,
        }));
    }

    if is_name(callee) {
        return Ok(Some(Token::Builtin {
            name: callee.into(),
            arguments: tokenize_arguments(inner)?,
        }));
    }
    Ok(None)
}

fn tokenize_arguments(inner: &str) -> ArrhResult<Vec<Token>> {
    if inner.trim().is_empty() {
        return Ok(vec![]);
    }
    split_top_level(inner, ',').into_iter().map(tokenize).collect()
}

fn parse_target(text: &str) -> ArrhResult<Target> {
    let text = text.trim();
    let invalid = || ArrhError::Tokenize(format!("Invalid assignment target \"{}\"", text));
    if let Some(rest) = text.strip_prefix(LOCAL_PREFIX) {
        return match whole_bracket(rest) {
            Some(index) if is_index(index) => Ok(Target::Local(index.into())),
            _ => Err(invalid()),
        };
    }
    if let Some(name) = text.strip_prefix('$') {
        return Ok(Target::Parameter(name.into()));
    }
    match split_bracket(text) {
        Some((index, "")) if is_index(index) => Ok(Target::Entry(index.into())),
        Some((index, "[]")) if is_index(index) => Ok(Target::Append(index.into())),
        _ => Err(invalid()),
    }
}

// Strip a leading keyword that is followed by whitespace or `(`.
fn keyword<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '(' => Some(rest.trim()),
        _ => None,
    }
}

// `(x)` -> `x`, only when the parentheses wrap the whole text.
fn strip_parens(text: &str) -> &str {
    if text.starts_with('(') && closing_paren(text, 0) == Some(text.len() - 1) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// `[a]rest` -> (`a`, `rest`)
fn split_bracket(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('[')?;
    let close = rest.find(']')?;
    Some((rest[..close].trim(), &rest[close + 1..]))
}

// `[a]` -> `a`, with everything between the outer brackets kept.
fn whole_bracket(text: &str) -> Option<&str> {
    text.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

/// Walks `text`, calling `visit` with the byte offset and character of every
/// position outside quotes, parentheses and square brackets.
fn scan_top_level(text: &str, mut visit: impl FnMut(usize, char) -> bool) {
    let mut quoted = false;
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            _ if quoted => {}
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                if visit(i, c) {
                    return;
                }
            }
            _ => {}
        }
    }
}

pub fn find_top_level(text: &str, pattern: &str) -> Option<usize> {
    let mut found = None;
    scan_top_level(text, |i, _| {
        if text[i..].starts_with(pattern) {
            found = Some(i);
        }
        found.is_some()
    });
    found
}

// Like `find_top_level`, but for an opening bracket character itself.
fn find_top_level_char(text: &str, target: char) -> Option<usize> {
    let mut quoted = false;
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            quoted = !quoted;
        } else if quoted {
            continue;
        } else if c == target && depth == 0 {
            return Some(i);
        } else if c == '(' || c == '[' {
            depth += 1;
        } else if c == ')' || c == ']' {
            depth = depth.saturating_sub(1);
        }
    }
    None
}

// Offset of the `)` matching the `(` at `open`.
fn closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut quoted = false;
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '\'' => quoted = !quoted,
            _ if quoted => {}
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

// A lone `=`, not part of `==`, `<=`, `>=` or `!=`.
fn find_assignment(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut found = None;
    scan_top_level(text, |i, c| {
        if c == '=' {
            let before = i.checked_sub(1).map(|b| bytes[b]);
            let after = bytes.get(i + 1).copied();
            let paired = matches!(before, Some(b'=' | b'<' | b'>' | b'!')) || after == Some(b'=');
            if !paired {
                found = Some(i);
            }
        }
        found.is_some()
    });
    found
}

// Leftmost arithmetic operator with an operand on its left. A `-` after
// another operator belongs to a negative literal.
fn find_operator(text: &str) -> Option<(usize, ArithmeticOp)> {
    let mut found = None;
    scan_top_level(text, |i, c| {
        if let Some(op) = ArithmeticOp::from_symbol(c) {
            let operand = text[..i]
                .trim_end()
                .chars()
                .last()
                .map_or(false, |last| !"+-%/^<>=".contains(last));
            if operand {
                found = Some((i, op));
            }
        }
        found.is_some()
    });
    found
}

fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = vec![];
    let mut start = 0;
    scan_top_level(text, |i, c| {
        if c == separator {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        false
    });
    parts.push(&text[start..]);
    parts
}
