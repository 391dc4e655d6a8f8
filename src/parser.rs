use super::{ast::*, error::*, scanner::*, tokenizer::*};
use log::trace;

enum Header {
    If(Expr),
    For(Expr, Expr),
}

struct Block {
    header: Option<Header>,
    body: Vec<Expr>,
}

// Tree Builder
// Turns scanned declarations into expression trees
pub struct Parser {
    // Open blocks, the function body at the bottom
    stack: Vec<Block>,
}

impl Parser {
    pub fn parse(program: ScannedProgram) -> ArrhResult<Vec<Entry>> {
        program
            .entries
            .into_iter()
            .map(|entry| {
                let kind = match entry.declaration {
                    Declaration::Scalar(value) => EntryKind::Scalar(value),
                    Declaration::Array(items) => EntryKind::Array(items),
                    Declaration::Object(object) => EntryKind::Object(Self::parse(object)?),
                    Declaration::Function(source) => {
                        EntryKind::Function(Self::function(&entry.index, &source)?)
                    }
                };
                Ok(Entry {
                    index: entry.index,
                    kind,
                })
            })
            .collect()
    }

    pub fn function(index: &str, source: &FunctionSource) -> ArrhResult<Function> {
        let tokens = source
            .lines
            .iter()
            .map(|line| tokenize_line(line))
            .collect::<ArrhResult<Vec<_>>>()
            .map_err(|err| err.in_function(index, source.line))?;
        let body = Self::build(tokens).map_err(|err| err.in_function(index, source.line))?;
        Ok(Function {
            index: index.into(),
            params: source.params.clone(),
            body,
            line: source.line,
        })
    }

    /// Group a function's token stream into a tree. Blank lines close the
    /// innermost `if`/`for`.
    pub fn build(tokens: Vec<Token>) -> ArrhResult<Vec<Expr>> {
        let mut parser = Self {
            stack: vec![Block {
                header: None,
                body: vec![],
            }],
        };
        for token in tokens {
            parser.push(token)?;
        }
        parser.finish()
    }

    fn push(&mut self, token: Token) -> ArrhResult {
        trace!("Tree token {:?}", token);
        match token {
            Token::If { condition } => {
                let condition = lower(*condition)?;
                self.open(Header::If(condition));
            }
            Token::For {
                condition,
                increment,
            } => {
                let condition = lower(*condition)?;
                let increment = lower(*increment)?;
                self.open(Header::For(condition, increment));
            }
            Token::Terminator => self.close()?,
            token => {
                let expr = lower(token)?;
                self.current().body.push(expr);
            }
        }
        Ok(())
    }

    fn open(&mut self, header: Header) {
        self.stack.push(Block {
            header: Some(header),
            body: vec![],
        });
    }

    fn close(&mut self) -> ArrhResult {
        if self.stack.len() == 1 {
            return Err(ArrhError::Tree(
                "Unexpected terminator (whitespace overflow)".into(),
            ));
        }
        let block = self.stack.pop().ok_or_else(unbalanced)?;
        let expr = match block.header {
            Some(Header::If(condition)) => Expr::If {
                condition: Box::new(condition),
                body: block.body,
            },
            Some(Header::For(condition, increment)) => Expr::For {
                condition: Box::new(condition),
                increment: Box::new(increment),
                body: block.body,
            },
            None => return Err(unbalanced()),
        };
        self.current().body.push(expr);
        Ok(())
    }

    fn finish(mut self) -> ArrhResult<Vec<Expr>> {
        if self.stack.len() > 1 {
            return Err(ArrhError::Tree(format!(
                "Unterminated block ({} still open)",
                self.stack.len() - 1
            )));
        }
        self.stack.pop().map(|block| block.body).ok_or_else(unbalanced)
    }

    fn current(&mut self) -> &mut Block {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}

fn unbalanced() -> ArrhError {
    ArrhError::Tree("Unbalanced block stack".into())
}

fn boxed(token: Token) -> ArrhResult<Box<Expr>> {
    lower(token).map(Box::new)
}

/// Convert a single token into an expression node.
pub fn lower(token: Token) -> ArrhResult<Expr> {
    Ok(match token {
        Token::Literal(value) => Expr::Literal(value),
        Token::Entry(index) => Expr::Read(index),
        Token::Local(index) => Expr::LocalRead(index),
        Token::Parameter(name) => Expr::ParameterRead(name),
        Token::Reference(index) => Expr::Reference(index),
        Token::Element { index, element } => Expr::ElementRead {
            index,
            element: boxed(*element)?,
        },
        Token::Assign { target, value } => {
            let value = boxed(*value)?;
            match target {
                Target::Entry(index) => Expr::Write { index, value },
                Target::Local(index) => Expr::LocalWrite { index, value },
                Target::Append(index) => Expr::Append { index, value },
                Target::Parameter(name) => {
                    return Err(ArrhError::Bind(format!(
                        "Cannot assign to parameter ${}",
                        name
                    )))
                }
            }
        }
        Token::Arithmetic { op, left, right } => Expr::Arithmetic {
            op,
            left: boxed(*left)?,
            right: boxed(*right)?,
        },
        Token::Compare { op, left, right } => Expr::Compare {
            op,
            left: boxed(*left)?,
            right: boxed(*right)?,
        },
        Token::Concat { left, right } => Expr::Concat {
            left: boxed(*left)?,
            right: boxed(*right)?,
        },
        Token::Call { callee, arguments } => Expr::Call {
            callee,
            arguments: arguments.into_iter().map(lower).collect::<ArrhResult<_>>()?,
        },
        Token::Builtin { name, arguments } => Expr::Builtin {
            name,
            arguments: arguments.into_iter().map(lower).collect::<ArrhResult<_>>()?,
        },
        Token::If { .. } | Token::For { .. } => {
            return Err(ArrhError::Tree(
                "Control block header used as a value".into(),
            ))
        }
        Token::Terminator => {
            return Err(ArrhError::Tree(
                "Unexpected terminator (whitespace overflow)".into(),
            ))
        }
    })
}
