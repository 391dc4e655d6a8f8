use super::{ast::*, builtins::Argument, environment::*, error::*};
use log::{debug, trace};

/// A compiled expression. Runs against whichever environment owns it.
pub type Thunk = Box<dyn Fn(&mut Environment) -> ArrhResult<String>>;

pub struct CompiledFunction {
    pub index: String,
    pub params: Vec<String>,
    body: Vec<Thunk>,
}

impl CompiledFunction {
    /// Bind `args` to the declared parameters in a fresh scope and run the
    /// body. The value of the last statement is the result.
    pub fn call(&self, env: &mut Environment, args: Vec<String>) -> ArrhResult<String> {
        if args.len() > self.params.len() {
            return Err(ArrhError::Runtime(format!(
                "Function [{}] takes {} argument(s), got {}",
                self.index,
                self.params.len(),
                args.len()
            )));
        }
        trace!("Call [{}]({})", self.index, args.join(","));
        env.enter_call(&self.index)?;
        env.push_scope(self.params.iter().cloned().zip(args).collect());
        let result = run(&self.body, env);
        let popped = env.pop_scope();
        env.leave_call();
        let value = result?;
        popped?;
        Ok(value)
    }
}

// Closure Compiler
// Turns expression trees into thunks
pub struct Compiler;

impl Compiler {
    /// Compile declarations into `env`, recursing into nested objects.
    pub fn compile_entries(entries: Vec<Entry>, env: &mut Environment) -> ArrhResult {
        for entry in entries {
            match entry.kind {
                EntryKind::Scalar(value) => env.set(&entry.index, value),
                EntryKind::Array(items) => env.set_array(&entry.index, items),
                EntryKind::Object(children) => {
                    let mut object = env.nested();
                    Self::compile_entries(children, &mut object)?;
                    debug!("Compiled object [{}]", entry.index);
                    env.add_object(&entry.index, object);
                }
                EntryKind::Function(function) => {
                    let compiled = Self::compile_function(function)?;
                    env.set_function(&entry.index, compiled);
                }
            }
        }
        Ok(())
    }

    pub fn compile_function(function: Function) -> ArrhResult<CompiledFunction> {
        let Function {
            index,
            params,
            body,
            line,
        } = function;
        let body = Self::compile_all(body).map_err(|err| err.in_function(&index, line))?;
        debug!("Compiled function [{}]", index);
        Ok(CompiledFunction {
            index,
            params,
            body,
        })
    }

    fn compile_all(exprs: Vec<Expr>) -> ArrhResult<Vec<Thunk>> {
        exprs.into_iter().map(Self::compile).collect()
    }

    pub fn compile(expr: Expr) -> ArrhResult<Thunk> {
        let thunk: Thunk = match expr {
            Expr::Literal(value) => Box::new(move |_: &mut Environment| Ok(value.clone())),
            Expr::Read(index) => Box::new(move |env: &mut Environment| env.get(&index)),
            Expr::Write { index, value } => {
                let value = Self::compile(*value)?;
                Box::new(move |env: &mut Environment| {
                    let value = value(env)?;
                    env.set(&index, value.clone());
                    Ok(value)
                })
            }
            Expr::LocalRead(index) => Box::new(move |env: &mut Environment| env.local(&index)),
            Expr::LocalWrite { index, value } => {
                let value = Self::compile(*value)?;
                Box::new(move |env: &mut Environment| {
                    let value = value(env)?;
                    env.set_local(&index, value.clone());
                    Ok(value)
                })
            }
            Expr::ElementRead { index, element } => {
                let element = Self::compile(*element)?;
                Box::new(move |env: &mut Environment| {
                    let element = element(env)?;
                    env.element(&index, &element)
                })
            }
            Expr::Append { index, value } => {
                let value = Self::compile(*value)?;
                Box::new(move |env: &mut Environment| {
                    let value = value(env)?;
                    env.append(&index, value.clone())?;
                    Ok(value)
                })
            }
            Expr::ParameterRead(name) => {
                Box::new(move |env: &mut Environment| env.parameter(&name))
            }
            Expr::Reference(index) => {
                return Err(ArrhError::Bind(format!(
                    "Reference &[{}] is only allowed as a built-in argument",
                    index
                )))
            }
            Expr::Arithmetic { op, left, right } => {
                let left = Self::compile(*left)?;
                let right = Self::compile(*right)?;
                Box::new(move |env: &mut Environment| {
                    let left = integer(&left(env)?)?;
                    let right = integer(&right(env)?)?;
                    Ok(op.apply(left, right)?.to_string())
                })
            }
            Expr::Concat { left, right } => {
                let left = Self::compile(*left)?;
                let right = Self::compile(*right)?;
                Box::new(move |env: &mut Environment| {
                    let mut value = left(env)?;
                    value.push_str(&right(env)?);
                    Ok(value)
                })
            }
            Expr::Compare { op, left, right } => {
                let left = Self::compile(*left)?;
                let right = Self::compile(*right)?;
                Box::new(move |env: &mut Environment| {
                    let left = left(env)?;
                    let right = right(env)?;
                    Ok(op.compare(&left, &right)?.to_string())
                })
            }
            Expr::Call { callee, arguments } => {
                let arguments = Self::compile_all(arguments)?;
                Box::new(move |env: &mut Environment| {
                    let args = arguments
                        .iter()
                        .map(|argument| argument(env))
                        .collect::<ArrhResult<Vec<_>>>()?;
                    match &callee {
                        Callee::Entry(index) => {
                            let function = env.function(index)?;
                            function.call(env, args)
                        }
                        Callee::Method { object, function } => {
                            let object = env.object_mut(object)?;
                            let function = object.function(function)?;
                            function.call(object, args)
                        }
                    }
                })
            }
            Expr::Builtin { name, arguments } => {
                let arguments = arguments
                    .into_iter()
                    .map(|argument| match argument {
                        Expr::Reference(index) => Ok(Argument::Reference(index)),
                        argument => Self::compile(argument).map(Argument::Value),
                    })
                    .collect::<ArrhResult<Vec<_>>>()?;
                Box::new(move |env: &mut Environment| {
                    let builtin = env.builtin(&name)?;
                    builtin(env, &arguments)
                })
            }
            Expr::If { condition, body } => {
                let condition = Self::compile(*condition)?;
                let body = Self::compile_all(body)?;
                Box::new(move |env: &mut Environment| {
                    if truth(&condition(env)?)? {
                        run(&body, env)
                    } else {
                        Ok(String::new())
                    }
                })
            }
            Expr::For {
                condition,
                increment,
                body,
            } => {
                let condition = Self::compile(*condition)?;
                let increment = Self::compile(*increment)?;
                let body = Self::compile_all(body)?;
                Box::new(move |env: &mut Environment| {
                    let mut value = String::new();
                    while truth(&condition(env)?)? {
                        for line in body.iter() {
                            value = line(env)?;
                        }
                        increment(env)?;
                    }
                    Ok(value)
                })
            }
        };
        Ok(thunk)
    }
}

// Run thunks in order, yielding the last value.
fn run(body: &[Thunk], env: &mut Environment) -> ArrhResult<String> {
    let mut value = String::new();
    for line in body.iter() {
        value = line(env)?;
    }
    Ok(value)
}

fn truth(value: &str) -> ArrhResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ArrhError::Runtime(format!(
            "Expected a boolean condition, got \"{}\"",
            value
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{config::Config, parser::lower, tokenizer::tokenize};

    fn eval(env: &mut Environment, line: &str) -> ArrhResult<String> {
        let thunk = Compiler::compile(lower(tokenize(line)?)?)?;
        thunk(env)
    }

    fn env() -> Environment {
        Environment::new(&Config::default())
    }

    #[test]
    fn arithmetic() -> ArrhResult {
        let mut env = env();
        assert_eq!(eval(&mut env, "1 + 1")?, "2");
        assert_eq!(eval(&mut env, "3 - 2")?, "1");
        assert_eq!(eval(&mut env, "2 % 2")?, "0");
        assert_eq!(eval(&mut env, "2 / 2")?, "1");
        assert!(matches!(eval(&mut env, "2 / 0"), Err(ArrhError::Runtime(_))));
        assert!(matches!(eval(&mut env, "2 % 0"), Err(ArrhError::Runtime(_))));
        assert!(matches!(eval(&mut env, "'a' + 1"), Err(ArrhError::Runtime(_))));
        Ok(())
    }

    #[test]
    fn concatenation_is_not_addition() -> ArrhResult {
        let mut env = env();
        assert_eq!(eval(&mut env, "'1' ^ '1'")?, "11");
        Ok(())
    }

    #[test]
    fn equality_is_textual() -> ArrhResult {
        let mut env = env();
        assert_eq!(eval(&mut env, "'a' == 'a'")?, "true");
        assert_eq!(eval(&mut env, "'01' == '1'")?, "false");
        assert_eq!(eval(&mut env, "2 <= 10")?, "true");
        Ok(())
    }

    #[test]
    fn assignment_is_an_expression() -> ArrhResult {
        let mut env = env();
        assert_eq!(eval(&mut env, "[here][0] = 1")?, "1");
        assert_eq!(eval(&mut env, "[here][0] + 1")?, "2");
        assert_eq!(eval(&mut env, "[5] = 'x' ^ 'y'")?, "xy");
        assert_eq!(env.get("5")?, "xy");
        Ok(())
    }

    #[test]
    fn reads_are_late_bound() -> ArrhResult {
        let mut env = env();
        let thunk = Compiler::compile(lower(tokenize("[7]")?)?)?;
        assert!(matches!(thunk(&mut env), Err(ArrhError::Bind(_))));
        env.set("7", "later".into());
        assert_eq!(thunk(&mut env)?, "later");
        Ok(())
    }

    #[test]
    fn array_append_and_size() -> ArrhResult {
        let mut env = env();
        env.set_array("0", vec!["1".into(), "2".into(), "3".into()]);
        assert_eq!(eval(&mut env, "[0][] = 4")?, "4");
        assert_eq!(eval(&mut env, "[0][3]")?, "4");
        assert_eq!(eval(&mut env, "size(&[0])")?, "4");
        Ok(())
    }

    #[test]
    fn references_only_in_builtins() {
        assert!(matches!(
            Compiler::compile(Expr::Reference("0".into())),
            Err(ArrhError::Bind(_))
        ));
        let call = Expr::Call {
            callee: Callee::Entry("1".into()),
            arguments: vec![Expr::Reference("0".into())],
        };
        assert!(matches!(Compiler::compile(call), Err(ArrhError::Bind(_))));
    }

    #[test]
    fn unknown_builtin_fails_lazily() -> ArrhResult {
        let mut env = env();
        let thunk = Compiler::compile(lower(tokenize("shout('x')")?)?)?;
        assert!(matches!(thunk(&mut env), Err(ArrhError::Runtime(_))));
        Ok(())
    }

    #[test]
    fn conditions_must_be_boolean() {
        let mut env = env();
        let expr = Expr::If {
            condition: Box::new(Expr::Literal("yes".into())),
            body: vec![],
        };
        let thunk = Compiler::compile(expr).map_err(|e| e.to_string());
        match thunk {
            Ok(thunk) => assert!(matches!(thunk(&mut env), Err(ArrhError::Runtime(_)))),
            Err(err) => panic!("Unexpected compile error {}", err),
        }
    }

    #[test]
    fn function_calls_bind_and_release_scopes() -> ArrhResult {
        let mut env = env();
        let function = Function {
            index: "1".into(),
            params: vec!["a".into(), "b".into()],
            body: vec![lower(tokenize("$a ^ $b")?)?],
            line: 1,
        };
        env.set_function("1", Compiler::compile_function(function)?);
        assert_eq!(eval(&mut env, "[1]('x', 'y')")?, "xy");
        assert!(matches!(
            eval(&mut env, "[1]('x', 'y', 'z')"),
            Err(ArrhError::Runtime(_))
        ));
        assert!(matches!(eval(&mut env, "[1]('x')"), Err(ArrhError::Bind(_))));
        assert!(env.parameter("a").is_err());
        Ok(())
    }
}
