use super::{compiler::Thunk, environment::Environment, error::*};
use log::info;
use std::collections::HashMap;

/// A built-in argument: evaluated lazily, or a handle to an array by name.
pub enum Argument {
    Value(Thunk),
    Reference(String),
}

impl Argument {
    pub fn value(&self, env: &mut Environment) -> ArrhResult<String> {
        match self {
            Self::Value(thunk) => thunk(env),
            Self::Reference(index) => Err(ArrhError::Runtime(format!(
                "Reference &[{}] cannot be used as a value",
                index
            ))),
        }
    }
}

pub type NativeFunction = fn(
    // Environment of the caller
    &mut Environment,
    // Unevaluated arguments
    &[Argument],
) -> ArrhResult<String>;

pub fn builtins() -> HashMap<String, NativeFunction> {
    let mut builtins = HashMap::<String, NativeFunction>::new();
    builtins.insert("out".into(), out);
    builtins.insert("size".into(), size);
    builtins
}

// Write the argument to the program output. Produces no value.
fn out(env: &mut Environment, args: &[Argument]) -> ArrhResult<String> {
    if let Some(arg) = args.first() {
        let text = arg.value(env)?;
        info!("{}", text);
        env.write_output(&text);
    }
    Ok(String::new())
}

// Element count of a referenced array.
fn size(env: &mut Environment, args: &[Argument]) -> ArrhResult<String> {
    match args.first() {
        Some(Argument::Reference(index)) => match env.array(index) {
            Some(items) => Ok(items.len().to_string()),
            None => Err(ArrhError::Runtime(format!(
                "size expects an array, [{}] is not one",
                index
            ))),
        },
        Some(Argument::Value(_)) => Err(ArrhError::Runtime(
            "size expects a reference such as &[0]".into(),
        )),
        None => Err(ArrhError::Runtime("size expects one argument".into())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use mock_logger::MockLogger;

    fn literal(value: &'static str) -> Argument {
        Argument::Value(Box::new(move |_: &mut Environment| Ok(value.to_string())))
    }

    #[test]
    fn out_writes_and_logs() -> ArrhResult {
        mock_logger::init();
        let mut env = Environment::new(&Config::default());
        assert_eq!(out(&mut env, &[literal("ahoy")])?, "");
        assert_eq!(out(&mut env, &[])?, "");
        assert_eq!(env.output(), "ahoy");
        MockLogger::entries(|entries| {
            assert!(entries.iter().any(|entry| entry.body == "ahoy"));
        });
        Ok(())
    }

    #[test]
    fn size_needs_an_array_reference() -> ArrhResult {
        let mut env = Environment::new(&Config::default());
        env.set_array("0", vec!["a".into(), "b".into()]);
        env.set("1", "scalar".into());
        assert_eq!(size(&mut env, &[Argument::Reference("0".into())])?, "2");
        assert!(size(&mut env, &[Argument::Reference("1".into())]).is_err());
        assert!(size(&mut env, &[literal("0")]).is_err());
        assert!(size(&mut env, &[]).is_err());
        Ok(())
    }

    #[test]
    fn references_are_not_values() {
        let mut env = Environment::new(&Config::default());
        env.set_array("0", vec![]);
        assert!(out(&mut env, &[Argument::Reference("0".into())]).is_err());
    }
}
