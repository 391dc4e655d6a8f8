pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod environment;
pub mod error;
pub mod parser;
pub mod program;
pub mod scanner;
#[cfg(test)]
mod test_scripts;
pub mod tokenizer;

pub use self::{
    config::{Config, MAIN_INDEX},
    environment::Environment,
    error::*,
    program::{compile, Program},
};
use log::debug;
use std::fs;

/// Result of running a program's entry function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Execution {
    /// Value of the entry function's last statement.
    pub value: String,
    /// Text written through `out`.
    pub output: String,
}

#[derive(Default)]
pub struct Arrh {
    config: Config,
}

impl Arrh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn exec(&self, source: &str, args: &[String]) -> ArrhResult<Execution> {
        let mut program = Program::compile_with(source, self.config.clone())?;
        let value = program.call_entry(args)?;
        Ok(Execution {
            value,
            output: program.take_output(),
        })
    }

    pub fn exec_file(&self, path: &str, args: &[String]) -> ArrhResult<Execution> {
        debug!("Reading {}", path);
        let source = fs::read_to_string(path)?;
        self.exec(&source, args)
    }
}
