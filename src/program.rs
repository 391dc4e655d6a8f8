use super::{
    compiler::*, config::Config, environment::Environment, error::*, parser::*, scanner::*,
};
use log::{info, warn};

/// A compiled program, ready to run.
pub struct Program {
    env: Environment,
    config: Config,
}

impl Program {
    pub fn compile(source: &str) -> ArrhResult<Self> {
        Self::compile_with(source, Config::default())
    }

    /// Scan, tokenize, build and compile `source` into a fresh environment.
    pub fn compile_with(source: &str, config: Config) -> ArrhResult<Self> {
        let scanned = Scanner::scan(source)?;
        let entries = Parser::parse(scanned)?;
        let count = entries.len();
        let mut env = Environment::new(&config);
        Compiler::compile_entries(entries, &mut env)?;
        info!("Compiled {} top level entries", count);
        Ok(Self { env, config })
    }

    /// Run the entry function. Arguments beyond its declared parameters
    /// are dropped.
    pub fn call_entry(&mut self, args: &[String]) -> ArrhResult<String> {
        let function = self.env.function(&self.config.entry)?;
        let mut args = args.to_vec();
        if args.len() > function.params.len() {
            warn!(
                "Ignoring {} surplus argument(s) to entry [{}]",
                args.len() - function.params.len(),
                function.index
            );
            args.truncate(function.params.len());
        }
        function.call(&mut self.env, args)
    }

    pub fn call(&mut self, index: &str, args: &[String]) -> ArrhResult<String> {
        let function = self.env.function(index)?;
        function.call(&mut self.env, args.to_vec())
    }

    /// Everything written by `out` so far.
    pub fn output(&self) -> String {
        self.env.output()
    }

    pub fn take_output(&mut self) -> String {
        self.env.take_output()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

pub fn compile(source: &str) -> ArrhResult<Program> {
    Program::compile(source)
}
