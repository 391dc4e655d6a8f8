use super::{builtins::*, compiler::CompiledFunction, config::Config, error::*};
use log::trace;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

pub type Scope = HashMap<String, String>;

/// State shared by a program's root environment and every nested object.
pub struct Runtime {
    builtins: HashMap<String, NativeFunction>,
    output: RefCell<String>,
    depth: Cell<usize>,
    max_depth: usize,
}

impl Runtime {
    fn new(config: &Config) -> Self {
        Self {
            builtins: builtins(),
            output: RefCell::new(String::new()),
            depth: Cell::new(0),
            max_depth: config.max_call_depth,
        }
    }
}

pub struct Environment {
    data: HashMap<String, String>,
    arrays: HashMap<String, Vec<String>>,
    objects: HashMap<String, Environment>,
    functions: HashMap<String, Rc<CompiledFunction>>,
    // Registers live as long as the environment and are shared by every
    // invocation, recursive ones included.
    locals: HashMap<String, String>,
    scopes: Vec<Scope>,
    runtime: Rc<Runtime>,
}

impl Environment {
    pub fn new(config: &Config) -> Self {
        Self::with_runtime(Rc::new(Runtime::new(config)))
    }

    fn with_runtime(runtime: Rc<Runtime>) -> Self {
        Self {
            data: HashMap::new(),
            arrays: HashMap::new(),
            objects: HashMap::new(),
            functions: HashMap::new(),
            locals: HashMap::new(),
            scopes: vec![Scope::new()],
            runtime,
        }
    }

    /// A fresh environment for a nested object. Only the output, built-ins
    /// and call depth are shared with the parent.
    pub fn nested(&self) -> Self {
        Self::with_runtime(Rc::clone(&self.runtime))
    }

    /**
     * Scalars
     */
    pub fn get(&self, index: &str) -> ArrhResult<String> {
        if let Some(value) = self.data.get(index) {
            Ok(value.clone())
        } else if let Some(items) = self.arrays.get(index) {
            Ok(items.join(","))
        } else if self.objects.contains_key(index) {
            Err(ArrhError::Bind(format!(
                "Object [{}] cannot be read as a value",
                index
            )))
        } else {
            Err(ArrhError::unknown("entry", index))
        }
    }

    pub fn set(&mut self, index: &str, value: String) {
        trace!("Set [{}] = {}", index, value);
        self.data.insert(index.into(), value);
    }

    /**
     * Arrays
     */
    pub fn array(&self, index: &str) -> Option<&[String]> {
        self.arrays.get(index).map(Vec::as_slice)
    }

    pub fn set_array(&mut self, index: &str, items: Vec<String>) {
        self.arrays.insert(index.into(), items);
    }

    pub fn append(&mut self, index: &str, value: String) -> ArrhResult {
        match self.arrays.get_mut(index) {
            Some(items) => {
                trace!("Append {} to [{}]", value, index);
                items.push(value);
                Ok(())
            }
            None => Err(ArrhError::unknown("array", index)),
        }
    }

    /// `[index][element]`: an object field if `index` is an object,
    /// otherwise an array item.
    pub fn element(&self, index: &str, element: &str) -> ArrhResult<String> {
        if let Some(object) = self.objects.get(index) {
            return object.get(element);
        }
        let items = self
            .arrays
            .get(index)
            .ok_or_else(|| ArrhError::unknown("array", index))?;
        let position = element.trim().parse::<usize>().map_err(|_| {
            ArrhError::Runtime(format!("Invalid array index [{}][{}]", index, element))
        })?;
        items.get(position).cloned().ok_or_else(|| {
            ArrhError::Runtime(format!(
                "Index [{}][{}] out of bounds (size {})",
                index,
                position,
                items.len()
            ))
        })
    }

    /**
     * Local registers
     */
    pub fn local(&self, index: &str) -> ArrhResult<String> {
        self.locals
            .get(index)
            .cloned()
            .ok_or_else(|| ArrhError::unknown("register", &format!("[here][{}]", index)))
    }

    pub fn set_local(&mut self, index: &str, value: String) {
        trace!("Set [here][{}] = {}", index, value);
        self.locals.insert(index.into(), value);
    }

    /**
     * Parameter scopes
     */
    pub fn parameter(&self, name: &str) -> ArrhResult<String> {
        self.scopes
            .last()
            .and_then(|scope| scope.get(name))
            .cloned()
            .ok_or_else(|| ArrhError::unknown("parameter", &format!("${}", name)))
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) -> ArrhResult<Scope> {
        if self.scopes.len() > 1 {
            self.scopes
                .pop()
                .ok_or_else(|| ArrhError::Runtime("Scope stack is empty".into()))
        } else {
            Err(ArrhError::Runtime(
                "Attempted to pop the outermost parameter scope".into(),
            ))
        }
    }

    /**
     * Functions and objects
     */
    pub fn function(&self, index: &str) -> ArrhResult<Rc<CompiledFunction>> {
        self.functions
            .get(index)
            .cloned()
            .ok_or_else(|| ArrhError::unknown("function", index))
    }

    pub fn set_function(&mut self, index: &str, function: CompiledFunction) {
        self.functions.insert(index.into(), Rc::new(function));
    }

    pub fn object(&self, index: &str) -> Option<&Environment> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: &str) -> ArrhResult<&mut Environment> {
        self.objects
            .get_mut(index)
            .ok_or_else(|| ArrhError::unknown("object", index))
    }

    pub fn add_object(&mut self, index: &str, object: Environment) {
        self.objects.insert(index.into(), object);
    }

    /**
     * Runtime
     */
    pub fn builtin(&self, name: &str) -> ArrhResult<NativeFunction> {
        self.runtime
            .builtins
            .get(name)
            .copied()
            .ok_or_else(|| ArrhError::Runtime(format!("Unknown built-in function \"{}\"", name)))
    }

    pub fn write_output(&self, text: &str) {
        self.runtime.output.borrow_mut().push_str(text);
    }

    pub fn output(&self) -> String {
        self.runtime.output.borrow().clone()
    }

    pub fn take_output(&self) -> String {
        self.runtime.output.take()
    }

    pub fn enter_call(&self, index: &str) -> ArrhResult {
        let depth = self.runtime.depth.get() + 1;
        if depth > self.runtime.max_depth {
            return Err(ArrhError::Runtime(format!(
                "Maximum call depth of {} exceeded calling [{}]",
                self.runtime.max_depth, index
            )));
        }
        self.runtime.depth.set(depth);
        Ok(())
    }

    pub fn leave_call(&self) {
        let depth = self.runtime.depth.get();
        self.runtime.depth.set(depth.saturating_sub(1));
    }
}
