/// Index the predefined `MAIN` constant expands to.
pub const MAIN_INDEX: &str = "666";

// Each nested call costs several closure frames, so this has to fit a 2 MiB
// thread stack in debug builds.
const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Knobs for compiling and running a program.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Index of the function `call_entry` runs.
    pub entry: String,
    /// Deepest allowed nesting of user function calls.
    pub max_call_depth: usize,
}

impl Config {
    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: MAIN_INDEX.into(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
