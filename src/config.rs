use std::env;

/// Interpreter limits. `Config::default()` is what the binary uses unless
/// the environment overrides it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cons cells available before allocation fails.
    pub heap_capacity: usize,
    /// Nested macro expansions allowed while compiling one body.
    pub max_macro_expansions: usize,
    /// Forms recorded in an error's trace.
    pub max_traces: usize,
    /// Times the printer may re-enter an already printed node.
    pub max_print_repeats: usize,
    pub load_prelude: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            heap_capacity: 64 * 1024 * 1024,
            max_macro_expansions: 30,
            max_traces: 20,
            max_print_repeats: 10,
            load_prelude: true,
        }
    }
}

impl Config {
    /// Defaults, overridden by `L2LISP_HEAP_CELLS`,
    /// `L2LISP_MAX_MACRO_EXPANSIONS`, `L2LISP_MAX_TRACES` and
    /// `L2LISP_NO_PRELUDE`.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(n) = env_number("L2LISP_HEAP_CELLS") {
            config.heap_capacity = n;
        }
        if let Some(n) = env_number("L2LISP_MAX_MACRO_EXPANSIONS") {
            config.max_macro_expansions = n;
        }
        if let Some(n) = env_number("L2LISP_MAX_TRACES") {
            config.max_traces = n;
        }
        if env::var_os("L2LISP_NO_PRELUDE").is_some() {
            config.load_prelude = false;
        }
        config
    }

    /// Defaults without the prelude; the bare core.
    pub fn bare() -> Self {
        Config {
            load_prelude: false,
            ..Config::default()
        }
    }
}

fn env_number(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}
