//! Constant and function tables shared by every compilation.
//!
//! The tables are read-only once built. [`MathVocabulary::shared`] hands out
//! a process-wide instance of the standard tables; callers that need a
//! different vocabulary build their own and pass it to
//! [`ExpressionCompiler::new`](super::services::ExpressionCompiler::new).

use std::collections::HashMap;
use std::f64::consts;
use std::sync::OnceLock;

/// Signature of a function callable from a formula.
pub type UnaryFn = fn(f64) -> f64;

/// Golden ratio, `(1 + sqrt(5)) / 2`.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Lookup tables for named constants and unary functions.
#[derive(Debug, Clone)]
pub struct MathVocabulary {
    constants: HashMap<String, f64>,
    functions: HashMap<String, UnaryFn>,
    custom_functions: bool,
}

impl MathVocabulary {
    /// Creates a vocabulary with no constants and no functions.
    pub fn empty() -> Self {
        Self {
            constants: HashMap::new(),
            functions: HashMap::new(),
            custom_functions: false,
        }
    }

    /// Creates the standard vocabulary: `pi e tau phi` and the twenty
    /// built-in functions.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotscope::domain::MathVocabulary;
    ///
    /// let vocab = MathVocabulary::standard();
    /// assert_eq!(vocab.constant("TAU"), Some(std::f64::consts::TAU));
    /// assert!(vocab.function("log10").is_some());
    /// assert!(vocab.function("sec").is_none());
    /// ```
    pub fn standard() -> Self {
        let mut vocab = Self::empty();
        vocab.register_builtin_constants();
        vocab.register_builtin_functions();
        vocab
    }

    /// The standard vocabulary, built on first use.
    pub fn shared() -> &'static MathVocabulary {
        static SHARED: OnceLock<MathVocabulary> = OnceLock::new();
        SHARED.get_or_init(MathVocabulary::standard)
    }

    /// Registers a constant. Names are case-insensitive.
    pub fn register_constant(&mut self, name: &str, value: f64) {
        self.constants.insert(name.to_lowercase(), value);
    }

    /// Registers a unary function. Names are case-insensitive.
    ///
    /// Formulas calling a registered function evaluate behind a panic
    /// guard: a panic inside `func` yields NaN instead of unwinding into
    /// the caller. The guard cannot help when panics abort.
    pub fn register_function(&mut self, name: &str, func: UnaryFn) {
        self.insert_function(name, func);
        self.custom_functions = true;
    }

    fn insert_function(&mut self, name: &str, func: UnaryFn) {
        self.functions.insert(name.to_lowercase(), func);
    }

    /// Whether any function was added through [`register_function`](Self::register_function).
    pub fn has_custom_functions(&self) -> bool {
        self.custom_functions
    }

    /// Looks up a constant by name.
    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(&name.to_lowercase()).copied()
    }

    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<UnaryFn> {
        self.functions.get(&name.to_lowercase()).copied()
    }

    /// Function names in alphabetical order.
    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Constant names in alphabetical order.
    pub fn constant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constants.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_builtin_constants(&mut self) {
        self.register_constant("pi", consts::PI);
        self.register_constant("e", consts::E);
        self.register_constant("tau", consts::TAU);
        self.register_constant("phi", PHI);
    }

    fn register_builtin_functions(&mut self) {
        self.insert_function("sin", f64::sin);
        self.insert_function("cos", f64::cos);
        self.insert_function("tan", f64::tan);
        self.insert_function("asin", f64::asin);
        self.insert_function("acos", f64::acos);
        self.insert_function("atan", f64::atan);
        self.insert_function("sinh", f64::sinh);
        self.insert_function("cosh", f64::cosh);
        self.insert_function("tanh", f64::tanh);
        self.insert_function("sqrt", f64::sqrt);
        self.insert_function("cbrt", f64::cbrt);
        self.insert_function("abs", f64::abs);
        self.insert_function("floor", f64::floor);
        self.insert_function("ceil", f64::ceil);
        self.insert_function("round", round_half_up);
        self.insert_function("log", f64::ln);
        self.insert_function("log10", f64::log10);
        self.insert_function("log2", f64::log2);
        self.insert_function("exp", f64::exp);
        self.insert_function("sign", sign);
    }
}

impl Default for MathVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Rounds to the nearest integer, halves toward positive infinity.
///
/// `f64::round` sends halves away from zero, which turns `-2.5` into `-3`;
/// plotted curves expect `-2`.
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// `1` for positive, `-1` for negative, the input itself for `±0` and NaN.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}
