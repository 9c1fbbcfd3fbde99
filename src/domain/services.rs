//! Formula compilation services.
//!
//! This module turns formula text into [`Evaluable`] functions of `x`. All
//! syntax checking happens once, at compile time; evaluating the result is a
//! plain tree walk that cannot fail and does not allocate.

use std::fmt;
use std::panic;
use std::sync::Arc;

use log::debug;

use super::errors::{ParseError, ParseResult};
use super::parser::{Expr, Parser};
use super::vocabulary::MathVocabulary;

/// Sample points returned by [`Evaluable::probe`].
pub const PROBE_POINTS: [f64; 5] = [0.0, 1.0, -1.0, 0.5, 2.0];

/// A compiled formula: a total function from `f64` to `f64`.
///
/// Cloning is cheap and clones share the compiled tree, so an `Evaluable`
/// can be handed to as many threads as needed.
///
/// # Examples
///
/// ```
/// use plotscope::domain::compile;
///
/// let f = compile("2x + 1").unwrap();
/// assert_eq!(f.eval(3.0), 7.0);
/// assert!(compile("sqrt(x)").unwrap().eval(-1.0).is_nan());
/// ```
#[derive(Debug, Clone)]
pub struct Evaluable {
    source: Arc<str>,
    tree: Arc<Expr>,
    guarded: bool,
}

impl Evaluable {
    /// Evaluates the formula at `x`.
    ///
    /// Division by zero, out-of-domain arguments and overflow produce NaN
    /// or an infinity. Built-in functions never panic; a panic inside a
    /// function from [`MathVocabulary::register_function`] becomes NaN.
    pub fn eval(&self, x: f64) -> f64 {
        if self.guarded {
            panic::catch_unwind(|| self.tree.evaluate(x)).unwrap_or(f64::NAN)
        } else {
            self.tree.evaluate(x)
        }
    }

    /// The text the formula was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree.
    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Whether the value depends on `x`.
    pub fn is_constant(&self) -> bool {
        !self.tree.uses_variable()
    }

    /// Values at [`PROBE_POINTS`], paired with the points.
    pub fn probe(&self) -> [(f64, f64); 5] {
        PROBE_POINTS.map(|x| (x, self.eval(x)))
    }

    /// Whether every probe value is NaN or infinite.
    pub fn is_nowhere_finite(&self) -> bool {
        self.probe().iter().all(|(_, y)| !y.is_finite())
    }
}

/// Canonical, fully parenthesized form of the formula.
impl fmt::Display for Evaluable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree)
    }
}

/// Compiles formulas against a fixed vocabulary.
///
/// Holds nothing but a shared reference to the vocabulary, so compiling is a
/// pure function of the input text.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionCompiler<'a> {
    vocabulary: &'a MathVocabulary,
}

impl<'a> ExpressionCompiler<'a> {
    /// Creates a compiler over `vocabulary`.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotscope::domain::{ExpressionCompiler, MathVocabulary};
    ///
    /// let mut vocab = MathVocabulary::standard();
    /// vocab.register_constant("g", 9.81);
    /// let compiler = ExpressionCompiler::new(&vocab);
    ///
    /// assert_eq!(compiler.compile("2g").unwrap().eval(0.0), 19.62);
    /// ```
    pub fn new(vocabulary: &'a MathVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Compiles `expression` into an [`Evaluable`].
    ///
    /// # Errors
    ///
    /// - [`ParseError::Empty`] for empty or whitespace-only input
    /// - a syntax variant naming the offending fragment for malformed input
    /// - [`ParseError::UnknownIdentifier`] for names that are neither `x`,
    ///   a constant nor a function
    pub fn compile(&self, expression: &str) -> ParseResult<Evaluable> {
        if expression.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let result = Parser::new(expression, self.vocabulary).and_then(|mut parser| parser.parse());
        match result {
            Ok(tree) => {
                debug!("compiled {expression:?} as {tree}");
                Ok(Evaluable {
                    source: Arc::from(expression),
                    tree: Arc::new(tree),
                    guarded: self.vocabulary.has_custom_functions(),
                })
            }
            Err(err) => {
                debug!("rejected {expression:?}: {err}");
                Err(err)
            }
        }
    }
}

impl Default for ExpressionCompiler<'static> {
    fn default() -> Self {
        Self::new(MathVocabulary::shared())
    }
}

/// Compiles `expression` with the standard vocabulary.
///
/// # Examples
///
/// ```
/// use plotscope::domain::compile;
///
/// assert_eq!(compile("2^3^2").unwrap().eval(0.0), 512.0);
/// assert_eq!(compile("").unwrap_err().to_string(), "empty expression");
/// assert!(compile("nonsense(((").is_err());
/// ```
pub fn compile(expression: &str) -> ParseResult<Evaluable> {
    ExpressionCompiler::default().compile(expression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{E, PI};

    fn eval(expression: &str, x: f64) -> f64 {
        compile(expression).unwrap().eval(x)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(compile("").unwrap_err(), ParseError::Empty);
        assert_eq!(compile("   ").unwrap_err(), ParseError::Empty);
        assert_eq!(compile("\t\n").unwrap_err().to_string(), "empty expression");
    }

    #[test]
    fn test_simple_arithmetic() {
        assert_eq!(eval("2+3*4", 0.0), 14.0);
        assert_eq!(eval("(2+3)*4", 0.0), 20.0);
        assert_eq!(eval("10-3-2", 0.0), 5.0);
        assert_eq!(eval("15/3", 0.0), 5.0);
        assert_eq!(eval("x^2", 3.0), 9.0);
        assert_eq!(eval("x**2", 3.0), 9.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2^-1", 0.0), 0.5);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("2x", 3.0), 6.0);
        assert_eq!(eval("2(x+1)", 3.0), 8.0);
        assert_eq!(eval("(x+1)2", 3.0), 8.0);
        assert_eq!(eval("(x+1)x", 3.0), 12.0);
        assert_close(eval("2pi", 0.0), 2.0 * PI);
        assert_close(eval("2sin(x)+x^2", PI / 2.0), 2.0 + PI * PI / 4.0);
        assert_close(eval("3 x", 2.0), 6.0);
        assert_close(eval("(x+1)sin(x)", PI / 2.0), PI / 2.0 + 1.0);
        assert_close(eval("(x)pi", 2.0), 2.0 * PI);
        assert_close(eval("(x)e", 1.0), E);
        assert_eq!(compile("(x)sin(x)").unwrap().to_string(), "(x * sin(x))");
    }

    #[test]
    fn test_long_sums_compile() {
        let sum = compile(&vec!["x"; 1_000].join("+")).unwrap();
        assert_eq!(sum.eval(1.0), 1000.0);

        let terms = vec!["0.001x"; 300].join("+");
        assert_close(compile(&terms).unwrap().eval(1.0), 0.3);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("sin(x)", 0.0), 0.0);
        assert_close(eval("sin(x)", PI / 2.0), 1.0);
        assert_close(eval("cos(pi)", 0.0), -1.0);
        assert_close(eval("log(e)", 0.0), 1.0);
        assert_close(eval("log10(1000)", 0.0), 3.0);
        assert_close(eval("log2(8)", 0.0), 3.0);
        assert_close(eval("cbrt(-27)", 0.0), -3.0);
        assert_eq!(eval("abs(x)", -4.0), 4.0);
        assert_eq!(eval("floor(x)", -1.5), -2.0);
        assert_eq!(eval("ceil(x)", -1.5), -1.0);
        assert_eq!(eval("round(x)", -2.5), -2.0);
        assert_eq!(eval("sign(x)", -7.0), -1.0);
        assert_close(eval("exp(1)", 0.0), E);
        assert_close(eval("SQRT(ABS(X))", -16.0), 4.0);
        assert_close(eval("x*cos(x)", PI), -PI);
    }

    #[test]
    fn test_constants_are_independent_of_x() {
        for x in [-10.0, 0.0, 3.5, 1e6] {
            assert_close(eval("pi*2", x), 2.0 * PI);
            assert_close(eval("TAU", x), 2.0 * PI);
            assert_close(eval("phi^2 - phi", x), 1.0);
        }
        assert!(compile("pi*2").unwrap().is_constant());
        assert!(!compile("x").unwrap().is_constant());
    }

    #[test]
    fn test_runtime_domain_errors_are_values() {
        let reciprocal = eval("1/x", 0.0);
        assert!(reciprocal.is_infinite() || reciprocal.is_nan());
        assert!(eval("0/x", 0.0).is_nan());
        assert!(eval("sqrt(x)", -1.0).is_nan());
        assert!(eval("log(x)", -1.0).is_nan());
        assert_eq!(eval("log(x)", 0.0), f64::NEG_INFINITY);
        assert!(eval("asin(x)", 2.0).is_nan());
        assert_eq!(eval("exp(x)", 1000.0), f64::INFINITY);
        assert!(eval("x", f64::NAN).is_nan());
    }

    #[test]
    fn test_syntax_failures() {
        assert!(compile("nonsense(((").is_err());
        assert_eq!(
            compile("foo(x)").unwrap_err().to_string(),
            "unknown identifier 'foo'"
        );
        assert_eq!(
            compile("x + y").unwrap_err().to_string(),
            "unknown identifier 'y'"
        );
        assert_eq!(
            compile("2 # x").unwrap_err().to_string(),
            "unexpected character '#'"
        );
        assert_eq!(
            compile("(x+1").unwrap_err().to_string(),
            "missing ')' to close '('"
        );
        assert_eq!(compile("x+1)").unwrap_err().to_string(), "unmatched ')'");
        assert_eq!(
            compile("x*").unwrap_err().to_string(),
            "expression ends after '*'"
        );
        assert_eq!(
            compile("sin(x, 2)").unwrap_err().to_string(),
            "unexpected character ','"
        );
    }

    #[test]
    fn test_unbalanced_mutation_flips_to_failure() {
        let formulas = ["sin(x)", "2(x+1)", "sqrt(abs(x))", "cos(x)*x", "(x+1)^(2)"];
        for formula in formulas {
            assert!(compile(formula).is_ok(), "{formula} should compile");

            let opened = format!("({formula}");
            assert!(compile(&opened).is_err(), "{opened} should fail");

            let closed = format!("{formula})");
            assert!(compile(&closed).is_err(), "{closed} should fail");

            let stripped = formula.replacen(')', "", 1);
            assert!(compile(&stripped).is_err(), "{stripped} should fail");
        }
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let first = compile("x*cos(x) + 2sin(x)").unwrap();
        let second = compile("x*cos(x) + 2sin(x)").unwrap();
        for x in [-3.0, -0.5, 0.0, 0.25, 7.0] {
            assert_eq!(first.eval(x).to_bits(), second.eval(x).to_bits());
        }
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut vocab = MathVocabulary::empty();
        vocab.register_function("twice", |x| 2.0 * x);
        let compiler = ExpressionCompiler::new(&vocab);

        assert_eq!(compiler.compile("twice(x)").unwrap().eval(4.0), 8.0);
        assert_eq!(
            compiler.compile("sin(x)").unwrap_err(),
            ParseError::UnknownIdentifier("sin".to_string())
        );
        assert_eq!(
            compiler.compile("pi").unwrap_err(),
            ParseError::UnknownIdentifier("pi".to_string())
        );
    }

    #[test]
    fn test_panicking_custom_function_yields_nan() {
        let mut vocab = MathVocabulary::standard();
        vocab.register_function("strict", |x| {
            assert!(x <= 0.0, "strict called with {x}");
            x
        });
        let f = ExpressionCompiler::new(&vocab).compile("strict(x) + 1").unwrap();

        assert_eq!(f.eval(-1.0), 0.0);
        assert!(f.eval(1.0).is_nan());
        assert_eq!(f.eval(-2.0), -1.0);
    }

    #[test]
    fn test_probe_and_nowhere_finite() {
        let f = compile("1/x").unwrap();
        let probe = f.probe();
        assert_eq!(probe[0].0, 0.0);
        assert_eq!(probe[0].1, f64::INFINITY);
        assert_eq!(probe[1], (1.0, 1.0));
        assert!(!f.is_nowhere_finite());

        assert!(compile("sqrt(-1-x^2)").unwrap().is_nowhere_finite());
    }

    #[test]
    fn test_evaluable_is_shareable_across_threads() {
        let f = compile("x^2").unwrap();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = f.clone();
                std::thread::spawn(move || f.eval(i as f64))
            })
            .collect();
        let results: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![0.0, 1.0, 4.0, 9.0]);
    }

    #[test]
    fn test_source_and_display() {
        let f = compile("2sin(x)").unwrap();
        assert_eq!(f.source(), "2sin(x)");
        assert_eq!(f.to_string(), "(2 * sin(x))");
    }
}
