//! Formula list management.
//!
//! [`FormulaBook`] keeps the user's formulas in display order, recompiles
//! a formula whenever its text changes and caches the compiled function so
//! plotting never parses.

use std::collections::HashMap;

use log::debug;

use crate::domain::{Evaluable, ExpressionCompiler, Formula};

/// Colors handed to new formulas, in rotation.
pub const FORMULA_COLORS: [&str; 8] = [
    "#ff6b6b", "#4ecdc4", "#ffe66d", "#95e1d3", "#f38181", "#aa96da", "#fcbad3", "#a8d8ea",
];

/// Colors handed to comparison curves, in rotation.
pub const COMPARE_COLORS: [&str; 5] = ["#a8d8ea", "#aa96da", "#fcbad3", "#ffffd2", "#95e1d3"];

/// Formulas added by [`FormulaBook::add_examples`].
pub const EXAMPLE_FORMULAS: [&str; 4] = ["sin(x)", "x^2", "cos(x) * x", "sqrt(abs(x))"];

/// A formula ready to draw: enabled, valid and compiled.
#[derive(Debug, Clone)]
pub struct PlottedFormula {
    pub formula: Formula,
    pub evaluable: Evaluable,
}

/// Ordered list of formulas with their compiled functions.
///
/// Locked formulas cannot be removed or have their expression changed.
///
/// # Examples
///
/// ```
/// use plotscope::application::FormulaBook;
///
/// let mut book = FormulaBook::default();
/// let id = book.add_formula("2x");
/// book.add_formula("x +");
///
/// let plotted = book.plotted_formulas();
/// assert_eq!(plotted.len(), 1);
/// assert_eq!(plotted[0].formula.id, id);
/// assert_eq!(plotted[0].evaluable.eval(4.0), 8.0);
/// ```
#[derive(Debug)]
pub struct FormulaBook {
    formulas: Vec<Formula>,
    compiled: HashMap<String, Evaluable>,
    next_id: usize,
    id_prefix: String,
    palette: &'static [&'static str],
    compiler: ExpressionCompiler<'static>,
}

impl Default for FormulaBook {
    fn default() -> Self {
        Self::new("formula", &FORMULA_COLORS)
    }
}

impl FormulaBook {
    /// Creates an empty book whose ids look like `<id_prefix>-<n>`.
    pub fn new(id_prefix: &str, palette: &'static [&'static str]) -> Self {
        Self {
            formulas: Vec::new(),
            compiled: HashMap::new(),
            next_id: 1,
            id_prefix: id_prefix.to_string(),
            palette,
            compiler: ExpressionCompiler::default(),
        }
    }

    /// Rebuilds a book from saved formulas, recompiling every expression.
    ///
    /// Numbering resumes after the highest `<id_prefix>-<n>` already present.
    pub fn restore(id_prefix: &str, palette: &'static [&'static str], formulas: Vec<Formula>) -> Self {
        let mut book = Self::new(id_prefix, palette);
        let prefix = format!("{id_prefix}-");

        book.next_id = formulas
            .iter()
            .filter_map(|f| f.id.strip_prefix(&prefix)?.parse::<usize>().ok())
            .max()
            .map_or(1, |max| max + 1);

        for mut formula in formulas {
            book.recompile(&mut formula);
            book.formulas.push(formula);
        }
        book
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    pub fn get(&self, id: &str) -> Option<&Formula> {
        self.formulas.iter().find(|f| f.id == id)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Compiled function of a valid formula.
    pub fn evaluable(&self, id: &str) -> Option<&Evaluable> {
        self.compiled.get(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.formulas.iter().position(|f| f.id == id)
    }

    fn recompile(&mut self, formula: &mut Formula) {
        let compiled = self.compiler.compile(&formula.expression);
        formula.record_compilation(&compiled);
        match compiled {
            Ok(evaluable) => {
                self.compiled.insert(formula.id.clone(), evaluable);
            }
            Err(_) => {
                self.compiled.remove(&formula.id);
            }
        }
    }

    /// Appends a formula and returns its id. Invalid expressions are kept,
    /// marked invalid with the compiler's message.
    pub fn add_formula(&mut self, expression: &str) -> String {
        let id = format!("{}-{}", self.id_prefix, self.next_id);
        self.next_id += 1;
        let color = self
            .palette
            .iter()
            .cycle()
            .nth(self.formulas.len())
            .copied()
            .unwrap_or(FORMULA_COLORS[0])
            .to_string();

        let compiled = self.compiler.compile(expression);
        let formula = Formula::new(id.clone(), expression.to_string(), color, &compiled);
        if let Ok(evaluable) = compiled {
            self.compiled.insert(id.clone(), evaluable);
        }

        debug!("added {id}: {expression:?} (valid: {})", formula.valid);
        self.formulas.push(formula);
        id
    }

    /// Removes a formula. Returns false if it is missing or locked.
    pub fn remove_formula(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) if !self.formulas[index].locked => {
                self.formulas.remove(index);
                self.compiled.remove(id);
                debug!("removed {id}");
                true
            }
            _ => false,
        }
    }

    /// Replaces the expression and recompiles it. Returns false if the
    /// formula is missing or locked.
    pub fn update_expression(&mut self, id: &str, expression: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.formulas[index].locked {
            return false;
        }

        let mut formula = self.formulas[index].clone();
        formula.expression = expression.to_string();
        self.recompile(&mut formula);
        self.formulas[index] = formula;
        true
    }

    pub fn update_color(&mut self, id: &str, color: &str) -> bool {
        self.modify(id, |f| f.color = color.to_string())
    }

    pub fn toggle_enabled(&mut self, id: &str) -> bool {
        self.modify(id, |f| f.enabled = !f.enabled)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        self.modify(id, |f| f.enabled = enabled)
    }

    pub fn toggle_locked(&mut self, id: &str) -> bool {
        self.modify(id, |f| f.locked = !f.locked)
    }

    fn modify(&mut self, id: &str, change: impl FnOnce(&mut Formula)) -> bool {
        match self.formulas.iter_mut().find(|f| f.id == id) {
            Some(formula) => {
                change(formula);
                true
            }
            None => false,
        }
    }

    /// Appends a copy of the formula's expression as a new formula.
    pub fn duplicate_formula(&mut self, id: &str) -> Option<String> {
        let expression = self.get(id)?.expression.clone();
        Some(self.add_formula(&expression))
    }

    pub fn move_up(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) if index > 0 => {
                self.formulas.swap(index - 1, index);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.formulas.len() => {
                self.formulas.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Removes every unlocked formula.
    pub fn clear_all(&mut self) {
        self.formulas.retain(|f| f.locked);
        let kept: Vec<&str> = self.formulas.iter().map(|f| f.id.as_str()).collect();
        self.compiled.retain(|id, _| kept.contains(&id.as_str()));
        debug!("cleared book, {} locked formulas kept", self.formulas.len());
    }

    pub fn add_examples(&mut self) {
        for expression in EXAMPLE_FORMULAS {
            self.add_formula(expression);
        }
    }

    /// Enabled, valid formulas with their compiled functions, in order.
    pub fn plotted_formulas(&self) -> Vec<PlottedFormula> {
        self.formulas
            .iter()
            .filter(|f| f.enabled && f.valid)
            .filter_map(|f| {
                self.compiled.get(&f.id).map(|evaluable| PlottedFormula {
                    formula: f.clone(),
                    evaluable: evaluable.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(book: &FormulaBook) -> Vec<&str> {
        book.formulas().iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_add_formula_assigns_ids_and_colors() {
        let mut book = FormulaBook::default();
        let first = book.add_formula("sin(x)");
        let second = book.add_formula("x^2");

        assert_eq!(first, "formula-1");
        assert_eq!(second, "formula-2");
        assert_eq!(book.get(&first).unwrap().color, FORMULA_COLORS[0]);
        assert_eq!(book.get(&second).unwrap().color, FORMULA_COLORS[1]);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_colors_rotate_through_palette() {
        let mut book = FormulaBook::new("compare", &COMPARE_COLORS);
        for _ in 0..6 {
            book.add_formula("x");
        }
        assert_eq!(book.formulas()[5].color, COMPARE_COLORS[0]);
        assert_eq!(book.formulas()[5].id, "compare-6");
    }

    #[test]
    fn test_invalid_formula_is_kept_but_not_plotted() {
        let mut book = FormulaBook::default();
        let id = book.add_formula("sin(");

        let formula = book.get(&id).unwrap();
        assert!(!formula.valid);
        assert_eq!(formula.error_message.as_deref(), Some("expression ends after '('"));
        assert!(book.evaluable(&id).is_none());
        assert!(book.plotted_formulas().is_empty());
    }

    #[test]
    fn test_update_expression_recompiles() {
        let mut book = FormulaBook::default();
        let id = book.add_formula("x");

        assert!(book.update_expression(&id, "x +"));
        assert!(!book.get(&id).unwrap().valid);
        assert!(book.evaluable(&id).is_none());

        assert!(book.update_expression(&id, "3x"));
        let formula = book.get(&id).unwrap();
        assert!(formula.valid);
        assert_eq!(formula.error_message, None);
        assert_eq!(book.evaluable(&id).unwrap().eval(2.0), 6.0);

        assert!(!book.update_expression("formula-99", "x"));
    }

    #[test]
    fn test_locked_formula_cannot_change_or_go() {
        let mut book = FormulaBook::default();
        let id = book.add_formula("x");
        assert!(book.toggle_locked(&id));

        assert!(!book.update_expression(&id, "2x"));
        assert!(!book.remove_formula(&id));
        assert_eq!(book.get(&id).unwrap().expression, "x");

        // cosmetic changes still apply
        assert!(book.update_color(&id, "#000000"));
        assert!(book.toggle_enabled(&id));
        assert!(!book.get(&id).unwrap().enabled);

        book.toggle_locked(&id);
        assert!(book.remove_formula(&id));
        assert!(book.is_empty());
    }

    #[test]
    fn test_disabled_formulas_are_not_plotted() {
        let mut book = FormulaBook::default();
        let a = book.add_formula("x");
        let b = book.add_formula("2x");
        book.set_enabled(&a, false);

        let plotted = book.plotted_formulas();
        assert_eq!(plotted.len(), 1);
        assert_eq!(plotted[0].formula.id, b);
    }

    #[test]
    fn test_move_and_duplicate() {
        let mut book = FormulaBook::default();
        let a = book.add_formula("x");
        let b = book.add_formula("x^2");
        let c = book.add_formula("x^3");

        assert!(!book.move_up(&a));
        assert!(book.move_up(&c));
        assert_eq!(ids(&book), vec![a.as_str(), c.as_str(), b.as_str()]);

        assert!(!book.move_down(&b));
        assert!(book.move_down(&a));
        assert_eq!(ids(&book), vec![c.as_str(), a.as_str(), b.as_str()]);

        let copy = book.duplicate_formula(&c).unwrap();
        assert_eq!(copy, "formula-4");
        assert_eq!(book.get(&copy).unwrap().expression, "x^3");
        assert!(book.duplicate_formula("missing").is_none());
    }

    #[test]
    fn test_examples_and_clear() {
        let mut book = FormulaBook::default();
        book.add_examples();
        assert_eq!(book.len(), EXAMPLE_FORMULAS.len());
        assert_eq!(book.plotted_formulas().len(), EXAMPLE_FORMULAS.len());

        book.toggle_locked("formula-1");
        assert!(!book.remove_formula("formula-1"));
        book.clear_all();
        assert_eq!(ids(&book), vec!["formula-1"]);
        assert_eq!(book.evaluable("formula-1").unwrap().source(), "sin(x)");
        assert!(book.evaluable("formula-2").is_none());
        assert_eq!(book.plotted_formulas().len(), 1);

        book.toggle_locked("formula-1");
        book.clear_all();
        assert!(book.is_empty());
        assert!(book.evaluable("formula-1").is_none());
    }

    #[test]
    fn test_restore_resumes_numbering_and_revalidates() {
        let saved = vec![
            Formula {
                id: "compare-4".into(),
                expression: "x^2".into(),
                color: "#a8d8ea".into(),
                enabled: true,
                locked: true,
                valid: false,
                error_message: Some("stale".into()),
            },
            Formula {
                id: "compare-2".into(),
                expression: "foo".into(),
                color: "#aa96da".into(),
                enabled: true,
                locked: false,
                valid: true,
                error_message: None,
            },
        ];

        let mut book = FormulaBook::restore("compare", &COMPARE_COLORS, saved);
        assert!(book.get("compare-4").unwrap().valid);
        assert_eq!(book.get("compare-4").unwrap().error_message, None);
        assert!(book.get("compare-4").unwrap().locked);
        assert!(!book.get("compare-2").unwrap().valid);
        assert_eq!(book.plotted_formulas().len(), 1);

        assert_eq!(book.add_formula("x"), "compare-5");
    }
}
