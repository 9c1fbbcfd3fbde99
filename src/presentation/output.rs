use std::fmt::Write;

use crate::domain::{MathVocabulary, Segment};

/// Renders a number the way the evaluator's results are usually read:
/// integers without a fraction, everything else with up to 10 digits.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == value.trunc() && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.10}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// One `label(x) = y` line per pair.
pub fn format_evaluations(label: &str, results: &[(f64, f64)]) -> String {
    let mut out = String::new();
    for (x, y) in results {
        let _ = writeln!(out, "{label}({}) = {}", format_number(*x), format_number(*y));
    }
    out
}

/// Aligned `segment x y` table with a header row.
pub fn format_samples_table(segments: &[Segment]) -> String {
    let mut out = format!("{:>7}  {:>16}  {:>16}\n", "segment", "x", "y");
    for (index, segment) in segments.iter().enumerate() {
        for point in segment {
            let _ = writeln!(
                out,
                "{:>7}  {:>16}  {:>16}",
                index,
                format_number(point.x),
                format_number(point.y)
            );
        }
    }
    out
}

pub fn format_vocabulary(vocabulary: &MathVocabulary) -> String {
    let mut out = String::from("functions:\n");
    for name in vocabulary.function_names() {
        let _ = writeln!(out, "  {name}");
    }
    out.push_str("constants:\n");
    for name in vocabulary.constant_names() {
        if let Some(value) = vocabulary.constant(name) {
            let _ = writeln!(out, "  {name} = {}", format_number(value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_format_evaluations() {
        let text = format_evaluations("f", &[(-2.0, 4.0), (0.0, f64::NAN)]);
        assert_eq!(text, "f(-2) = 4\nf(0) = NaN\n");
    }

    #[test]
    fn test_samples_table_has_one_row_per_point() {
        let segments = vec![
            vec![Point { x: -1.0, y: -1.0 }],
            vec![Point { x: 1.0, y: 1.0 }, Point { x: 2.0, y: 0.5 }],
        ];
        let table = format_samples_table(&segments);
        let rows: Vec<&str> = table.lines().collect();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].trim_start().starts_with("segment"));
        assert_eq!(rows[3].split_whitespace().collect::<Vec<_>>(), ["1", "2", "0.5"]);
    }

    #[test]
    fn test_vocabulary_listing() {
        let text = format_vocabulary(MathVocabulary::shared());
        assert!(text.starts_with("functions:\n"));
        assert!(text.contains("  sin\n"));
        assert!(text.contains("  pi = 3.1415926536\n"));
    }
}
