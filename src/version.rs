//! Loose dotted-version comparison
//!
//! Module feeds carry free-form version strings ("1.2", "2.0-r4", "1.0beta2"),
//! so comparison follows the tolerant dotted-version rules rather than semver:
//! parts are split on separators and on every digit/non-digit boundary, numbers
//! compare numerically, and words rank by their release stage.

use std::cmp::Ordering;
use std::str::FromStr;

/// Placeholder standing for "a number" when ranking words against digits
const NUMBER_FORM: &str = "#N#";

/// Release-stage words, matched by prefix in this order
const SPECIAL_FORMS: &[(&str, i32)] = &[
    ("dev", 0),
    ("alpha", 1),
    ("a", 1),
    ("beta", 2),
    ("b", 2),
    ("RC", 3),
    ("rc", 3),
    ("#", 4),
    ("pl", 5),
    ("p", 5),
];

/// Rank of any word not listed in [`SPECIAL_FORMS`]
const UNKNOWN_FORM: i32 = -6;

/// Comparison operator accepted by [`versions_compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl CompareOp {
    fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }
}

impl FromStr for CompareOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" | "lt" => Ok(CompareOp::Lt),
            "<=" | "le" => Ok(CompareOp::Le),
            "==" | "=" | "eq" => Ok(CompareOp::Eq),
            ">=" | "ge" => Ok(CompareOp::Ge),
            ">" | "gt" => Ok(CompareOp::Gt),
            "!=" | "<>" | "ne" => Ok(CompareOp::Ne),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown version operator: {0}")]
pub struct UnknownOperator(pub String);

/// How operands are normalized before comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompareMode {
    /// Rewrite a trailing `-r<digits>` revision marker to `-p<digits>`
    #[default]
    Strict,
    /// Keep only the leading `[0-9.]*` part of each operand
    Loose,
}

/// Compare `current` against `required` with `op`, after normalizing both
/// operands according to `mode`.
///
/// Normalization only affects the comparison; callers keep their strings.
///
/// ```
/// use dcrepo::version::{CompareMode, CompareOp, versions_compare};
///
/// assert!(versions_compare("1.0-r5", "1.0-r4", CompareOp::Gt, CompareMode::Strict));
/// assert!(versions_compare("2.20", "2.19", CompareOp::Ge, CompareMode::Loose));
/// ```
pub fn versions_compare(current: &str, required: &str, op: CompareOp, mode: CompareMode) -> bool {
    let (current, required) = match mode {
        CompareMode::Strict => (revision_as_patch(current), revision_as_patch(required)),
        CompareMode::Loose => (
            numeric_prefix(current).to_string(),
            numeric_prefix(required).to_string(),
        ),
    };
    op.matches(compare_versions(&current, &required))
}

/// Total order over loose version strings.
///
/// An empty version sorts before any non-empty one.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    let a = prepare(a);
    let b = prepare(b);
    let parts_a: Vec<&str> = a.split('.').filter(|p| !p.is_empty()).collect();
    let parts_b: Vec<&str> = b.split('.').filter(|p| !p.is_empty()).collect();

    let mut index = 0;
    while index < parts_a.len() && index < parts_b.len() {
        let ordering = compare_part(parts_a[index], parts_b[index]);
        if ordering != Ordering::Equal {
            return ordering;
        }
        index += 1;
    }

    if index < parts_a.len() {
        let rest = parts_a[index..].join(".");
        if starts_with_digit(&rest) {
            Ordering::Greater
        } else {
            compare_versions(&rest, NUMBER_FORM)
        }
    } else if index < parts_b.len() {
        let rest = parts_b[index..].join(".");
        if starts_with_digit(&rest) {
            Ordering::Less
        } else {
            compare_versions(NUMBER_FORM, &rest)
        }
    } else {
        Ordering::Equal
    }
}

fn prepare(version: &str) -> String {
    if version.starts_with('#') {
        version.to_string()
    } else {
        canonicalize(version)
    }
}

/// Turn separators into dots and split digit/non-digit runs.
///
/// "1.0-rc1" becomes "1.0.rc.1"; "2_0+beta" becomes "2.0.beta".
fn canonicalize(version: &str) -> String {
    let mut chars = version.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(version.len() * 2);
    out.push(first);
    let mut last = first;

    for c in chars {
        let needs_dot = !out.ends_with('.');
        if matches!(c, '-' | '_' | '+') {
            if needs_dot {
                out.push('.');
            }
        } else if (is_non_digit(last) && c.is_ascii_digit())
            || (last.is_ascii_digit() && is_non_digit(c))
        {
            if needs_dot {
                out.push('.');
            }
            out.push(c);
        } else if !c.is_ascii_alphanumeric() {
            if needs_dot {
                out.push('.');
            }
        } else {
            out.push(c);
        }
        last = c;
    }

    out
}

fn is_non_digit(c: char) -> bool {
    !c.is_ascii_digit() && c != '.'
}

fn starts_with_digit(part: &str) -> bool {
    part.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn compare_part(a: &str, b: &str) -> Ordering {
    match (starts_with_digit(a), starts_with_digit(b)) {
        (true, true) => compare_numeric(a, b),
        (false, false) => special_form_rank(a).cmp(&special_form_rank(b)),
        (true, false) => special_form_rank(NUMBER_FORM).cmp(&special_form_rank(b)),
        (false, true) => special_form_rank(a).cmp(&special_form_rank(NUMBER_FORM)),
    }
}

/// Compare two digit runs without overflowing on long numbers
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let digits = |s: &str| -> String {
        let run: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        let trimmed = run.trim_start_matches('0');
        trimmed.to_string()
    };
    let (a, b) = (digits(a), digits(b));
    a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
}

fn special_form_rank(part: &str) -> i32 {
    SPECIAL_FORMS
        .iter()
        .find(|(name, _)| part.starts_with(name))
        .map(|(_, rank)| *rank)
        .unwrap_or(UNKNOWN_FORM)
}

/// Rewrite a trailing `-r<digits>` to `-p<digits>`
fn revision_as_patch(version: &str) -> String {
    if let Some(pos) = version.rfind("-r") {
        let revision = &version[pos + 2..];
        if !revision.is_empty() && revision.chars().all(|c| c.is_ascii_digit()) {
            return format!("{}-p{}", &version[..pos], revision);
        }
    }
    version.to_string()
}

fn numeric_prefix(version: &str) -> &str {
    let end = version
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(version.len());
    &version[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.0", "1.0", Ordering::Equal)]
    #[case("1.0", "1.0.0", Ordering::Less)]
    #[case("1.10", "1.9", Ordering::Greater)]
    #[case("2.20", "2.21", Ordering::Less)]
    #[case("1.0rc1", "1.0", Ordering::Less)]
    #[case("1.0-dev", "1.0-alpha", Ordering::Less)]
    #[case("1.0alpha", "1.0beta", Ordering::Less)]
    #[case("1.0b1", "1.0RC1", Ordering::Less)]
    #[case("1.0pl1", "1.0", Ordering::Greater)]
    #[case("1.0-p5", "1.0-p4", Ordering::Greater)]
    #[case("1.0-foo", "1.0-dev", Ordering::Less)]
    #[case("", "", Ordering::Equal)]
    #[case("", "0.1", Ordering::Less)]
    #[case("0.1", "", Ordering::Greater)]
    #[case("1_0", "1.0", Ordering::Equal)]
    #[case("10000000000000000000001", "10000000000000000000000", Ordering::Greater)]
    fn compare_versions_orders_loose_strings(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(a, b), expected);
    }

    #[rstest]
    #[case("1.0-rc1", "1.0.rc.1")]
    #[case("2_0+beta", "2.0.beta")]
    #[case("1.0b2", "1.0.b.2")]
    #[case("1.2~3", "1.2.~.3")]
    fn canonicalize_splits_runs(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonicalize(input), expected);
    }

    #[test]
    fn strict_mode_treats_revision_as_patch() {
        assert!(versions_compare(
            "1.0-r5",
            "1.0-r4",
            CompareOp::Gt,
            CompareMode::Strict
        ));
        // "-r1" would otherwise rank as a release candidate
        assert!(versions_compare(
            "1.0-r1",
            "1.0",
            CompareOp::Gt,
            CompareMode::Strict
        ));
    }

    #[test]
    fn revision_rewrite_requires_trailing_digits() {
        assert_eq!(revision_as_patch("1.0-r12"), "1.0-p12");
        assert_eq!(revision_as_patch("1.0-rc1"), "1.0-rc1");
        assert_eq!(revision_as_patch("1.0-r"), "1.0-r");
    }

    #[rstest]
    #[case("2.20", "2.21", false)]
    #[case("2.20", "2.19", true)]
    #[case("2.20", "2.20-beta", true)]
    #[case("2.20-dev", "2.20", true)]
    #[case("2.20", "", true)]
    fn loose_mode_ignores_suffixes(
        #[case] current: &str,
        #[case] required: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            versions_compare(current, required, CompareOp::Ge, CompareMode::Loose),
            expected
        );
    }

    #[rstest]
    #[case("<", CompareOp::Lt)]
    #[case("le", CompareOp::Le)]
    #[case("=", CompareOp::Eq)]
    #[case(">=", CompareOp::Ge)]
    #[case("gt", CompareOp::Gt)]
    #[case("<>", CompareOp::Ne)]
    fn compare_op_parses_symbols_and_names(#[case] input: &str, #[case] expected: CompareOp) {
        assert_eq!(input.parse::<CompareOp>(), Ok(expected));
    }

    #[test]
    fn compare_op_rejects_unknown_operator() {
        assert_eq!(
            "~>".parse::<CompareOp>(),
            Err(UnknownOperator("~>".to_string()))
        );
    }

    #[rstest]
    #[case(CompareOp::Lt, false)]
    #[case(CompareOp::Le, false)]
    #[case(CompareOp::Eq, false)]
    #[case(CompareOp::Ne, true)]
    #[case(CompareOp::Ge, true)]
    #[case(CompareOp::Gt, true)]
    fn versions_compare_applies_operator(#[case] op: CompareOp, #[case] expected: bool) {
        assert_eq!(
            versions_compare("1.1", "1.0", op, CompareMode::Strict),
            expected
        );
    }
}
