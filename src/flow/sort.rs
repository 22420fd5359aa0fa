//! Sort kinds, comparison flags and the comparators behind `Flow::sort`
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;

use crate::entries::Entries;
use crate::error::{FlowError, FlowResult};
use crate::value::Value;

/// The available sorts, addressable by name through `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// By value, ascending; keys are discarded.
    Sort,
    /// By value, descending; keys are discarded.
    Rsort,
    /// By value, ascending, keeping keys.
    Asort,
    /// By value, descending, keeping keys.
    Arsort,
    /// By key, ascending.
    Ksort,
    /// By key, descending.
    Krsort,
    /// Natural order by value, keeping keys.
    Natsort,
    /// Case-insensitive natural order by value, keeping keys.
    Natcasesort,
    /// Random order; keys are discarded.
    Shuffle,
    /// Custom value comparator; keys are discarded.
    Usort,
    /// Custom value comparator, keeping keys.
    Uasort,
    /// Custom key comparator.
    Uksort,
}

impl SortKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKind::Sort => "sort",
            SortKind::Rsort => "rsort",
            SortKind::Asort => "asort",
            SortKind::Arsort => "arsort",
            SortKind::Ksort => "ksort",
            SortKind::Krsort => "krsort",
            SortKind::Natsort => "natsort",
            SortKind::Natcasesort => "natcasesort",
            SortKind::Shuffle => "shuffle",
            SortKind::Usort => "usort",
            SortKind::Uasort => "uasort",
            SortKind::Uksort => "uksort",
        }
    }

    /// Kinds that take a caller comparator.
    pub fn is_custom(&self) -> bool {
        matches!(self, SortKind::Usort | SortKind::Uasort | SortKind::Uksort)
    }

    fn keeps_keys(&self) -> bool {
        !matches!(
            self,
            SortKind::Sort | SortKind::Rsort | SortKind::Shuffle | SortKind::Usort
        )
    }

    fn by_key(&self) -> bool {
        matches!(self, SortKind::Ksort | SortKind::Krsort | SortKind::Uksort)
    }

    fn descending(&self) -> bool {
        matches!(self, SortKind::Rsort | SortKind::Arsort | SortKind::Krsort)
    }
}

impl fmt::Display for SortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sort" => SortKind::Sort,
            "rsort" => SortKind::Rsort,
            "asort" => SortKind::Asort,
            "arsort" => SortKind::Arsort,
            "ksort" => SortKind::Ksort,
            "krsort" => SortKind::Krsort,
            "natsort" => SortKind::Natsort,
            "natcasesort" => SortKind::Natcasesort,
            "shuffle" => SortKind::Shuffle,
            "usort" => SortKind::Usort,
            "uasort" => SortKind::Uasort,
            "uksort" => SortKind::Uksort,
            other => {
                return Err(FlowError::invalid_argument(format!(
                    "Bad sort type: {}",
                    other
                )))
            }
        })
    }
}

/// How two values are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortCompare {
    /// Numbers and numeric strings numerically, other strings bytewise.
    #[default]
    Regular,
    Numeric,
    String,
    Natural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortFlags {
    pub compare: SortCompare,
    /// Only meaningful for `String` and `Natural`.
    pub fold_case: bool,
}

impl SortFlags {
    pub fn regular() -> Self {
        Self::default()
    }

    pub fn numeric() -> Self {
        Self {
            compare: SortCompare::Numeric,
            fold_case: false,
        }
    }

    pub fn string() -> Self {
        Self {
            compare: SortCompare::String,
            fold_case: false,
        }
    }

    pub fn natural() -> Self {
        Self {
            compare: SortCompare::Natural,
            fold_case: false,
        }
    }

    pub fn fold_case(mut self) -> Self {
        self.fold_case = true;
        self
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match self.compare {
            SortCompare::Regular => compare_regular(a, b),
            SortCompare::Numeric => {
                let x = a.as_f64().unwrap_or(0.0);
                let y = b.as_f64().unwrap_or(0.0);
                x.total_cmp(&y)
            }
            SortCompare::String => self.text(a).cmp(&self.text(b)),
            SortCompare::Natural => natural_cmp(&self.text(a), &self.text(b)),
        }
    }

    fn text(&self, value: &Value) -> String {
        if self.fold_case {
            value.to_text().to_lowercase()
        } else {
            value.to_text()
        }
    }
}

// ================================
// Comparators
// ================================

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => value.as_f64(),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => 1,
        Value::Str(_) => 2,
        Value::List(_) => 3,
        Value::Map(_) => 4,
    }
}

/// Default ordering: numbers (numeric strings included) numerically, strings bytewise,
/// collections by size, and mixed kinds by a fixed kind order.
pub fn compare_regular(a: &Value, b: &Value) -> Ordering {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return x.cmp(y);
    }
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x.total_cmp(&y);
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => x.len().cmp(&y.len()),
        (Value::Map(x), Value::Map(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_text().cmp(&b.to_text())),
    }
}

/// Natural ordering: digit runs compare by numeric value, everything else char by char.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut x = a.chars().peekable();
    let mut y = b.chars().peekable();
    loop {
        match (x.peek().copied(), y.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(c), Some(d)) if c.is_ascii_digit() && d.is_ascii_digit() => {
                let left = take_digits(&mut x);
                let right = take_digits(&mut y);
                let ord = left
                    .len()
                    .cmp(&right.len())
                    .then_with(|| left.cmp(&right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(c), Some(d)) => {
                if c != d {
                    return c.cmp(&d);
                }
                x.next();
                y.next();
            }
        }
    }
}

/// Consume a digit run, leading zeros stripped.
fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        if !(digits.is_empty() && c == '0') {
            digits.push(c);
        }
        chars.next();
    }
    digits
}

// ================================
// Sorting materialized data
// ================================

fn finish(entries: Entries, kind: SortKind) -> Entries {
    if kind.keeps_keys() {
        entries
    } else {
        entries.packed()
    }
}

/// Sort with one of the built-in comparators. Custom kinds are rejected.
pub fn sort_entries(mut entries: Entries, kind: SortKind, flags: SortFlags) -> FlowResult<Entries> {
    if kind.is_custom() {
        return Err(FlowError::invalid_argument(format!(
            "sort type {} needs a comparator, use sort_by",
            kind
        )));
    }
    if kind == SortKind::Shuffle {
        let mut values = entries.into_values();
        values.shuffle(&mut rand::thread_rng());
        return Ok(Entries::from_values(values));
    }
    let flags = match kind {
        SortKind::Natsort => SortFlags::natural(),
        SortKind::Natcasesort => SortFlags::natural().fold_case(),
        _ => flags,
    };
    let by_key = kind.by_key();
    let descending = kind.descending();
    entries.sort_by(|a, b| {
        let (a, b) = if descending { (b, a) } else { (a, b) };
        if by_key {
            flags.compare(&Value::from(a.0.clone()), &Value::from(b.0.clone()))
        } else {
            flags.compare(&a.1, &b.1)
        }
    });
    Ok(finish(entries, kind))
}

/// Sort with a caller comparator. `Usort`/`Uasort` compare values, `Uksort` compares keys.
pub fn sort_entries_by<F>(mut entries: Entries, kind: SortKind, mut compare: F) -> FlowResult<Entries>
where
    F: FnMut(&Value, &Value) -> Ordering,
{
    if !kind.is_custom() {
        return Err(FlowError::invalid_argument(format!(
            "sort type {} does not take a comparator",
            kind
        )));
    }
    if kind.by_key() {
        entries.sort_by(|a, b| compare(&Value::from(a.0.clone()), &Value::from(b.0.clone())));
    } else {
        entries.sort_by(|a, b| compare(&a.1, &b.1));
    }
    Ok(finish(entries, kind))
}
