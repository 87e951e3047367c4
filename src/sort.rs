//! Sort & top-N (component L): a stable multi-key `ArgSort` and heap-based
//! k-smallest/k-largest selection.
//!
//! Comparisons go through [`OrdKey`], a total-order mirror of [`ScalarValue`]
//! (NaN-safe via `f64::total_cmp`) so every logical column type — including
//! strings and timestamps — can feed the same comparator and heap.

use crate::error::Result;
use crate::table::Table;
use crate::value::ScalarValue;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A totally-ordered mirror of [`ScalarValue`], used internally by sort and
/// top-N so every comparable logical type shares one comparator.
#[derive(Debug, Clone, PartialEq)]
enum OrdKey {
    I32(i32),
    F64(f64),
    Bool(bool),
    Str(String),
    Timestamp(i64),
}

impl OrdKey {
    fn from_scalar(v: &ScalarValue) -> Option<Self> {
        match v {
            ScalarValue::Null => None,
            ScalarValue::I32(x) => Some(OrdKey::I32(*x)),
            ScalarValue::F64(x) => Some(OrdKey::F64(*x)),
            ScalarValue::Bool(x) => Some(OrdKey::Bool(*x)),
            ScalarValue::Str(x) => Some(OrdKey::Str(x.clone())),
            ScalarValue::Timestamp(x) => Some(OrdKey::Timestamp(x.0)),
        }
    }
}

impl Eq for OrdKey {}

impl PartialOrd for OrdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OrdKey::I32(a), OrdKey::I32(b)) => a.cmp(b),
            (OrdKey::F64(a), OrdKey::F64(b)) => a.total_cmp(b),
            (OrdKey::Bool(a), OrdKey::Bool(b)) => a.cmp(b),
            (OrdKey::Str(a), OrdKey::Str(b)) => a.cmp(b),
            (OrdKey::Timestamp(a), OrdKey::Timestamp(b)) => a.cmp(b),
            // Mixed-variant comparisons never occur in practice (a column is
            // one logical type throughout); fall back to a stable but
            // otherwise meaningless order rather than panicking.
            _ => Ordering::Equal,
        }
    }
}

/// One sort key: a column name and its direction.
#[derive(Debug, Clone)]
pub struct SortKey {
    /// Column to compare on.
    pub column: String,
    /// `true` for ascending, `false` for descending.
    pub ascending: bool,
}

impl SortKey {
    /// An ascending sort key.
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: true }
    }

    /// A descending sort key.
    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), ascending: false }
    }
}

fn row_key(table: &Table, keys: &[SortKey], row: usize) -> Result<Vec<Option<OrdKey>>> {
    keys.iter()
        .map(|k| table.column(&k.column).map(|c| c.get_boxed(row)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .map(|values| values.iter().map(OrdKey::from_scalar).collect())
}

fn compare_rows(a: &[Option<OrdKey>], b: &[Option<OrdKey>], keys: &[SortKey]) -> Ordering {
    for (i, key) in keys.iter().enumerate() {
        let ord = match (&a[i], &b[i]) {
            (None, None) => Ordering::Equal,
            // Nulls sort first ascending, last descending, regardless of
            // direction's effect on non-null values below.
            (None, Some(_)) => if key.ascending { Ordering::Less } else { Ordering::Greater },
            (Some(_), None) => if key.ascending { Ordering::Greater } else { Ordering::Less },
            (Some(x), Some(y)) => {
                let c = x.cmp(y);
                if key.ascending { c } else { c.reverse() }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// A stable permutation of `0..table.row_count()` ordered by `keys` in turn.
/// Ties within every key preserve source order (the sort is stable). Nulls
/// sort first for an ascending key, last for a descending one.
pub fn arg_sort(table: &Table, keys: &[SortKey]) -> Result<Vec<usize>> {
    let n = table.row_count();
    let mut row_keys = Vec::with_capacity(n);
    for row in 0..n {
        row_keys.push(row_key(table, keys, row)?);
    }
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| compare_rows(&row_keys[a], &row_keys[b], keys));
    Ok(indices)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapEntry {
    key: OrdKey,
    row: usize,
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Row indices of the `n` smallest values of `column`, ascending, with nulls
/// never selected. For `n >= row_count` this delegates to a full ascending
/// `ArgSort`; otherwise a bounded max-heap of size `n` tracks the smallest
/// values seen so far in one pass.
pub fn smallest(table: &Table, n: usize, column: &str) -> Result<Vec<usize>> {
    if n >= table.row_count() {
        return arg_sort(table, &[SortKey::asc(column)]);
    }
    let col = table.column(column)?;
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(n);
    for row in 0..table.row_count() {
        let Some(key) = OrdKey::from_scalar(&col.get_boxed(row)?) else { continue };
        if heap.len() < n {
            heap.push(HeapEntry { key, row });
        } else if let Some(top) = heap.peek() {
            if key < top.key {
                heap.pop();
                heap.push(HeapEntry { key, row });
            }
        }
    }
    finish_topn(table, heap, column, true)
}

/// Row indices of the `n` largest values of `column`, descending, with nulls
/// never selected. Mirrors [`smallest`] with a bounded min-heap.
pub fn largest(table: &Table, n: usize, column: &str) -> Result<Vec<usize>> {
    if n >= table.row_count() {
        return arg_sort(table, &[SortKey::desc(column)]);
    }
    let col = table.column(column)?;
    let mut heap: BinaryHeap<std::cmp::Reverse<HeapEntry>> = BinaryHeap::with_capacity(n);
    for row in 0..table.row_count() {
        let Some(key) = OrdKey::from_scalar(&col.get_boxed(row)?) else { continue };
        if heap.len() < n {
            heap.push(std::cmp::Reverse(HeapEntry { key, row }));
        } else if let Some(std::cmp::Reverse(top)) = heap.peek() {
            if key > top.key {
                heap.pop();
                heap.push(std::cmp::Reverse(HeapEntry { key, row }));
            }
        }
    }
    let heap: BinaryHeap<HeapEntry> = heap.into_iter().map(|std::cmp::Reverse(e)| e).collect();
    finish_topn(table, heap, column, false)
}

fn finish_topn(
    table: &Table,
    heap: BinaryHeap<HeapEntry>,
    column: &str,
    ascending: bool,
) -> Result<Vec<usize>> {
    let rows: Vec<usize> = heap.into_iter().map(|e| e.row).collect();
    let subset = table.gather(&rows)?;
    let order = arg_sort(&subset, &[SortKey { column: column.to_string(), ascending }])?;
    Ok(order.into_iter().map(|i| rows[i]).collect())
}
