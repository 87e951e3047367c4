//! Zero-copy column views: windows over a contiguous sub-range, and gathers
//! through an arbitrary index map. Both wrap a [`Column`] by reference-counted
//! handle and expose it under a different index space without copying any
//! values. Neither supports mutation or capacity growth — disposal is the
//! caller dropping the `Rc`, not an explicit free.

use crate::column::Column;
use crate::error::{Error, Result};
use std::rc::Rc;

/// A read-only contiguous sub-range `[offset, offset + length)` of a source
/// column. `source[offset + i]` answers logical index `i`.
#[derive(Debug, Clone)]
pub struct WindowView {
    source: Rc<Column>,
    offset: usize,
    length: usize,
}

impl WindowView {
    /// A window of `length` rows starting at `offset` in `source`.
    pub fn new(source: Rc<Column>, offset: usize, length: usize) -> Result<Self> {
        if offset + length > source.len() {
            return Err(Error::OutOfRange { index: offset + length, length: source.len() });
        }
        Ok(Self { source, offset, length })
    }

    /// Number of rows visible through this window.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when the window covers zero rows.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn translate(&self, i: usize) -> Result<usize> {
        if i >= self.length {
            return Err(Error::OutOfRange { index: i, length: self.length });
        }
        Ok(self.offset + i)
    }

    /// `true` iff logical row `i` is null in the source.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.source.is_null(self.translate(i)?)
    }

    /// The underlying column, for typed reads keyed by the translated index.
    pub fn source(&self) -> &Column {
        &self.source
    }

    /// Translate a logical index into the source's index space.
    pub fn source_index(&self, i: usize) -> Result<usize> {
        self.translate(i)
    }

    /// Materialize the rows at `indices` (in this view's index space) as an
    /// owning column, by translating through the window before delegating to
    /// the source's own gather.
    pub fn gather(&self, indices: &[usize]) -> Result<Column> {
        let translated: Vec<usize> =
            indices.iter().map(|&i| self.translate(i)).collect::<Result<_>>()?;
        self.source.gather(&translated)
    }
}

/// A read-only view through an arbitrary row permutation/selection. Logical
/// index `i` answers `source[index_map[i]]`. Composes with further gathers by
/// mapping through `index_map` first.
#[derive(Debug, Clone)]
pub struct GatherView {
    source: Rc<Column>,
    index_map: Vec<usize>,
}

impl GatherView {
    /// A gather view over `source` using `index_map`. Every entry must be a
    /// valid index into `source`.
    pub fn new(source: Rc<Column>, index_map: Vec<usize>) -> Result<Self> {
        for &i in &index_map {
            if i >= source.len() {
                return Err(Error::OutOfRange { index: i, length: source.len() });
            }
        }
        Ok(Self { source, index_map })
    }

    /// Number of rows visible through this view.
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    /// True when the view selects zero rows.
    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    fn translate(&self, i: usize) -> Result<usize> {
        self.index_map
            .get(i)
            .copied()
            .ok_or(Error::OutOfRange { index: i, length: self.index_map.len() })
    }

    /// `true` iff logical row `i` is null in the source.
    pub fn is_null(&self, i: usize) -> Result<bool> {
        self.source.is_null(self.translate(i)?)
    }

    /// The underlying column, for typed reads keyed by the translated index.
    pub fn source(&self) -> &Column {
        &self.source
    }

    /// Translate a logical index into the source's index space.
    pub fn source_index(&self, i: usize) -> Result<usize> {
        self.translate(i)
    }

    /// Materialize the rows at `indices` (in this view's index space) as an
    /// owning column: a gather-of-gather composes by mapping each requested
    /// index through `index_map` before delegating to the source.
    pub fn gather(&self, indices: &[usize]) -> Result<Column> {
        let translated: Vec<usize> =
            indices.iter().map(|&i| self.translate(i)).collect::<Result<_>>()?;
        self.source.gather(&translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;

    fn sample() -> Rc<Column> {
        let mut c = PrimitiveColumn::<i32>::new("n", false, 5);
        for v in 0..5 {
            c.append(v);
        }
        Rc::new(Column::I32(c))
    }

    #[test]
    fn window_translates_indices() {
        let src = sample();
        let w = WindowView::new(src, 1, 3).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.source_index(0).unwrap(), 1);
        assert_eq!(w.source_index(2).unwrap(), 3);
        assert!(w.source_index(3).is_err());
    }

    #[test]
    fn window_out_of_bounds_construction_fails() {
        let src = sample();
        assert!(WindowView::new(src, 3, 5).is_err());
    }

    #[test]
    fn gather_view_translates_indices() {
        let src = sample();
        let g = GatherView::new(src, vec![4, 2, 0]).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.source_index(0).unwrap(), 4);
        assert_eq!(g.source_index(1).unwrap(), 2);
    }

    #[test]
    fn gather_view_rejects_invalid_index_map() {
        let src = sample();
        assert!(GatherView::new(src, vec![0, 99]).is_err());
    }

    #[test]
    fn gather_view_composes_gather_of_gather() {
        let src = sample();
        let g = GatherView::new(src, vec![4, 3, 2, 1, 0]).unwrap();
        let materialized = g.gather(&[0, 2]).unwrap();
        // g[0] -> source[4] (=4), g[2] -> source[2] (=2)
        if let Column::I32(col) = materialized {
            assert_eq!(col.get(0).unwrap(), 4);
            assert_eq!(col.get(1).unwrap(), 2);
        } else {
            panic!("expected I32 column");
        }
    }
}
