//! Vector kernels (component G): whole-column reductions, element-wise
//! arithmetic, and vectorized comparison-to-index-list. Each kernel operates
//! directly on a concrete [`crate::column::numeric::PrimitiveColumn`] rather
//! than through the [`crate::column::Column`] enum, leaving the dispatch on
//! logical type to the caller (the expression JIT, the physical planner).

pub mod arithmetic;
pub mod compare;
pub mod reduce;
