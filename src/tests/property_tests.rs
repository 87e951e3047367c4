//! Property-based tests over structural invariants that a targeted example
//! can easily miss: ArgSort as a permutation, CSR partitioning, bitmap
//! round-tripping, and join output-length bounds.

use crate::bitmap::Bitmap;
use crate::column::numeric::PrimitiveColumn;
use crate::column::{Column, ColumnType};
use crate::group::csr::Csr;
use crate::join::JoinKind;
use crate::schema::{ColumnDef, Schema};
use crate::sort::{arg_sort, SortKey};
use crate::table::Table;
use proptest::prelude::*;

fn i32_table(name: &str, values: &[Option<i32>], nullable: bool) -> Table {
    let mut col: PrimitiveColumn<i32> = PrimitiveColumn::new(name, nullable, values.len());
    for &v in values {
        col.append_optional(v).unwrap();
    }
    let schema = Schema::new(vec![ColumnDef::new(name, ColumnType::I32, nullable)]).unwrap();
    Table::new(schema, vec![Column::I32(col)]).unwrap()
}

proptest! {
    /// ArgSort always produces a permutation of every row index, regardless
    /// of value distribution or null placement.
    #[test]
    fn arg_sort_is_always_a_permutation(values in proptest::collection::vec(proptest::option::of(-1000i32..1000), 0..64)) {
        let table = i32_table("v", &values, true);
        let order = arg_sort(&table, &[SortKey::asc("v")]).unwrap();
        let mut sorted = order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..values.len()).collect::<Vec<_>>());
    }

    /// Non-null values in the ArgSort output are non-decreasing (ascending
    /// key), wherever they land relative to interspersed nulls.
    #[test]
    fn arg_sort_orders_non_null_values_ascending(values in proptest::collection::vec(proptest::option::of(-1000i32..1000), 0..64)) {
        let table = i32_table("v", &values, true);
        let order = arg_sort(&table, &[SortKey::asc("v")]).unwrap();
        let resolved: Vec<Option<i32>> = order.iter().map(|&i| values[i]).collect();
        let non_null: Vec<i32> = resolved.into_iter().flatten().collect();
        let mut expected = non_null.clone();
        expected.sort_unstable();
        prop_assert_eq!(non_null, expected);
    }

    /// A CSR built from `(row, group)` assignments partitions every row into
    /// exactly one group, and group lengths sum to the assignment count.
    #[test]
    fn csr_partitions_every_row_exactly_once(
        group_of in proptest::collection::vec(0usize..5, 0..100)
    ) {
        let assignments: Vec<(usize, usize)> = group_of.iter().enumerate().map(|(row, &g)| (row, g)).collect();
        let csr = Csr::build(&assignments, 5);
        prop_assert_eq!(csr.total_rows(), assignments.len());
        let total_len: usize = (0..5).map(|g| csr.group_len(g)).sum();
        prop_assert_eq!(total_len, assignments.len());
        let mut seen = vec![false; assignments.len()];
        for g in 0..5 {
            for &row in csr.group(g) {
                prop_assert!(!seen[row], "row {} appeared in more than one group", row);
                seen[row] = true;
            }
        }
        prop_assert!(seen.iter().all(|&s| s));
    }

    /// Within each CSR group, row indices stay in the ascending order the
    /// assignments were given in.
    #[test]
    fn csr_groups_preserve_ascending_input_order(
        group_of in proptest::collection::vec(0usize..4, 0..100)
    ) {
        let assignments: Vec<(usize, usize)> = group_of.iter().enumerate().map(|(row, &g)| (row, g)).collect();
        let csr = Csr::build(&assignments, 4);
        for g in 0..4 {
            let rows = csr.group(g);
            for w in rows.windows(2) {
                prop_assert!(w[0] < w[1]);
            }
        }
    }

    /// A bitmap's validity truth is exactly what was last written to each
    /// bit, independent of how many `push`/`set_null`/`set_valid` calls
    /// preceded it.
    #[test]
    fn bitmap_get_matches_last_write(bits in proptest::collection::vec(any::<bool>(), 0..200)) {
        let mut bm = Bitmap::new_all_null(0);
        for &b in &bits {
            bm.push(b);
        }
        for (i, &expected) in bits.iter().enumerate() {
            prop_assert_eq!(bm.is_valid(i).unwrap(), expected);
        }
        prop_assert_eq!(bm.count_valid(), bits.iter().filter(|&&b| b).count());
    }

    /// An inner join's output length equals the sum, over left rows, of how
    /// many right rows share that left row's key.
    #[test]
    fn inner_join_output_length_matches_fanout(
        left_keys in proptest::collection::vec(0i32..6, 0..20),
        right_keys in proptest::collection::vec(0i32..6, 0..20),
    ) {
        let left = i32_table("K", &left_keys.iter().map(|&k| Some(k)).collect::<Vec<_>>(), false);
        let right = i32_table("K", &right_keys.iter().map(|&k| Some(k)).collect::<Vec<_>>(), false);
        let joined = crate::join::join(&left, &right, "K", JoinKind::Inner).unwrap();
        let expected: usize = left_keys
            .iter()
            .map(|lk| right_keys.iter().filter(|rk| *rk == lk).count())
            .sum();
        prop_assert_eq!(joined.row_count(), expected);
    }

    /// A left join's output length is always at least the left table's row
    /// count (every left row survives, matched or not).
    #[test]
    fn left_join_output_length_at_least_left_row_count(
        left_keys in proptest::collection::vec(0i32..6, 0..20),
        right_keys in proptest::collection::vec(0i32..6, 0..20),
    ) {
        let left = i32_table("K", &left_keys.iter().map(|&k| Some(k)).collect::<Vec<_>>(), false);
        let right = i32_table("K", &right_keys.iter().map(|&k| Some(k)).collect::<Vec<_>>(), false);
        let joined = crate::join::join(&left, &right, "K", JoinKind::Left).unwrap();
        prop_assert!(joined.row_count() >= left_keys.len());
    }
}
