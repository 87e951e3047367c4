//! Grouping engine (component I): strategy dispatch over a table and a list
//! of key column names, producing a CSR partitioning of row indices by
//! group plus a segregated null-group index list.

use crate::column::Column;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::group::csr::Csr;
use crate::table::Table;
use crate::value::ScalarValue;
use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;

/// A hashable mirror of [`ScalarValue`] (excluding `Null`, which is handled
/// separately by routing to the null-group bucket), used as a composite-key
/// component in the generic hash-map strategy. `f64` hashes and compares by
/// bit pattern, so `NaN` keys are distinct from each other and `0.0`/`-0.0`
/// are distinct — an approximation acceptable for grouping keys, which are
/// rarely floating point in practice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyComponent {
    I32(i32),
    Bool(bool),
    Str(String),
    Timestamp(i64),
    F64Bits(u64),
}

fn key_component(v: &ScalarValue) -> Option<KeyComponent> {
    match v {
        ScalarValue::Null => None,
        ScalarValue::I32(x) => Some(KeyComponent::I32(*x)),
        ScalarValue::F64(x) => Some(KeyComponent::F64Bits(x.to_bits())),
        ScalarValue::Bool(x) => Some(KeyComponent::Bool(*x)),
        ScalarValue::Str(x) => Some(KeyComponent::Str(x.clone())),
        ScalarValue::Timestamp(x) => Some(KeyComponent::Timestamp(x.0)),
    }
}

/// The output of the grouping engine: a CSR partitioning of row indices by
/// group, the group key values (one composite key per group, in group-id
/// order), and rows whose key was null, segregated out of the normal CSR.
pub struct GroupedTable<'a> {
    source: &'a Table,
    group_columns: Vec<String>,
    keys: Vec<Vec<ScalarValue>>,
    csr: Csr,
    null_group_indices: Vec<usize>,
}

impl<'a> GroupedTable<'a> {
    /// The table this grouping was computed over.
    pub fn source(&self) -> &Table {
        self.source
    }

    /// The key column names, in the order passed to `group_by`.
    pub fn group_columns(&self) -> &[String] {
        &self.group_columns
    }

    /// Number of groups, excluding the null-key bucket.
    pub fn num_groups(&self) -> usize {
        self.csr.num_groups()
    }

    /// The composite key for group `g`, one [`ScalarValue`] per key column.
    pub fn keys(&self, g: usize) -> &[ScalarValue] {
        &self.keys[g]
    }

    /// The underlying CSR.
    pub fn csr(&self) -> &Csr {
        &self.csr
    }

    /// Rows whose key (in any key column) was null.
    pub fn null_group_indices(&self) -> &[usize] {
        &self.null_group_indices
    }

    /// `true` iff any row had a null key.
    pub fn has_null_group(&self) -> bool {
        !self.null_group_indices.is_empty()
    }
}

/// Group `table` by `group_columns`, picking the best-applicable strategy:
/// `IntDirectMap` or `IntRadix` for a single `i32` key, `DictionaryAware` for
/// a single categorical key, `GenericHashMap` otherwise.
pub fn group_by<'a>(table: &'a Table, group_columns: &[String], config: &EngineConfig) -> Result<GroupedTable<'a>> {
    let cols: Vec<&Column> = group_columns.iter().map(|n| table.column(n)).collect::<Result<_>>()?;
    let n = table.row_count();

    if cols.len() == 1 {
        match cols[0] {
            Column::I32(c) => {
                let mut null_group_indices = Vec::new();
                let mut present: Vec<(usize, i32)> = Vec::with_capacity(n);
                for row in 0..n {
                    if c.is_null(row)? {
                        null_group_indices.push(row);
                    } else {
                        present.push((row, c.get(row)?));
                    }
                }
                return Ok(group_i32(table, group_columns.to_vec(), present, null_group_indices, config));
            }
            Column::Categorical(c) => {
                let mut null_group_indices = Vec::new();
                let mut present: Vec<(usize, i32)> = Vec::with_capacity(n);
                for row in 0..n {
                    let code = c.code_at(row)?;
                    if code == 0 {
                        null_group_indices.push(row);
                    } else {
                        present.push((row, code));
                    }
                }
                debug!("grouping: DictionaryAware selected for `{}`", group_columns[0]);
                let dict = c.dictionary().to_vec();
                let grouped = group_i32(table, group_columns.to_vec(), present, null_group_indices, config);
                // Resolve dictionary codes back to strings for user-visible keys.
                let keys = (0..grouped.num_groups())
                    .map(|g| {
                        let code = match &grouped.keys[g][0] {
                            ScalarValue::I32(code) => *code,
                            _ => unreachable!("group_i32 always emits I32 keys"),
                        };
                        vec![ScalarValue::Str(dict[(code - 1) as usize].clone())]
                    })
                    .collect();
                return Ok(GroupedTable { keys, ..grouped });
            }
            _ => {}
        }
    }

    Ok(group_generic(table, group_columns.to_vec(), &cols, n)?)
}

/// Shared `i32`-key grouping used directly for plain `i32` columns, and for
/// categorical codes (before the caller resolves codes back to strings).
fn group_i32<'a>(
    table: &'a Table,
    group_columns: Vec<String>,
    present: Vec<(usize, i32)>,
    null_group_indices: Vec<usize>,
    config: &EngineConfig,
) -> GroupedTable<'a> {
    if present.is_empty() {
        return GroupedTable {
            source: table,
            group_columns,
            keys: Vec::new(),
            csr: Csr::build(&[], 0),
            null_group_indices,
        };
    }
    let min = present.iter().map(|&(_, v)| v).min().unwrap();
    let max = present.iter().map(|&(_, v)| v).max().unwrap();
    let range = (max as i64 - min as i64 + 1) as usize;

    if range <= config.int_direct_map_threshold {
        debug!("grouping: IntDirectMap selected, range={range}");
        int_direct_map(table, group_columns, present, null_group_indices, min, range)
    } else {
        debug!("grouping: IntRadix selected, range={range}");
        int_radix(table, group_columns, present, null_group_indices, min, range, config)
    }
}

fn int_direct_map<'a>(
    table: &'a Table,
    group_columns: Vec<String>,
    present: Vec<(usize, i32)>,
    null_group_indices: Vec<usize>,
    min: i32,
    range: usize,
) -> GroupedTable<'a> {
    let mut group_of = vec![usize::MAX; range];
    let mut keys = Vec::new();
    let mut assignments = Vec::with_capacity(present.len());
    for (row, v) in present {
        let slot = (v as i64 - min as i64) as usize;
        let g = if group_of[slot] == usize::MAX {
            let g = keys.len();
            group_of[slot] = g;
            keys.push(vec![ScalarValue::I32(v)]);
            g
        } else {
            group_of[slot]
        };
        assignments.push((row, g));
    }
    let num_groups = keys.len();
    GroupedTable {
        source: table,
        group_columns,
        keys,
        csr: Csr::build(&assignments, num_groups),
        null_group_indices,
    }
}

fn int_radix<'a>(
    table: &'a Table,
    group_columns: Vec<String>,
    present: Vec<(usize, i32)>,
    null_group_indices: Vec<usize>,
    min: i32,
    range: usize,
    config: &EngineConfig,
) -> GroupedTable<'a> {
    let shards = config.radix_partitions.max(1);
    let mut shard_rows: Vec<Vec<(usize, i32)>> = vec![Vec::new(); shards];
    for (row, v) in present {
        let slot = (v as i64 - min as i64) as usize;
        let shard = (slot * shards / range).min(shards - 1);
        shard_rows[shard].push((row, v));
    }

    let build_shard = |rows: &[(usize, i32)]| -> (Vec<i32>, Vec<(usize, usize)>) {
        let mut local_map: AHashMap<i32, usize> = AHashMap::default();
        let mut local_keys = Vec::new();
        let mut local_assignments = Vec::with_capacity(rows.len());
        for &(row, v) in rows {
            let g = *local_map.entry(v).or_insert_with(|| {
                let g = local_keys.len();
                local_keys.push(v);
                g
            });
            local_assignments.push((row, g));
        }
        (local_keys, local_assignments)
    };

    let total_rows: usize = shard_rows.iter().map(Vec::len).sum();
    let shard_results: Vec<(Vec<i32>, Vec<(usize, usize)>)> = if total_rows > config.shard_parallel_threshold {
        shard_rows.par_iter().map(|rows| build_shard(rows)).collect()
    } else {
        shard_rows.iter().map(|rows| build_shard(rows)).collect()
    };

    let mut keys = Vec::new();
    let mut assignments = Vec::with_capacity(total_rows);
    for (local_keys, local_assignments) in shard_results {
        let offset = keys.len();
        keys.extend(local_keys.into_iter().map(|v| vec![ScalarValue::I32(v)]));
        assignments.extend(local_assignments.into_iter().map(|(row, g)| (row, g + offset)));
    }
    assignments.sort_by_key(|&(row, _)| row);
    let num_groups = keys.len();
    GroupedTable {
        source: table,
        group_columns,
        keys,
        csr: Csr::build(&assignments, num_groups),
        null_group_indices,
    }
}

fn group_generic<'a>(
    table: &'a Table,
    group_columns: Vec<String>,
    cols: &[&Column],
    n: usize,
) -> Result<GroupedTable<'a>> {
    debug!("grouping: GenericHashMap selected for {} key column(s)", cols.len());
    let mut map: AHashMap<Vec<KeyComponent>, usize> = AHashMap::default();
    let mut keys: Vec<Vec<ScalarValue>> = Vec::new();
    let mut assignments = Vec::with_capacity(n);
    let mut null_group_indices = Vec::new();

    for row in 0..n {
        let mut values = Vec::with_capacity(cols.len());
        let mut components = Vec::with_capacity(cols.len());
        let mut any_null = false;
        for col in cols {
            let v = col.get_boxed(row)?;
            if v.is_null() {
                any_null = true;
            }
            if let Some(kc) = key_component(&v) {
                components.push(kc);
            }
            values.push(v);
        }
        if any_null {
            null_group_indices.push(row);
            continue;
        }
        let g = *map.entry(components).or_insert_with(|| {
            let g = keys.len();
            keys.push(values.clone());
            g
        });
        assignments.push((row, g));
    }

    let num_groups = keys.len();
    Ok(GroupedTable {
        source: table,
        group_columns,
        keys,
        csr: Csr::build(&assignments, num_groups),
        null_group_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::numeric::PrimitiveColumn;
    use crate::column::ColumnType;
    use crate::schema::{ColumnDef, Schema};

    fn table_with_i32_key(values: &[Option<i32>]) -> Table {
        let mut key: PrimitiveColumn<i32> = PrimitiveColumn::new("k", true, values.len());
        for v in values {
            key.append_optional(*v).unwrap();
        }
        let schema = Schema::new(vec![ColumnDef::new("k", ColumnType::I32, true)]).unwrap();
        Table::new(schema, vec![Column::I32(key)]).unwrap()
    }

    #[test]
    fn int_direct_map_groups_by_distinct_value() {
        let table = table_with_i32_key(&[Some(1), Some(2), Some(1), Some(3), Some(2)]);
        let grouped = group_by(&table, &["k".to_string()], &EngineConfig::default()).unwrap();
        assert_eq!(grouped.num_groups(), 3);
        assert!(!grouped.has_null_group());
        let total: usize = (0..grouped.num_groups()).map(|g| grouped.csr().group_len(g)).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn null_keys_are_segregated() {
        let table = table_with_i32_key(&[Some(1), None, Some(1), None]);
        let grouped = group_by(&table, &["k".to_string()], &EngineConfig::default()).unwrap();
        assert_eq!(grouped.num_groups(), 1);
        assert_eq!(grouped.null_group_indices(), &[1, 3]);
    }

    #[test]
    fn each_group_keeps_ascending_row_order() {
        let table = table_with_i32_key(&[Some(2), Some(1), Some(2), Some(1), Some(2)]);
        let grouped = group_by(&table, &["k".to_string()], &EngineConfig::default()).unwrap();
        for g in 0..grouped.num_groups() {
            let rows = grouped.csr().group(g);
            let mut sorted = rows.to_vec();
            sorted.sort_unstable();
            assert_eq!(rows, sorted.as_slice());
        }
    }

    #[test]
    fn int_radix_used_above_direct_map_threshold_and_still_groups_correctly() {
        crate::tests::init_logging();
        let table = table_with_i32_key(&[Some(0), Some(5_000_000), Some(0), Some(5_000_000)]);
        let config = EngineConfig { int_direct_map_threshold: 10, ..EngineConfig::default() };
        let grouped = group_by(&table, &["k".to_string()], &config).unwrap();
        assert_eq!(grouped.num_groups(), 2);
    }

    #[test]
    fn generic_hash_map_handles_multi_column_keys() {
        let mut a: PrimitiveColumn<i32> = PrimitiveColumn::new("a", false, 0);
        let mut b: PrimitiveColumn<i32> = PrimitiveColumn::new("b", false, 0);
        for (x, y) in [(1, 1), (1, 2), (1, 1), (2, 1)] {
            a.append(x);
            b.append(y);
        }
        let schema = Schema::new(vec![
            ColumnDef::new("a", ColumnType::I32, false),
            ColumnDef::new("b", ColumnType::I32, false),
        ])
        .unwrap();
        let table = Table::new(schema, vec![Column::I32(a), Column::I32(b)]).unwrap();
        let grouped =
            group_by(&table, &["a".to_string(), "b".to_string()], &EngineConfig::default()).unwrap();
        assert_eq!(grouped.num_groups(), 3);
    }

    #[test]
    fn dictionary_aware_resolves_codes_back_to_strings() {
        crate::tests::init_logging();
        use crate::column::categorical::CategoricalColumn;
        let mut c = CategoricalColumn::new("c", true, 0);
        c.append("red");
        c.append_optional(None).unwrap();
        c.append("blue");
        c.append("red");
        let schema = Schema::new(vec![ColumnDef::new("c", ColumnType::String, true)]).unwrap();
        let table = Table::new(schema, vec![Column::Categorical(c)]).unwrap();
        let grouped = group_by(&table, &["c".to_string()], &EngineConfig::default()).unwrap();
        assert_eq!(grouped.num_groups(), 2);
        assert_eq!(grouped.null_group_indices(), &[1]);
        let mut seen: Vec<String> = (0..grouped.num_groups())
            .map(|g| match &grouped.keys(g)[0] {
                ScalarValue::Str(s) => s.clone(),
                _ => panic!("expected string key"),
            })
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["blue".to_string(), "red".to_string()]);
    }
}
