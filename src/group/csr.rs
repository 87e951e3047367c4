//! Compressed-sparse-row (CSR) partitioning of row indices by group: a
//! two-pass counting-sort style construction that gives each group's row
//! indices in ascending source order without an intermediate sort.

/// Row indices bucketed by group, in CSR layout: `offsets[g]..offsets[g+1]`
/// is the slice of `indices` belonging to group `g`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Csr {
    /// Build a CSR from `assignments` — `(row, group)` pairs given in
    /// ascending `row` order — and a known `num_groups`. Pass 1 counts rows
    /// per group; pass 2 scatters each row into its group's slice using a
    /// cursor initialized from the prefix-summed counts, which preserves the
    /// ascending order `assignments` was given in within each group.
    pub fn build(assignments: &[(usize, usize)], num_groups: usize) -> Self {
        let mut counts = vec![0usize; num_groups];
        for &(_, g) in assignments {
            counts[g] += 1;
        }
        let mut offsets = vec![0usize; num_groups + 1];
        for g in 0..num_groups {
            offsets[g + 1] = offsets[g] + counts[g];
        }
        let mut cursor = offsets[..num_groups].to_vec();
        let mut indices = vec![0usize; assignments.len()];
        for &(row, g) in assignments {
            indices[cursor[g]] = row;
            cursor[g] += 1;
        }
        Self { offsets, indices }
    }

    /// Number of groups this CSR partitions rows into.
    pub fn num_groups(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of rows across every group (excludes any rows segregated
    /// into a null-group index list kept alongside the CSR).
    pub fn total_rows(&self) -> usize {
        self.indices.len()
    }

    /// The row indices belonging to group `g`, in ascending source order.
    pub fn group(&self, g: usize) -> &[usize] {
        &self.indices[self.offsets[g]..self.offsets[g + 1]]
    }

    /// Row count of group `g`: `offsets[g+1] - offsets[g]`, read directly
    /// without touching the `indices` array — the aggregation fast path for
    /// a bare `count()`.
    pub fn group_len(&self, g: usize) -> usize {
        self.offsets[g + 1] - self.offsets[g]
    }

    /// The raw offsets array.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// The raw, flattened row-index array.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}
