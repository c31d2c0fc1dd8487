//! Fenwick tree over row heights.
//!
//! Stores one height per flattened row and answers the two questions the
//! virtualizer asks on every scroll: "where does row `i` start?" and "which
//! row covers offset `y`?". Both are O(log n); building from a height slice
//! is O(n).
//!
//! # Layout
//!
//! 1-indexed `Vec<u64>` of length `n + 1`; slot 0 is unused. `tree[i]` holds
//! the sum over the range ending at `i` whose length is `lowbit(i)`. Heights
//! are `u32` and sums are `u64`, so no prefix sum can overflow for any
//! sequence that fits in memory.
//!
//! # Invariants
//!
//! 1. `offset_of(0) == 0` and `offset_of(len) == total()`.
//! 2. `offset_of` is monotonically non-decreasing.
//! 3. `index_at(y) == Some(i)` iff `offset_of(i) <= y < offset_of(i + 1)`.

/// Prefix sums over per-row heights.
#[derive(Debug, Clone, Default)]
pub struct FenwickTree {
    tree: Vec<u64>,
    n: usize,
}

impl FenwickTree {
    /// Build from heights in O(n) by pushing each slot into its parent.
    #[must_use]
    pub fn from_heights(heights: &[u32]) -> Self {
        let n = heights.len();
        let mut tree = Vec::with_capacity(n + 1);
        tree.push(0);
        tree.extend(heights.iter().map(|&h| u64::from(h)));
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                tree[parent] += tree[i];
            }
        }
        Self { tree, n }
    }

    /// `n` rows of identical height.
    #[must_use]
    pub fn uniform(n: usize, height: u32) -> Self {
        Self::from_heights(&vec![height; n])
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Sum of heights of rows `[0, i)`. `i` is clamped to `len`.
    #[must_use]
    pub fn offset_of(&self, i: usize) -> u64 {
        let mut idx = i.min(self.n);
        let mut sum = 0u64;
        while idx > 0 {
            sum += self.tree[idx];
            idx -= lowbit(idx);
        }
        sum
    }

    /// Height of row `i`; 0 when out of range.
    #[must_use]
    pub fn height(&self, i: usize) -> u32 {
        if i >= self.n {
            return 0;
        }
        let h = self.offset_of(i + 1) - self.offset_of(i);
        u32::try_from(h).unwrap_or(u32::MAX)
    }

    /// Sum of all heights.
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.offset_of(self.n)
    }

    /// Replace the height of row `i`. Out-of-range indices are ignored.
    pub fn set(&mut self, i: usize, height: u32) {
        if i >= self.n {
            return;
        }
        let old = u64::from(self.height(i));
        let new = u64::from(height);
        let mut idx = i + 1;
        while idx <= self.n {
            // Every node covering `i` already includes `old`.
            self.tree[idx] = self.tree[idx] - old + new;
            idx += lowbit(idx);
        }
    }

    /// Row covering offset `y`, skipping zero-height rows. `None` when `y`
    /// lies at or past the end.
    #[must_use]
    pub fn index_at(&self, y: u64) -> Option<usize> {
        if y >= self.total() {
            return None;
        }
        // Largest `pos` with offset_of(pos) <= y, by binary lifting.
        let mut pos = 0usize;
        let mut remaining = y;
        let mut step = most_significant_bit(self.n);
        while step > 0 {
            let next = pos + step;
            if next <= self.n && self.tree[next] <= remaining {
                remaining -= self.tree[next];
                pos = next;
            }
            step >>= 1;
        }
        Some(pos)
    }
}

#[inline]
fn lowbit(x: usize) -> usize {
    x & x.wrapping_neg()
}

#[inline]
fn most_significant_bit(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}
