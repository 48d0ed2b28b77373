//! Lazy pair and permutation enumeration.
//!
//! Everything here is pure. The iterators borrow or copy their input and can be
//! restarted by cloning them before consumption or by calling the constructor again.

/// Exact number of comparisons [`compare_all_sort`](crate::exhaustive::compare_all_sort)
/// performs for `n` items: n(n-1)/2.
pub fn compare_all_comparisons(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    // one of n, n-1 is even, so halve that one first to stay clear of overflow
    if n % 2 == 0 {
        (n / 2) * (n - 1)
    } else {
        n * ((n - 1) / 2)
    }
}

/// All unordered pairs of `items` in row-major order:
/// (0,1), (0,2), ..., (0,n-1), (1,2), ...
pub fn combinations2<T>(items: &[T]) -> Combinations2<'_, T> {
    Combinations2 { items, i: 0, j: 1 }
}

#[derive(Debug, Clone)]
pub struct Combinations2<'a, T> {
    items: &'a [T],
    i: usize,
    j: usize,
}

impl<'a, T> Iterator for Combinations2<'a, T> {
    type Item = (&'a T, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.j >= self.items.len() {
            self.i += 1;
            self.j = self.i + 1;
            if self.j >= self.items.len() {
                return None;
            }
        }
        let pair = (&self.items[self.i], &self.items[self.j]);
        self.j += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.items.len();
        let remaining = if self.i + 1 >= n {
            0
        } else {
            // rest of the current row plus every later row
            n.saturating_sub(self.j) + compare_all_comparisons(n - self.i - 1)
        };
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Combinations2<'_, T> {}

/// Every ordering of `items`, produced by the iterative form of Heap's algorithm.
///
/// The first permutation is the input itself; each following one differs from
/// its predecessor by a single swap. An empty input yields one empty permutation.
pub fn permutations<T: Clone>(items: &[T]) -> Permutations<T> {
    Permutations {
        current: items.to_vec(),
        counters: vec![0; items.len()],
        i: 1,
        started: false,
    }
}

#[derive(Debug, Clone)]
pub struct Permutations<T> {
    current: Vec<T>,
    counters: Vec<usize>,
    i: usize,
    started: bool,
}

impl<T: Clone> Iterator for Permutations<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }
        while self.i < self.current.len() {
            let ci = self.counters[self.i];
            if ci < self.i {
                if self.i % 2 == 0 {
                    self.current.swap(0, self.i);
                } else {
                    self.current.swap(ci, self.i);
                }
                self.counters[self.i] = ci + 1;
                self.i = 1;
                return Some(self.current.clone());
            }
            self.counters[self.i] = 0;
            self.i += 1;
        }
        None
    }
}
