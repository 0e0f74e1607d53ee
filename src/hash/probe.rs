//! Multiprobe ranking shared by all families.
//!
//! Every family describes a table's bucket as a sequence of digits (one per
//! primitive hash, each with its own radix) plus a list of single-digit
//! alterations with a non-negative cost. Perturbation sets over the sorted
//! alteration list are enumerated in ascending total cost with the classic
//! shift/expand scheme, and a global heap merges the per-table streams.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use super::HashCode;

/// Replace digit `block` of a table's code with `digit`, at `cost`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alteration {
    pub cost: f32,
    pub block: usize,
    pub digit: u32,
}

/// The exact bucket of one table plus its candidate alterations.
#[derive(Debug, Clone)]
pub struct TableProbes {
    digits: Vec<u32>,
    alterations: Vec<Alteration>,
}

impl TableProbes {
    /// `alterations` may come in any order; they are sorted by cost here.
    pub fn new(digits: Vec<u32>, mut alterations: Vec<Alteration>) -> Self {
        alterations.sort_by(|a, b| {
            a.cost
                .partial_cmp(&b.cost)
                .unwrap_or(Ordering::Equal)
                .then(a.block.cmp(&b.block))
                .then(a.digit.cmp(&b.digit))
        });
        Self {
            digits,
            alterations,
        }
    }

    pub fn digits(&self) -> &[u32] {
        &self.digits
    }
}

/// Fold digits into a code, most significant first.
#[inline]
pub(crate) fn compose(digits: &[u32], radices: &[u32]) -> HashCode {
    digits
        .iter()
        .zip(radices)
        .fold(0u32, |code, (&d, &r)| code.wrapping_mul(r).wrapping_add(d))
}

#[derive(Debug)]
struct Perturbation {
    cost: OrderedFloat<f32>,
    table: usize,
    seq: u64,
    set: Vec<usize>,
}

impl PartialEq for Perturbation {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Perturbation {}

impl PartialOrd for Perturbation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Perturbation {
    // Reversed: BinaryHeap is a max-heap and we pop the cheapest first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.table.cmp(&self.table))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Ranked stream of `(table, code)` probes.
///
/// Yields the exact bucket of every table first, then perturbed buckets in
/// ascending cost. Fully deterministic for a given input.
#[derive(Debug)]
pub struct ProbeSequence {
    radices: Vec<u32>,
    tables: Vec<TableProbes>,
    next_base: usize,
    heap: BinaryHeap<Perturbation>,
    seq: u64,
}

impl ProbeSequence {
    pub fn new(radices: Vec<u32>, tables: Vec<TableProbes>) -> Self {
        let mut sequence = Self {
            radices,
            heap: BinaryHeap::with_capacity(2 * tables.len()),
            tables,
            next_base: 0,
            seq: 0,
        };
        for table in 0..sequence.tables.len() {
            if !sequence.tables[table].alterations.is_empty() {
                sequence.push(table, vec![0]);
            }
        }
        sequence
    }

    fn push(&mut self, table: usize, set: Vec<usize>) {
        let alterations = &self.tables[table].alterations;
        let cost: f32 = set.iter().map(|&i| alterations[i].cost).sum();
        self.heap.push(Perturbation {
            cost: OrderedFloat(cost),
            table,
            seq: self.seq,
            set,
        });
        self.seq += 1;
    }

    /// A set is usable only if it changes every block at most once.
    fn is_valid(&self, table: usize, set: &[usize]) -> bool {
        let alterations = &self.tables[table].alterations;
        set.iter().enumerate().all(|(i, &a)| {
            set[i + 1..]
                .iter()
                .all(|&b| alterations[a].block != alterations[b].block)
        })
    }

    fn code_for(&self, table: usize, set: &[usize]) -> HashCode {
        let probes = &self.tables[table];
        let mut digits = probes.digits.clone();
        for &i in set {
            let alt = probes.alterations[i];
            digits[alt.block] = alt.digit;
        }
        compose(&digits, &self.radices)
    }
}

impl Iterator for ProbeSequence {
    type Item = (usize, HashCode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_base < self.tables.len() {
            let table = self.next_base;
            self.next_base += 1;
            return Some((table, compose(&self.tables[table].digits, &self.radices)));
        }

        while let Some(Perturbation { table, set, .. }) = self.heap.pop() {
            let num_alterations = self.tables[table].alterations.len();
            let valid = self.is_valid(table, &set);
            if let Some(&last) = set.last() {
                if last + 1 < num_alterations {
                    let mut shifted = set.clone();
                    if let Some(tail) = shifted.last_mut() {
                        *tail = last + 1;
                    }
                    self.push(table, shifted);

                    // Supersets of an invalid set are invalid too.
                    if valid {
                        let mut expanded = set.clone();
                        expanded.push(last + 1);
                        self.push(table, expanded);
                    }
                }
            }

            if valid {
                return Some((table, self.code_for(table, &set)));
            }
        }
        None
    }
}
