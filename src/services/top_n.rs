use std::collections::HashMap;

use tracing::trace;

use crate::models::{Aggregate, RankedEdge, OTHER_KEY, OTHER_LABEL};

/// Something that can be ranked by weight and folded into an overflow bucket.
pub trait Rankable: Sized {
    fn weight(&self) -> f64;

    /// Items sharing a group are folded into the same overflow entry.
    fn overflow_group(&self) -> String;

    /// Build the synthetic entry for `group` from its overflowed members, in
    /// ranked order.
    fn fold_overflow(group: String, members: Vec<Self>) -> Self;

    /// Whether two items occupy the same output slot.
    fn same_slot(&self, other: &Self) -> bool;

    /// Merge `other`, which occupies the same slot, into `self`.
    fn absorb(&mut self, other: Self);
}

impl Rankable for Aggregate {
    fn weight(&self) -> f64 {
        self.value
    }

    fn overflow_group(&self) -> String {
        String::new()
    }

    fn fold_overflow(_group: String, members: Vec<Self>) -> Self {
        let value = members.iter().map(|a| a.value).sum();
        Aggregate::new(OTHER_KEY, OTHER_LABEL, value)
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.key == other.key
    }

    fn absorb(&mut self, other: Self) {
        self.value += other.value;
    }
}

impl Rankable for RankedEdge {
    fn weight(&self) -> f64 {
        self.value
    }

    fn overflow_group(&self) -> String {
        self.source.clone()
    }

    fn fold_overflow(group: String, members: Vec<Self>) -> Self {
        let value = members.iter().map(|e| e.value).sum();
        RankedEdge::new(group, OTHER_LABEL, value)
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }

    fn absorb(&mut self, other: Self) {
        self.value += other.value;
    }
}

/// Result of [`collapse`]: the top entries plus one synthetic entry per
/// overflow group.
#[derive(Debug, Clone, PartialEq)]
pub struct CollapsedSet<T> {
    pub kept: Vec<T>,
    pub overflow: Vec<T>,
}

impl<T: Rankable> CollapsedSet<T> {
    pub fn total(&self) -> f64 {
        self.kept.iter().chain(&self.overflow).map(|t| t.weight()).sum()
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut all = self.kept;
        all.extend(self.overflow);
        all
    }
}

/// Keep the `n` heaviest items and fold the rest into one entry per overflow
/// group.
///
/// Sorting is stable, so equal weights keep their input order. Overflow
/// groups come out in order of their heaviest member, and a group whose
/// folded weight is not positive is left out. A folded entry that lands on
/// the slot of a kept item (a real category already named like the overflow
/// bucket) is merged into that item.
pub fn collapse<T: Rankable>(items: Vec<T>, n: usize) -> CollapsedSet<T> {
    let mut ranked = items;
    ranked.sort_by(|a, b| b.weight().total_cmp(&a.weight()));

    let rest = if ranked.len() > n {
        ranked.split_off(n)
    } else {
        Vec::new()
    };
    let mut kept = ranked;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for item in rest {
        let group = item.overflow_group();
        if !groups.contains_key(&group) {
            order.push(group.clone());
        }
        groups.entry(group).or_default().push(item);
    }

    let mut overflow: Vec<T> = Vec::new();
    for group in order {
        let Some(members) = groups.remove(&group) else {
            continue;
        };
        let folded = T::fold_overflow(group, members);
        if folded.weight() <= 0.0 {
            continue;
        }
        match kept.iter_mut().find(|k| k.same_slot(&folded)) {
            Some(existing) => existing.absorb(folded),
            None => overflow.push(folded),
        }
    }

    trace!(
        kept = kept.len(),
        overflow = overflow.len(),
        n,
        "Collapsed ranked list"
    );

    CollapsedSet { kept, overflow }
}
