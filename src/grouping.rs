//! # Grouping and first/last substrate
//!
//! Every magstats calculator starts by partitioning the detections of a batch, either by
//! object (`aid`) or by object and filter (`(aid, fid)`), and then either aggregates each
//! group or picks a single row out of it: the chronologically **first** or **last** one.
//!
//! ## Overview
//! -----------------
//! * [`GroupKey`] – how a detection maps to its group (`ObjectId` or `FilterKey`).
//! * [`Subset`] – which rows take part: all detections, or only corrected ones.
//! * [`GroupIndex`] – explicit map `key → row indices`, rows ordered by `candid`.
//! * [`Which`] – first/last selector; [`GroupIndex::select`] is a single linear scan per
//!   group tracking the current extremum (arg-min / arg-max of `(mjd, candid)`).
//! * [`GroupCache`] – per-call memoization of indices and selections, so calculators sharing
//!   a view (e.g. "corrected rows grouped by `(aid, fid)`") build it once.
//!
//! ## Edge cases
//! -----------------
//! * An empty detection slice yields empty maps, never an error.
//! * With [`Subset::Corrected`], a group with no corrected row is simply **absent**.
//! * Ties on `mjd` are broken by `candid`, so the selected row never depends on input order.
use std::hash::Hash;
use std::str::FromStr;

use ahash::RandomState;
use once_cell::unsync::OnceCell;
use smallvec::SmallVec;

use crate::{
    constants::{FastHashMap, FilterKey, ObjectId},
    detections::Detection,
    magstats_errors::MagstatsError,
};

/// Row indices of one group, in `candid` order.
pub type GroupRows = SmallVec<[usize; 8]>;

/// Chronological selector inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Which {
    /// Row holding the minimum epoch
    First,
    /// Row holding the maximum epoch
    Last,
}

impl FromStr for Which {
    type Err = MagstatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Which::First),
            "last" => Ok(Which::Last),
            other => Err(MagstatsError::InvalidSelector(other.to_string())),
        }
    }
}

/// Values taken at the first and at the last row of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstLast<T> {
    pub first: T,
    pub last: T,
}

/// Row subset a grouping is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subset {
    All,
    /// Rows flagged `corrected` that carry a corrected magnitude
    Corrected,
}

impl Subset {
    pub fn contains(self, det: &Detection) -> bool {
        match self {
            Subset::All => true,
            Subset::Corrected => det.corrected && det.mag_corr.is_some(),
        }
    }
}

/// Grouping key extracted from a detection.
pub trait GroupKey: Eq + Hash + Clone + Ord {
    fn of(det: &Detection) -> Self;
}

impl GroupKey for ObjectId {
    fn of(det: &Detection) -> Self {
        det.aid.clone()
    }
}

impl GroupKey for FilterKey {
    fn of(det: &Detection) -> Self {
        (det.aid.clone(), det.fid)
    }
}

/// Explicit partition of a detection slice.
#[derive(Debug, Clone)]
pub struct GroupIndex<K> {
    groups: FastHashMap<K, GroupRows>,
}

impl<K: GroupKey> GroupIndex<K> {
    /// Partition `rows` restricted to `subset`.
    pub fn build(rows: &[Detection], subset: Subset) -> Self {
        let mut groups: FastHashMap<K, GroupRows> = FastHashMap::default();
        for (i, det) in rows.iter().enumerate().filter(|(_, d)| subset.contains(d)) {
            groups.entry(K::of(det)).or_default().push(i);
        }
        for idx in groups.values_mut() {
            idx.sort_by(|&a, &b| rows[a].candid.cmp(&rows[b].candid));
        }
        GroupIndex { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&[usize]> {
        self.groups.get(key).map(|idx| idx.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[usize])> {
        self.groups.iter().map(|(k, idx)| (k, idx.as_slice()))
    }

    /// Apply `f` to the rows of every group.
    pub fn aggregate<T>(&self, mut f: impl FnMut(&[usize]) -> T) -> FastHashMap<K, T> {
        self.groups
            .iter()
            .map(|(k, idx)| (k.clone(), f(idx.as_slice())))
            .collect()
    }

    /// Index of the first or last row of every group.
    ///
    /// Arguments
    /// -----------------
    /// * `rows` – The slice this index was built on.
    /// * `which` – [`Which::First`] for the minimum `(mjd, candid)`, [`Which::Last`] for the maximum.
    ///
    /// Return
    /// ----------
    /// * A map `key → row index`, one entry per group.
    pub fn select(&self, rows: &[Detection], which: Which) -> FastHashMap<K, usize> {
        let mut selected =
            FastHashMap::with_capacity_and_hasher(self.groups.len(), RandomState::default());
        for (k, idx) in &self.groups {
            let best = idx.iter().copied().reduce(|best, i| {
                let ord = rows[i].cmp_epoch(&rows[best]);
                match which {
                    Which::First if ord.is_lt() => i,
                    Which::Last if ord.is_gt() => i,
                    _ => best,
                }
            });
            if let Some(best) = best {
                selected.insert(k.clone(), best);
            }
        }
        selected
    }
}

/// Memoized groupings and first/last selections over one detection slice.
///
/// The cache lives for a single magstats computation; nothing is shared across batches.
pub struct GroupCache<'a, K> {
    rows: &'a [Detection],
    all: OnceCell<GroupIndex<K>>,
    corrected: OnceCell<GroupIndex<K>>,
    // [All/First, All/Last, Corrected/First, Corrected/Last]
    selections: [OnceCell<FastHashMap<K, usize>>; 4],
}

impl<'a, K: GroupKey> GroupCache<'a, K> {
    pub fn new(rows: &'a [Detection]) -> Self {
        GroupCache {
            rows,
            all: OnceCell::new(),
            corrected: OnceCell::new(),
            selections: Default::default(),
        }
    }

    pub fn rows(&self) -> &'a [Detection] {
        self.rows
    }

    pub fn groups(&self, subset: Subset) -> &GroupIndex<K> {
        let cell = match subset {
            Subset::All => &self.all,
            Subset::Corrected => &self.corrected,
        };
        cell.get_or_init(|| GroupIndex::build(self.rows, subset))
    }

    /// Row index of the first/last detection of every group of `subset`.
    pub fn selected(&self, which: Which, subset: Subset) -> &FastHashMap<K, usize> {
        let slot = match (subset, which) {
            (Subset::All, Which::First) => 0,
            (Subset::All, Which::Last) => 1,
            (Subset::Corrected, Which::First) => 2,
            (Subset::Corrected, Which::Last) => 3,
        };
        self.selections[slot].get_or_init(|| self.groups(subset).select(self.rows, which))
    }

    /// Value of `field` at the first/last detection of every group of `subset`.
    pub fn value_at<T>(
        &self,
        which: Which,
        subset: Subset,
        field: impl Fn(&Detection) -> T,
    ) -> FastHashMap<K, T> {
        self.selected(which, subset)
            .iter()
            .map(|(k, &i)| (k.clone(), field(&self.rows[i])))
            .collect()
    }

    /// Value of `field` at both the first and the last detection of every group of `subset`.
    pub fn first_last<T>(
        &self,
        subset: Subset,
        field: impl Fn(&Detection) -> T,
    ) -> FastHashMap<K, FirstLast<T>> {
        let last = self.selected(Which::Last, subset);
        self.selected(Which::First, subset)
            .iter()
            .filter_map(|(k, &first)| {
                let &last = last.get(k)?;
                Some((
                    k.clone(),
                    FirstLast {
                        first: field(&self.rows[first]),
                        last: field(&self.rows[last]),
                    },
                ))
            })
            .collect()
    }
}
