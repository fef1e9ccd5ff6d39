//! A sorted set of 64-bit signed integers with per-element storage width
//! chosen to fit the widest element currently held.
//!
//! Starts as [`Small`] (all elements fit in `i16`), migrates to [`Medium`]
//! on the first element outside `i16`, and to [`Full`] on the first
//! element outside `i32`. Migration is one-way: the set never demotes
//! back to a narrower tier, even if every wide element is later removed
//! (rebuilding a fresh, narrow set is the caller's job — see
//! `DESIGN.md`).

mod merge;
mod segment;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::rng::SplitMix64;
use merge::Seg;

/// The width class a value requires: the narrowest signed integer type
/// whose range contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Width {
    W16,
    W32,
    W64,
}

#[inline]
fn width_class(v: i64) -> Width {
    if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
        Width::W16
    } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
        Width::W32
    } else {
        Width::W64
    }
}

/// All elements fit in `i16`.
#[derive(Debug, Default, Clone)]
struct Small {
    values: Vec<i16>,
}

/// Elements segregated into disjoint `i16`/`i32` segments.
#[derive(Debug, Default, Clone)]
struct Medium {
    values16: Vec<i16>,
    values32: Vec<i32>,
}

/// Elements segregated into disjoint `i16`/`i32`/`i64` segments.
#[derive(Debug, Default, Clone)]
struct Full {
    values16: Vec<i16>,
    values32: Vec<i32>,
    values64: Vec<i64>,
}

impl Medium {
    fn from_small(s: Small) -> Self {
        Self { values16: s.values, values32: Vec::new() }
    }
}

impl Full {
    fn from_medium(m: Medium) -> Self {
        Self { values16: m.values16, values32: m.values32, values64: Vec::new() }
    }
}

#[derive(Debug, Clone)]
enum Repr {
    Small(Small),
    Medium(Medium),
    Full(Full),
}

/// Which tier an [`IntSet`] currently occupies. Exposed read-only for
/// diagnostics and the width-monotonicity property test; tier transitions
/// are otherwise an internal detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// All elements fit in `i16`.
    Small,
    /// Elements segregated into `i16`/`i32` segments.
    Medium,
    /// Elements segregated into `i16`/`i32`/`i64` segments.
    Full,
}

/// A sorted set of `i64` values, tiered by element width. See the module
/// documentation for the tier lifecycle.
///
/// The handle is a single pointer-sized value (`Box<Repr>`): mutating
/// operations that can migrate a tier take `&mut IntSet` and replace the
/// boxed representation in place, matching the handle-by-reference
/// discipline every tiered structure in this crate follows.
#[derive(Debug, Clone)]
pub struct IntSet(Box<Repr>);

impl Default for IntSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IntSet {
    /// Creates a new, empty set at the `Small` tier.
    pub fn new() -> Self {
        Self(Box::new(Repr::Small(Small::default())))
    }

    /// The tier currently in use.
    pub fn tier(&self) -> Tier {
        match &*self.0 {
            Repr::Small(_) => Tier::Small,
            Repr::Medium(_) => Tier::Medium,
            Repr::Full(_) => Tier::Full,
        }
    }

    /// Inserts `v`. Returns `false` iff `v` was already present.
    ///
    /// May migrate this set to a wider tier; the migration is transparent
    /// to the caller beyond the tier becoming observable via [`Self::tier`].
    pub fn add(&mut self, v: i64) -> bool {
        loop {
            match &mut *self.0 {
                Repr::Small(s) => match width_class(v) {
                    Width::W16 => return segment::insert16(&mut s.values, v as i16),
                    _ => {
                        let small = core::mem::take(s);
                        self.0 = Box::new(Repr::Medium(Medium::from_small(small)));
                    }
                },
                Repr::Medium(m) => match width_class(v) {
                    Width::W16 => return segment::insert16(&mut m.values16, v as i16),
                    Width::W32 => return segment::insert32(&mut m.values32, v as i32),
                    Width::W64 => {
                        let medium = core::mem::take(m);
                        self.0 = Box::new(Repr::Full(Full::from_medium(medium)));
                    }
                },
                Repr::Full(f) => {
                    return match width_class(v) {
                        Width::W16 => segment::insert16(&mut f.values16, v as i16),
                        Width::W32 => segment::insert32(&mut f.values32, v as i32),
                        Width::W64 => segment::insert64(&mut f.values64, v),
                    };
                }
            }
        }
    }

    /// Removes `v`. Returns `false` iff `v` was absent. Never demotes the
    /// tier, even if this empties every wide segment.
    pub fn remove(&mut self, v: i64) -> bool {
        let width = width_class(v);
        match &mut *self.0 {
            Repr::Small(s) => width == Width::W16 && segment::remove16(&mut s.values, v as i16),
            Repr::Medium(m) => match width {
                Width::W16 => segment::remove16(&mut m.values16, v as i16),
                Width::W32 => segment::remove32(&mut m.values32, v as i32),
                Width::W64 => false,
            },
            Repr::Full(f) => match width {
                Width::W16 => segment::remove16(&mut f.values16, v as i16),
                Width::W32 => segment::remove32(&mut f.values32, v as i32),
                Width::W64 => segment::remove64(&mut f.values64, v),
            },
        }
    }

    /// Returns whether `v` is present. O(1) rejection if `v`'s width
    /// exceeds the current tier's widest segment, else a single binary
    /// search of the owning segment.
    pub fn contains(&self, v: i64) -> bool {
        let width = width_class(v);
        match &*self.0 {
            Repr::Small(s) => width == Width::W16 && segment::contains16(&s.values, v as i16),
            Repr::Medium(m) => match width {
                Width::W16 => segment::contains16(&m.values16, v as i16),
                Width::W32 => segment::contains32(&m.values32, v as i32),
                Width::W64 => false,
            },
            Repr::Full(f) => match width {
                Width::W16 => segment::contains16(&f.values16, v as i16),
                Width::W32 => segment::contains32(&f.values32, v as i32),
                Width::W64 => segment::contains64(&f.values64, v),
            },
        }
    }

    /// Total number of elements, summed across segments.
    pub fn count(&self) -> usize {
        match &*self.0 {
            Repr::Small(s) => s.values.len(),
            Repr::Medium(m) => m.values16.len() + m.values32.len(),
            Repr::Full(f) => f.values16.len() + f.values32.len() + f.values64.len(),
        }
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The `pos`-th element (0-based) of the single virtual ascending
    /// sequence across all segments, or `None` if `pos >= count()`.
    pub fn get(&self, pos: usize) -> Option<i64> {
        merge::nth(segments(&self.0), pos)
    }

    /// The smallest element, or `None` if empty. Compares each non-empty
    /// segment's own minimum (its first element, since segments are
    /// individually sorted ascending) — width class bounds a segment's
    /// magnitude range, not which segment holds the global extreme.
    pub fn min(&self) -> Option<i64> {
        segments(&self.0).iter().filter_map(Seg::first).min()
    }

    /// The largest element, or `None` if empty. Symmetric to [`Self::min`].
    pub fn max(&self) -> Option<i64> {
        segments(&self.0).iter().filter_map(Seg::last).max()
    }

    /// Iterates all elements in ascending order via the virtual k-way
    /// merge across segments. Allocation-free: it holds three segment
    /// slice references and three finger cursors, widening one element at
    /// a time as the merge advances.
    pub fn iter(&self) -> Iter<'_> {
        Iter { segments: segments(&self.0), cursors: [0; 3] }
    }

    /// Drops every element without changing tier (tiers never demote).
    pub fn clear(&mut self) {
        match &mut *self.0 {
            Repr::Small(s) => s.values.clear(),
            Repr::Medium(m) => {
                m.values16.clear();
                m.values32.clear();
            }
            Repr::Full(f) => {
                f.values16.clear();
                f.values32.clear();
                f.values64.clear();
            }
        }
    }

    /// A uniformly random element. Panics on an empty set.
    pub fn random(&self, rng: &mut SplitMix64) -> i64 {
        let n = self.count();
        assert!(n > 0, "IntSet::random called on an empty set");
        self.get(rng.next_below(n)).expect("index within count() must resolve")
    }

    /// Approximate heap footprint in bytes (segment backing-store
    /// capacity, not including this handle's own `Box`).
    pub fn bytes(&self) -> usize {
        match &*self.0 {
            Repr::Small(s) => s.values.capacity() * core::mem::size_of::<i16>(),
            Repr::Medium(m) => {
                m.values16.capacity() * core::mem::size_of::<i16>()
                    + m.values32.capacity() * core::mem::size_of::<i32>()
            }
            Repr::Full(f) => {
                f.values16.capacity() * core::mem::size_of::<i16>()
                    + f.values32.capacity() * core::mem::size_of::<i32>()
                    + f.values64.capacity() * core::mem::size_of::<i64>()
            }
        }
    }
}

/// Ascending iterator over an [`IntSet`]'s elements.
///
/// Tiers store differing native widths, so there is no single `&[i64]`
/// view across all of them; this holds a borrowed, natively-typed [`Seg`]
/// per segment and three finger cursors, walking the k-way merge directly
/// over them. No segment is ever copied into a widened buffer.
pub struct Iter<'a> {
    segments: [Seg<'a>; 3],
    cursors: [usize; 3],
}

impl Iterator for Iter<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let heads = [0, 1, 2].map(|i| self.segments[i].at(self.cursors[i]));
        let idx = merge::pick_min(heads)?;
        self.cursors[idx] += 1;
        heads[idx]
    }
}

/// Borrows this representation's segments as natively-typed [`Seg`]s,
/// padding unused slots with an empty segment. No allocation or widening
/// happens here — each [`Seg`] only widens an element when compared.
fn segments(repr: &Repr) -> [Seg<'_>; 3] {
    match repr {
        Repr::Small(s) => [Seg::I16(&s.values), Seg::I16(&[]), Seg::I16(&[])],
        Repr::Medium(m) => [Seg::I16(&m.values16), Seg::I32(&m.values32), Seg::I16(&[])],
        Repr::Full(f) => [Seg::I16(&f.values16), Seg::I32(&f.values32), Seg::I64(&f.values64)],
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use alloc::vec::Vec;
    use quickcheck_macros::quickcheck;

    #[quickcheck]
    fn prop_iter_is_strictly_ascending_and_deduped(vals: Vec<i64>) -> bool {
        let mut s = IntSet::new();
        for v in vals {
            s.add(v);
        }
        let got: Vec<i64> = s.iter().collect();
        got.windows(2).all(|w| w[0] < w[1])
    }

    #[quickcheck]
    fn prop_count_matches_distinct_inserted_values(vals: Vec<i64>) -> bool {
        let mut s = IntSet::new();
        for &v in &vals {
            s.add(v);
        }
        let mut distinct: Vec<i64> = vals;
        distinct.sort_unstable();
        distinct.dedup();
        s.count() == distinct.len()
    }

    #[quickcheck]
    fn prop_tier_never_decreases_across_removals(vals: Vec<i64>) -> bool {
        let mut s = IntSet::new();
        for &v in &vals {
            s.add(v);
        }
        let peak = s.tier();
        for &v in &vals {
            s.remove(v);
        }
        s.tier() >= peak
    }

    #[quickcheck]
    fn prop_contains_matches_membership(vals: Vec<i64>, probe: i64) -> bool {
        let mut s = IntSet::new();
        for &v in &vals {
            s.add(v);
        }
        s.contains(probe) == vals.contains(&probe)
    }
}
