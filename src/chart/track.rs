//! The sparse tick-indexed event container [`Track`] and the position algebra over it.
//!
//! Every track kind of a chart (sync, events and the note tracks) shares this shape, so the
//! whole-chart transforms in [`super::Chart`] are built by applying these operations uniformly.
//!
//! There are two distinct collision policies here:
//!
//! - [`Track::map_positions`] and [`Track::rescale`] overwrite: when two source ticks land on the
//!   same target tick, the one processed later (the higher source tick) replaces the earlier.
//! - [`Track::concat`] splices: colliding event lists are joined together.

use std::collections::{BTreeMap, btree_map};

use itertools::{EitherOrBoth, Itertools};
use num::rational::Ratio;

/// Integer position along a chart, relative to its resolution.
pub type Tick = u64;

/// An ordered mapping from tick to a non-empty list of events.
///
/// Iteration always yields ticks in ascending order. Events sharing one tick keep their order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track<T> {
    entries: BTreeMap<Tick, Vec<T>>,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Track<T> {
    /// Creates an empty track.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the end of the list at `tick`.
    pub fn push(&mut self, tick: Tick, event: T) {
        self.entries.entry(tick).or_default().push(event);
    }

    /// Replaces the whole list at `tick`, returning the previous one. An empty list removes the entry.
    pub fn insert(&mut self, tick: Tick, events: Vec<T>) -> Option<Vec<T>> {
        if events.is_empty() {
            return self.entries.remove(&tick);
        }
        self.entries.insert(tick, events)
    }

    /// Removes the list at `tick`.
    pub fn remove(&mut self, tick: Tick) -> Option<Vec<T>> {
        self.entries.remove(&tick)
    }

    /// Gets the events at `tick`.
    #[must_use]
    pub fn get(&self, tick: Tick) -> Option<&[T]> {
        self.entries.get(&tick).map(Vec::as_slice)
    }

    /// Gets the events at `tick` mutably.
    pub fn get_mut(&mut self, tick: Tick) -> Option<&mut Vec<T>> {
        self.entries.get_mut(&tick)
    }

    /// Iterates entries in ascending tick order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.entries.iter())
    }

    /// Iterates the event lists mutably in ascending tick order.
    pub fn lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<T>> {
        self.entries.values_mut()
    }

    /// Iterates the entries whose tick is in `range`, ascending.
    pub fn range(
        &self,
        range: impl std::ops::RangeBounds<Tick>,
    ) -> impl DoubleEndedIterator<Item = (Tick, &[T])> {
        self.entries
            .range(range)
            .map(|(&tick, events)| (tick, events.as_slice()))
    }

    /// Iterates every event with its tick, ascending.
    pub fn events(&self) -> impl Iterator<Item = (Tick, &T)> {
        self.iter()
            .flat_map(|(tick, events)| events.iter().map(move |event| (tick, event)))
    }

    /// The lowest occupied tick.
    #[must_use]
    pub fn first_tick(&self) -> Option<Tick> {
        self.entries.first_key_value().map(|(&tick, _)| tick)
    }

    /// The highest occupied tick.
    #[must_use]
    pub fn last_tick(&self) -> Option<Tick> {
        self.entries.last_key_value().map(|(&tick, _)| tick)
    }

    /// Number of occupied ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tick is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Track<T> {
    /// Keeps only the entries whose tick satisfies `predicate`.
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(Tick) -> bool) -> Self {
        self.entries
            .iter()
            .filter(|&(&tick, _)| predicate(tick))
            .map(|(&tick, events)| (tick, events.clone()))
            .collect()
    }

    /// Replaces every tick with `f(tick)`.
    ///
    /// Entries are processed in ascending source order and a later entry replaces an earlier one
    /// landing on the same tick. Nothing is concatenated.
    #[must_use]
    pub fn map_positions(&self, mut f: impl FnMut(Tick) -> Tick) -> Self {
        self.entries
            .iter()
            .map(|(&tick, events)| (f(tick), events.clone()))
            .collect()
    }

    /// Joins two tracks. Entries of `self` come before those of `other` on the same tick, and
    /// their event lists are spliced into one.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let entries = self
            .entries
            .iter()
            .merge_join_by(other.entries.iter(), |(a, _), (b, _)| a.cmp(b))
            .map(|either| match either {
                EitherOrBoth::Both((&tick, left), (_, right)) => {
                    (tick, left.iter().chain(right).cloned().collect::<Vec<_>>())
                }
                EitherOrBoth::Left((&tick, events)) | EitherOrBoth::Right((&tick, events)) => {
                    (tick, events.clone())
                }
            })
            .collect();
        Self { entries }
    }

    /// Moves every tick from `old_resolution` to `new_resolution`, rounding half up.
    ///
    /// This has the same overwrite policy as [`Track::map_positions`], so down-scaling may drop
    /// entries whose ticks collapse together.
    ///
    /// # Panics
    ///
    /// Panics if `old_resolution` is zero.
    #[must_use]
    pub fn rescale(&self, old_resolution: u32, new_resolution: u32) -> Self {
        assert_ne!(old_resolution, 0, "resolution must be positive");
        self.map_positions(|tick| rescale_tick(tick, old_resolution, new_resolution))
    }
}

/// Converts one tick between resolutions, rounding half up.
///
/// # Panics
///
/// Panics if `old_resolution` is zero.
#[must_use]
pub fn rescale_tick(tick: Tick, old_resolution: u32, new_resolution: u32) -> Tick {
    let scaled = Ratio::new(
        u128::from(tick) * u128::from(new_resolution),
        u128::from(old_resolution),
    )
    .round()
    .to_integer();
    Tick::try_from(scaled).unwrap_or(Tick::MAX)
}

impl<T> FromIterator<(Tick, Vec<T>)> for Track<T> {
    /// Later entries replace earlier ones on the same tick. Empty lists are skipped.
    fn from_iter<I: IntoIterator<Item = (Tick, Vec<T>)>>(iter: I) -> Self {
        let mut track = Self::new();
        for (tick, events) in iter {
            track.insert(tick, events);
        }
        track
    }
}

impl<T> Extend<(Tick, T)> for Track<T> {
    fn extend<I: IntoIterator<Item = (Tick, T)>>(&mut self, iter: I) {
        for (tick, event) in iter {
            self.push(tick, event);
        }
    }
}

/// Iterator over the entries of a [`Track`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T>(btree_map::Iter<'a, Tick, Vec<T>>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Tick, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(&tick, events)| (tick, events.as_slice()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(&tick, events)| (tick, events.as_slice()))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a Track<T> {
    type Item = (Tick, &'a [T]);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for Track<T> {
    type Item = (Tick, Vec<T>);
    type IntoIter = btree_map::IntoIter<Tick, Vec<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(entries: &[(Tick, &[&'static str])]) -> Track<&'static str> {
        entries
            .iter()
            .map(|&(tick, events)| (tick, events.to_vec()))
            .collect()
    }

    #[test]
    fn iterates_in_ascending_order() {
        let mut t = Track::new();
        t.push(300, "c");
        t.push(0, "a");
        t.push(100, "b");
        t.push(100, "b2");
        let ticks: Vec<_> = t.iter().map(|(tick, _)| tick).collect();
        assert_eq!(ticks, vec![0, 100, 300]);
        assert_eq!(t.get(100), Some(&["b", "b2"][..]));
    }

    #[test]
    fn concat_splices_colliding_ticks() {
        let a = track(&[(0, &["a0"]), (192, &["a1"])]);
        let b = track(&[(96, &["b0"]), (192, &["b1", "b2"])]);
        let joined = a.concat(&b);
        assert_eq!(
            joined,
            track(&[(0, &["a0"]), (96, &["b0"]), (192, &["a1", "b1", "b2"])])
        );
    }

    #[test]
    fn map_positions_keeps_later_entry_on_collision() {
        let t = track(&[(10, &["first"]), (20, &["second"])]);
        let mapped = t.map_positions(|_| 5);
        assert_eq!(mapped, track(&[(5, &["second"])]));
    }

    #[test]
    fn rescale_rounds_half_up() {
        assert_eq!(rescale_tick(1, 2, 3), 2);
        assert_eq!(rescale_tick(96, 192, 480), 240);
        assert_eq!(rescale_tick(1, 480, 192), 0);
        assert_eq!(rescale_tick(3, 480, 192), 1);
    }

    #[test]
    fn rescale_down_overwrites() {
        let t = track(&[(0, &["a"]), (1, &["b"])]);
        let scaled = t.rescale(480, 192);
        assert_eq!(scaled, track(&[(0, &["b"])]));
    }

    #[test]
    fn filter_keeps_matching_ticks() {
        let t = track(&[(0, &["a"]), (100, &["b"]), (200, &["c"])]);
        assert_eq!(
            t.filter(|tick| tick >= 100),
            track(&[(100, &["b"]), (200, &["c"])])
        );
    }

    #[test]
    fn empty_lists_are_not_stored() {
        let mut t: Track<u8> = Track::new();
        t.insert(5, vec![]);
        assert!(t.is_empty());
        t.push(5, 1);
        assert_eq!(t.insert(5, vec![]), Some(vec![1]));
        assert!(t.is_empty());
    }
}
