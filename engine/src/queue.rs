use std::collections::BTreeMap;

use crate::prelude::*;

/// A thing that can be scheduled to act on the turn queue.
///
/// Periodic level upkeep and timed charges are scheduled exactly like
/// regular actors, they just resolve differently.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Schedulable {
    /// The player or a monster.
    Actor(Entity),
    /// Once-per-turn level upkeep, draws the player a new ability.
    LevelTick,
    /// A primed explosive charge counting down.
    Fuse(Entity),
}

impl Schedulable {
    /// Does the item still warrant a place on the queue?
    pub fn exists(&self, r: &impl AsRef<Runtime>) -> bool {
        match self {
            Schedulable::Actor(e) | Schedulable::Fuse(e) => e.is_alive(r),
            Schedulable::LevelTick => true,
        }
    }
}

/// Time-ordered multiset of scheduled items with stable FIFO ties.
///
/// The queue knows nothing about why tick costs are what they are. It
/// only promises that pops come out in nondecreasing due-tick order and
/// that items due on the same tick come out in insertion order.
#[derive(Default)]
pub struct TurnQueue {
    entries: BTreeMap<(Instant, u64), Schedulable>,
    next_seq: u64,
    last_popped: Instant,
}

impl TurnQueue {
    /// Schedule an item to act at the given absolute tick.
    pub fn put(&mut self, item: Schedulable, due: Instant) {
        debug_assert!(
            !self.contains(&item),
            "TurnQueue::put: double-scheduled {item:?}"
        );
        self.entries.insert((due, self.next_seq), item);
        self.next_seq += 1;
    }

    /// Align the reference point of `peek_interval` with the world clock.
    ///
    /// Needed when a queue is built for a game already in progress,
    /// otherwise the first interval would span from tick zero.
    pub(crate) fn anchor(&mut self, now: Instant) {
        self.last_popped = now;
    }

    /// Remove and return the next due item.
    pub fn pop(&mut self) -> Option<Schedulable> {
        let ((due, _), item) = self.entries.pop_first()?;
        self.last_popped = due;
        Some(item)
    }

    /// Ticks between the previous pop and the next due item.
    pub fn peek_interval(&self) -> Option<i64> {
        self.entries
            .keys()
            .next()
            .map(|&(due, _)| due - self.last_popped)
    }

    /// Drop every entry for the given item, used when an actor dies.
    ///
    /// Returns false if the item had no entry.
    pub fn remove(&mut self, item: &Schedulable) -> bool {
        let keys: Vec<(Instant, u64)> = self
            .entries
            .iter()
            .filter(|(_, v)| *v == item)
            .map(|(&k, _)| k)
            .collect();
        for k in &keys {
            self.entries.remove(k);
        }
        !keys.is_empty()
    }

    pub fn contains(&self, item: &Schedulable) -> bool {
        self.entries.values().any(|v| v == item)
    }

    /// Entries in pop order, earliest due tick first.
    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (Instant, &Schedulable)> + '_ {
        self.entries.iter().map(|(&(due, _), item)| (due, item))
    }

    /// Absolute tick at which the given item is due, if it is scheduled.
    pub fn due(&self, item: &Schedulable) -> Option<Instant> {
        self.entries
            .iter()
            .find(|(_, v)| *v == item)
            .map(|(&(due, _), _)| due)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn dummies(n: usize) -> Vec<Schedulable> {
        let mut world = hecs::World::new();
        (0..n)
            .map(|_| Schedulable::Actor(Entity(world.spawn(()))))
            .collect()
    }

    #[quickcheck]
    fn pops_in_nondecreasing_order(ticks: Vec<i64>) -> bool {
        let items = dummies(ticks.len());
        let mut queue = TurnQueue::default();
        for (item, &t) in items.iter().zip(&ticks) {
            queue.put(*item, Instant(t));
        }

        let mut prev = i64::MIN;
        while queue.pop().is_some() {
            let due = queue.last_popped.0;
            if due < prev {
                return false;
            }
            prev = due;
        }
        true
    }

    #[test]
    fn ties_break_in_insertion_order() {
        let items = dummies(4);
        let mut queue = TurnQueue::default();
        // All due on the same tick, interleaved with an earlier entry.
        queue.put(items[0], Instant(5));
        queue.put(items[1], Instant(5));
        queue.put(items[2], Instant(3));
        queue.put(items[3], Instant(5));

        assert_eq!(queue.pop(), Some(items[2]));
        assert_eq!(queue.pop(), Some(items[0]));
        assert_eq!(queue.pop(), Some(items[1]));
        assert_eq!(queue.pop(), Some(items[3]));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn intervals_accumulate() {
        let items = dummies(2);
        let mut queue = TurnQueue::default();
        queue.put(items[0], Instant(10));
        queue.put(items[1], Instant(24));

        assert_eq!(queue.peek_interval(), Some(10));
        queue.pop();
        assert_eq!(queue.peek_interval(), Some(14));
        queue.pop();
        assert_eq!(queue.peek_interval(), None);
    }

    #[test]
    fn speed_spacing() {
        // An actor re-inserted at cost C is not due again until the clock
        // has advanced by C from its previous pop.
        let items = dummies(2);
        let mut queue = TurnQueue::default();
        queue.put(items[0], Instant(0));
        queue.put(items[1], Instant(0));

        let mut now = Instant(0);
        let mut pops = Vec::new();
        for _ in 0..3 {
            now += queue.peek_interval().unwrap();
            let e = queue.pop().unwrap();
            pops.push((e, now));
            let cost = if e == items[0] { 10 } else { 24 };
            queue.put(e, now + cost);
        }

        // A@0, B@0, A@10: the speed-10 actor is due again at tick 10,
        // before the speed-24 actor's follow-up at tick 24.
        assert_eq!(pops[0], (items[0], Instant(0)));
        assert_eq!(pops[1], (items[1], Instant(0)));
        assert_eq!(pops[2], (items[0], Instant(10)));
        assert_eq!(queue.due(&items[1]), Some(Instant(24)));
    }

    #[test]
    fn remove_deletes_all_entries() {
        let items = dummies(2);
        let mut queue = TurnQueue::default();
        queue.put(items[0], Instant(7));
        queue.put(items[1], Instant(9));

        assert!(queue.remove(&items[0]));
        assert!(!queue.remove(&items[0]));
        assert!(!queue.contains(&items[0]));
        assert_eq!(queue.pop(), Some(items[1]));
    }
}
