use crate::core::geometry::Vec2;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Kinds of collision events resolved by the scheduler.
///
/// Tie-breaking for deterministic ordering prefers `ParticleParticle` < `WallParticle`
/// when times are equal, then compares participant indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Contact between particles `first` and `second` (`first < second`).
    ParticleParticle { first: usize, second: usize },
    /// Contact between wall `wall` and particle `particle`.
    WallParticle { wall: usize, particle: usize },
}

impl EventKind {
    /// Particle-particle event with participants stored in ascending order.
    pub fn particles(a: usize, b: usize) -> Self {
        EventKind::ParticleParticle {
            first: a.min(b),
            second: a.max(b),
        }
    }

    #[inline]
    fn order_key(&self) -> (u8, usize, usize) {
        match *self {
            EventKind::ParticleParticle { first, second } => (0, first, second),
            EventKind::WallParticle { wall, particle } => (1, particle, wall),
        }
    }

    #[inline]
    pub fn involves_particle(&self, i: usize) -> bool {
        match *self {
            EventKind::ParticleParticle { first, second } => first == i || second == i,
            EventKind::WallParticle { particle, .. } => particle == i,
        }
    }

    #[inline]
    pub fn involves_wall(&self, w: usize) -> bool {
        matches!(*self, EventKind::WallParticle { wall, .. } if wall == w)
    }

    /// Whether this event shares a participant with `other`.
    pub fn shares_participant(&self, other: &EventKind) -> bool {
        match *other {
            EventKind::ParticleParticle { first, second } => {
                self.involves_particle(first) || self.involves_particle(second)
            }
            EventKind::WallParticle { wall, particle } => {
                self.involves_wall(wall) || self.involves_particle(particle)
            }
        }
    }
}

/// A predicted contact inside the current sub-step.
///
/// - `time`: time until contact, relative to the scheduler's current instant (finite).
/// - `kind`: event kind and participants.
/// - `normal`: unit contact normal, pointing from the first participant to the second.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: NotNan<f64>,
    pub kind: EventKind,
    pub normal: Vec2,
}

impl Event {
    /// Create a new event, validating that time is finite and non-NaN.
    pub fn new(time: f64, kind: EventKind, normal: Vec2) -> Result<Self> {
        if time.is_nan() {
            return Err(Error::InvalidParam("event time cannot be NaN".into()));
        }
        if !time.is_finite() {
            return Err(Error::InvalidParam("event time must be finite".into()));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("event time cannot be NaN".into()))?;
        Ok(Self { time, kind, normal })
    }

    /// Returns the raw f64 event time.
    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// Move the event `elapsed` closer in time.
    #[inline]
    pub fn advance(&mut self, elapsed: f64) {
        if let Ok(t) = NotNan::new(self.time_f64() - elapsed) {
            self.time = t;
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.kind.order_key().cmp(&other.kind.order_key()),
            o => o,
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Slot pool of pending events, reused across sub-steps.
///
/// Released slots go on a free list and are handed out again before the pool grows.
#[derive(Debug, Clone, Default)]
pub struct EventPool {
    slots: Vec<Option<Event>>,
    free: Vec<usize>,
    live: usize,
}

impl EventPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event: Event) -> usize {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(event);
                slot
            }
            None => {
                self.slots.push(Some(event));
                self.slots.len() - 1
            }
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Event> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn take(&mut self, slot: usize) -> Option<Event> {
        let event = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.live -= 1;
        Some(event)
    }

    /// Drop every event not matching `keep`.
    pub fn retain<F: FnMut(&Event) -> bool>(&mut self, mut keep: F) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.as_ref().is_some_and(|e| !keep(e)) {
                *entry = None;
                self.free.push(slot);
                self.live -= 1;
            }
        }
    }

    /// Empty the pool, keeping its allocations.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Event)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, e)| e.as_ref().map(|e| (slot, e)))
    }

    /// Earliest pending event under the deterministic ordering.
    pub fn earliest(&self) -> Option<Event> {
        self.iter().map(|(_, e)| *e).min()
    }

    /// Move every pending event `elapsed` closer in time.
    pub fn advance_all(&mut self, elapsed: f64) {
        for e in self.slots.iter_mut().flatten() {
            e.advance(elapsed);
        }
    }

    /// Slots of all events due no later than `time`, in resolution order.
    pub fn due(&self, time: f64, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            self.iter()
                .filter(|(_, e)| e.time_f64() <= time)
                .map(|(slot, _)| slot),
        );
        out.sort_by(|&a, &b| self.slots[a].cmp(&self.slots[b]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EventKind::{ParticleParticle, WallParticle};

    fn pp(first: usize, second: usize) -> EventKind {
        ParticleParticle { first, second }
    }

    fn wp(wall: usize, particle: usize) -> EventKind {
        WallParticle { wall, particle }
    }

    #[test]
    fn new_event_rejects_nan_time() {
        let err = Event::new(f64::NAN, pp(1, 2), Vec2::x()).unwrap_err();
        assert!(err.to_string().contains("NaN"));
        assert!(Event::new(f64::INFINITY, pp(1, 2), Vec2::x()).is_err());
    }

    #[test]
    fn ordering_by_time() -> Result<()> {
        let e1 = Event::new(1.0, pp(0, 1), Vec2::x())?;
        let e2 = Event::new(2.0, wp(0, 0), Vec2::y())?;
        assert!(e1 < e2);
        Ok(())
    }

    #[test]
    fn tie_breaker_prefers_particle_pairs_then_indices() -> Result<()> {
        let t = 5.0;
        let a = Event::new(t, pp(3, 4), Vec2::x())?;
        let b = Event::new(t, wp(0, 0), Vec2::x())?;
        let c = Event::new(t, pp(0, 7), Vec2::x())?;
        assert!(a < b);
        assert!(c < a);
        Ok(())
    }

    #[test]
    fn participants_are_normalized_and_matched() {
        assert_eq!(EventKind::particles(5, 2), pp(2, 5));
        assert!(pp(2, 5).involves_particle(5));
        assert!(!pp(2, 5).involves_wall(2));
        assert!(wp(1, 3).involves_wall(1));
        assert!(wp(1, 3).shares_participant(&pp(3, 9)));
        assert!(!wp(1, 3).shares_participant(&wp(2, 4)));
    }

    #[test]
    fn pool_reuses_released_slots() -> Result<()> {
        let mut pool = EventPool::new();
        let s0 = pool.insert(Event::new(0.3, pp(0, 1), Vec2::x())?);
        let s1 = pool.insert(Event::new(0.1, wp(0, 2), Vec2::y())?);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.earliest().map(|e| e.kind), Some(wp(0, 2)));

        assert!(pool.take(s1).is_some());
        assert!(pool.take(s1).is_none());
        let s2 = pool.insert(Event::new(0.2, pp(1, 2), Vec2::x())?);
        assert_eq!(s2, s1);

        pool.retain(|e| !e.kind.involves_particle(0));
        assert_eq!(pool.len(), 1);
        assert!(pool.get(s0).is_none());
        Ok(())
    }

    #[test]
    fn due_events_come_out_in_resolution_order() -> Result<()> {
        let mut pool = EventPool::new();
        pool.insert(Event::new(0.5, wp(0, 0), Vec2::x())?);
        pool.insert(Event::new(0.5, pp(2, 3), Vec2::x())?);
        pool.insert(Event::new(0.9, pp(0, 1), Vec2::x())?);
        pool.advance_all(0.5);

        let mut due = Vec::new();
        pool.due(0.0, &mut due);
        let kinds: Vec<EventKind> = due.iter().filter_map(|&s| pool.get(s)).map(|e| e.kind).collect();
        assert_eq!(kinds, vec![pp(2, 3), wp(0, 0)]);
        Ok(())
    }
}
