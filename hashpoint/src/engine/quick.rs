//! Two-slot in-memory cache of the most recent destinations.

use chrono::NaiveDate;

use crate::destination::Destination;

/// Holds the two most recently derived destinations.
///
/// A match only requires the same requested calendar day, the same
/// global/cell-ness and the same 30W-rule membership, not full cell
/// equality: destinations sharing those three share a fraction pair, and
/// the caller re-anchors the fractions onto the cell it actually asked
/// for.
pub(crate) struct QuickCache {
    slots: [Option<Destination>; 2],
}

impl QuickCache {
    pub(crate) fn new() -> Self {
        Self { slots: [None, None] }
    }

    /// Looks up a destination matching day, cell-ness and rule membership.
    pub(crate) fn lookup(
        &self,
        date: NaiveDate,
        has_graticule: bool,
        under_rule: bool,
    ) -> Option<&Destination> {
        self.slots.iter().flatten().find(|d| {
            d.date() == date
                && d.graticule().is_some() == has_graticule
                && d.uses_30w_rule() == under_rule
        })
    }

    /// Inserts a destination, displacing the oldest slot.
    pub(crate) fn push(&mut self, destination: Destination) {
        self.slots[1] = self.slots[0].take();
        self.slots[0] = Some(destination);
    }

    /// Drops both slots.
    pub(crate) fn clear(&mut self) {
        self.slots = [None, None];
    }
}
