use log::{debug, trace};
use thiserror::Error;

use crate::table::PageTableEntry;

/// Replacement failed because no frame can ever be reclaimed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementError {
    /// The sweep crossed every slot twice without finding a resident page.
    #[error("no resident page to evict: replacement pool is exhausted")]
    ExhaustedPool,
}

/// Second-Chance (clock) eviction over a page-table entry slice.
///
/// The hand survives across faults: each sweep resumes wherever the previous
/// one stopped, which is what turns a reference bit into an approximation of
/// recency.
#[derive(Debug, Default)]
pub struct ClockReplacer {
    hand: usize,
}

impl ClockReplacer {
    pub fn new() -> Self {
        ClockReplacer { hand: 0 }
    }

    /// Current hand position, for inspection.
    #[inline]
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// Sweep for a victim, invalidate it, and return its frame.
    ///
    /// Invalid slots hold no frame and are stepped past. A resident slot
    /// with the reference bit set gets a second chance: the bit is cleared
    /// and the hand moves on. The first resident slot with a clear bit is
    /// the victim; the hand stops one position past it.
    ///
    /// With at least one resident slot a victim always turns up within two
    /// full passes: a pass can at worst clear every reference bit it
    /// crosses, and the next must then hit a clear one. Running longer than
    /// that means nothing is evictable, reported as
    /// [`ReplacementError::ExhaustedPool`] instead of sweeping forever.
    pub fn select(&mut self, entries: &mut [PageTableEntry]) -> Result<u64, ReplacementError> {
        if entries.is_empty() {
            return Err(ReplacementError::ExhaustedPool);
        }
        if self.hand >= entries.len() {
            self.hand = 0;
        }

        for _ in 0..=2 * entries.len() {
            let slot = self.hand;
            let entry = &mut entries[slot];

            if !entry.valid {
                self.advance(entries.len());
                continue;
            }

            if entry.used {
                // Second chance: clear the bit, don't evict on this pass
                trace!("second chance for page {slot}");
                entry.used = false;
                self.advance(entries.len());
                continue;
            }

            let frame = entry.frame;
            entry.valid = false;
            self.advance(entries.len());
            debug!("evicted page {slot}, reclaimed frame {frame}");
            return Ok(frame);
        }

        Err(ReplacementError::ExhaustedPool)
    }

    fn advance(&mut self, len: usize) {
        self.hand = (self.hand + 1) % len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Permissions;

    fn entry(valid: bool, frame: u64, used: bool) -> PageTableEntry {
        PageTableEntry::new(valid, Permissions::READ, frame, used)
    }

    #[test]
    fn test_picks_first_unused_resident_slot() {
        let mut entries = vec![entry(true, 4, false), entry(true, 9, false)];
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Ok(4));
        assert!(!entries[0].valid);
        assert!(entries[1].valid);
        // Hand stops one past the victim
        assert_eq!(clock.hand(), 1);
    }

    #[test]
    fn test_second_chance_clears_without_evicting() {
        let mut entries = vec![entry(true, 4, true), entry(true, 9, false)];
        let mut clock = ClockReplacer::new();

        // Slot 0 is referenced: spared this pass, bit cleared, slot 1 evicted
        assert_eq!(clock.select(&mut entries), Ok(9));
        assert!(entries[0].valid);
        assert!(!entries[0].used);
        assert!(!entries[1].valid);
        assert_eq!(clock.hand(), 0);
    }

    #[test]
    fn test_skips_invalid_slots() {
        let mut entries = vec![
            entry(false, 1, false),
            entry(false, 2, false),
            entry(true, 7, false),
        ];
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Ok(7));
        assert_eq!(clock.hand(), 0);
    }

    #[test]
    fn test_all_referenced_takes_full_pass_then_start() {
        // Every slot referenced: the first pass clears all three bits, then
        // the sweep wraps and takes the slot it started from
        let mut entries = vec![entry(true, 1, true), entry(true, 2, true), entry(true, 3, true)];
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Ok(1));
        assert!(!entries[0].valid);
        assert!(entries[1].valid && !entries[1].used);
        assert!(entries[2].valid && !entries[2].used);
        assert_eq!(clock.hand(), 1);
    }

    #[test]
    fn test_hand_persists_across_sweeps() {
        let mut entries = vec![
            entry(true, 1, false),
            entry(true, 2, false),
            entry(true, 3, false),
        ];
        let mut clock = ClockReplacer::new();

        // Victims come out in hand order, not slot-0-first each time
        assert_eq!(clock.select(&mut entries), Ok(1));
        assert_eq!(clock.select(&mut entries), Ok(2));
        assert_eq!(clock.select(&mut entries), Ok(3));
    }

    #[test]
    fn test_wraps_around_the_end() {
        let mut entries = vec![entry(true, 1, false), entry(true, 2, false)];
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Ok(1));
        assert_eq!(clock.hand(), 1);
        assert_eq!(clock.select(&mut entries), Ok(2));
        assert_eq!(clock.hand(), 0);
    }

    #[test]
    fn test_exhausted_pool_with_no_resident_slots() {
        let mut entries = vec![entry(false, 1, false), entry(false, 2, true)];
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Err(ReplacementError::ExhaustedPool));
    }

    #[test]
    fn test_exhausted_pool_on_empty_table() {
        let mut entries: Vec<PageTableEntry> = Vec::new();
        let mut clock = ClockReplacer::new();

        assert_eq!(clock.select(&mut entries), Err(ReplacementError::ExhaustedPool));
    }
}
