use log::debug;

use crate::geometry::VirtualAddress;
use crate::replacement::{ClockReplacer, ReplacementError};
use crate::table::PageTable;

/// Why a translation came back as a segmentation fault.
///
/// Callers rendering outcomes don't need the distinction (both cases print
/// the same), but it matters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegfaultCause {
    /// Page number past the end of the table.
    OutOfRange,
    /// Entry grants no access, resident or not.
    Protection,
}

/// Result of translating one virtual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Resident page: the physical address.
    Translated(u64),
    /// Page fault handled by replacement, then translated.
    PageFault(u64),
    /// Unmapped or out-of-range page.
    Segfault(SegfaultCause),
    /// Page lives on disk and replacement is disabled; bringing it in is an
    /// external loader's job.
    Disk,
}

impl Outcome {
    /// The physical address, when the translation produced one.
    pub fn physical_address(&self) -> Option<u64> {
        match self {
            Outcome::Translated(pa) | Outcome::PageFault(pa) => Some(*pa),
            Outcome::Segfault(_) | Outcome::Disk => None,
        }
    }
}

/// Owns the page table and, when replacement is enabled, the clock state.
///
/// Translations mutate entry state (reference bits, fault installs), and
/// those mutations are the only channel by which earlier addresses influence
/// later ones.
pub struct Translator {
    table: PageTable,
    replacer: Option<ClockReplacer>,
    /// Some entry has been resident at some point. Tracked incrementally so
    /// the first-fault bootstrap doesn't rescan the table on every fault.
    resident_seen: bool,
}

impl Translator {
    /// Engine without replacement: non-resident pages report [`Outcome::Disk`].
    pub fn new(table: PageTable) -> Self {
        let resident_seen = table.any_valid();
        Translator {
            table,
            replacer: None,
            resident_seen,
        }
    }

    /// Engine with Second-Chance replacement handling page faults in place.
    pub fn with_clock(table: PageTable) -> Self {
        let resident_seen = table.any_valid();
        Translator {
            table,
            replacer: Some(ClockReplacer::new()),
            resident_seen,
        }
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    /// Translate one virtual address.
    ///
    /// The check order is load-bearing: range, then permissions, then
    /// residency. Permissions must win over a stale `valid` bit left behind
    /// by a previous occupant of the frame.
    ///
    /// `Err` is only possible through misuse of a hand-mutated table; a
    /// table that reached this engine through loading can always satisfy a
    /// fault (see [`ClockReplacer::select`]).
    pub fn translate(&mut self, raw: u64) -> Result<Outcome, ReplacementError> {
        let geometry = *self.table.geometry();
        let va = VirtualAddress::decode(raw, &geometry);

        // Step 1: page number beyond the table means the address space ends
        // before this address
        if va.page >= self.table.len() as u64 {
            return Ok(Outcome::Segfault(SegfaultCause::OutOfRange));
        }
        let page = va.page as usize;
        let entry = self.table.entries()[page];

        // Step 2: permissions are authoritative before residency is even
        // looked at
        if !entry.permissions.grants_access() {
            return Ok(Outcome::Segfault(SegfaultCause::Protection));
        }

        // Step 3: non-resident page
        if !entry.valid {
            let Some(replacer) = self.replacer.as_mut() else {
                return Ok(Outcome::Disk);
            };

            debug!("page fault on page {page}");
            let frame = if self.resident_seen {
                replacer.select(self.table.entries_mut())?
            } else {
                // Cold start: nothing is resident, so there is no frame to
                // steal; the faulting entry keeps its pre-seeded frame
                entry.frame
            };

            let slot = &mut self.table.entries_mut()[page];
            slot.valid = true;
            slot.used = true;
            slot.frame = frame;
            self.resident_seen = true;

            return Ok(Outcome::PageFault(geometry.join(frame, va.offset)));
        }

        // Step 4: hit. Mark the reference bit so the clock spares this page
        // on its next pass
        let slot = &mut self.table.entries_mut()[page];
        slot.used = true;

        Ok(Outcome::Translated(geometry.join(slot.frame, va.offset)))
    }
}
