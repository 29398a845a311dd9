use std::fmt;

use bitflags::bitflags;

use crate::geometry::Geometry;

bitflags! {
    /// Access rights for one page.
    ///
    /// Table files supply an arbitrary integer; the bits are kept as-is. The
    /// translator only cares whether the set is empty: an empty set means
    /// the page number is unmapped and must fault no matter what the rest of
    /// the entry says.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: u32 {
        const READ = 1;
        const WRITE = 1 << 1;
        const EXECUTE = 1 << 2;
    }
}

impl Permissions {
    #[inline]
    pub fn grants_access(&self) -> bool {
        !self.is_empty()
    }
}

/// One slot of the page table. The slot's index in the table is the page
/// number; there is no page-number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    /// Page is resident in a physical frame.
    pub valid: bool,
    pub permissions: Permissions,
    /// Frame backing the page while `valid`; until then, the frame the page
    /// will occupy once faulted in.
    pub frame: u64,
    /// Reference bit consumed by the clock sweep. Set on every hit, cleared
    /// by a passing sweep as the second chance.
    pub used: bool,
}

impl PageTableEntry {
    pub fn new(valid: bool, permissions: Permissions, frame: u64, used: bool) -> Self {
        PageTableEntry {
            valid,
            permissions,
            frame,
            used,
        }
    }
}

impl fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valid={}, perm={}, frame={}, used={}",
            self.valid as u8,
            self.permissions.bits(),
            self.frame,
            self.used as u8
        )
    }
}

/// A flat page table plus the geometry its addresses decode against.
///
/// The table may be shorter than the geometry's addressable page count; an
/// address that lands past the end is a translation fault, not a
/// construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    geometry: Geometry,
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    pub fn new(geometry: Geometry) -> Self {
        PageTable {
            geometry,
            entries: Vec::new(),
        }
    }

    pub fn with_entries(geometry: Geometry, entries: Vec<PageTableEntry>) -> Self {
        PageTable { geometry, entries }
    }

    pub fn push_entry(&mut self, entry: PageTableEntry) {
        self.entries.push(entry);
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, page: usize) -> Option<&PageTableEntry> {
        self.entries.get(page)
    }

    pub fn entries(&self) -> &[PageTableEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PageTableEntry] {
        &mut self.entries
    }

    /// Whether any page is currently resident.
    pub fn any_valid(&self) -> bool {
        self.entries.iter().any(|e| e.valid)
    }
}
