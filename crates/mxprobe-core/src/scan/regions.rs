//! Walk of the application address space.

use tracing::debug;

use crate::memory::{MemoryRegion, ReadMemory};

/// Cursor step past an address whose region cannot be queried
const QUERY_FAILURE_STEP: u64 = 0x1000;

/// Consecutive failed queries after which the walk ends
const MAX_QUERY_FAILURES: usize = 16;

/// Iterator over regions that may hold live, mutable state.
///
/// Starts at the lowest application address and queries one region at a
/// time. Regions failing `MemoryRegion::is_scannable` are counted and
/// skipped without being read. The cursor always advances to the end of the
/// region just queried. A failed query skips one page; a run of failed
/// queries ends the walk.
pub struct RegionWalker<'a, M> {
    source: &'a M,
    cursor: u64,
    end: u64,
    min_size: u64,
    unfiltered: bool,
    skipped: usize,
    query_failures: usize,
    done: bool,
}

impl<'a, M: ReadMemory> RegionWalker<'a, M> {
    /// Walk `[start, end)`, yielding regions of at least `min_size` bytes
    pub fn new(source: &'a M, start: u64, end: u64, min_size: u64) -> Self {
        Self {
            source,
            cursor: start,
            end,
            min_size,
            unfiltered: false,
            skipped: 0,
            query_failures: 0,
            done: false,
        }
    }

    /// Yield every region the walk visits, free and reserved ones included
    pub fn unfiltered(mut self) -> Self {
        self.unfiltered = true;
        self
    }

    /// Walk the source's whole application address range.
    ///
    /// If the range cannot be determined the walk is empty.
    pub fn over(source: &'a M, min_size: u64) -> Self {
        match source.address_range() {
            Ok((start, end)) => Self::new(source, start, end, min_size),
            Err(e) => {
                debug!("Address range unavailable: {}", e);
                let mut walker = Self::new(source, 0, 0, min_size);
                walker.done = true;
                walker
            }
        }
    }

    /// Regions rejected by the filter so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<M: ReadMemory> Iterator for RegionWalker<'_, M> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<MemoryRegion> {
        while !self.done && self.cursor < self.end {
            let region = match self.source.query_region(self.cursor) {
                Ok(region) => region,
                Err(e) => {
                    self.query_failures += 1;
                    self.skipped += 1;
                    if self.query_failures >= MAX_QUERY_FAILURES {
                        debug!("Region walk stopped at 0x{:X}: {}", self.cursor, e);
                        self.done = true;
                        return None;
                    }
                    debug!("Region at 0x{:X} skipped: {}", self.cursor, e);
                    match self.cursor.checked_add(QUERY_FAILURE_STEP) {
                        Some(next) => self.cursor = next,
                        None => self.done = true,
                    }
                    continue;
                }
            };
            self.query_failures = 0;

            let next = region.end();
            if next <= self.cursor {
                debug!(
                    "Region walk stopped: cursor 0x{:X} did not advance",
                    self.cursor
                );
                self.done = true;
            } else {
                self.cursor = next;
            }

            if self.unfiltered || region.is_scannable(self.min_size) {
                return Some(region);
            }
            self.skipped += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemory, Protection, RegionKind, RegionState};

    fn region(base: u64, size: u64, protection: Protection, kind: RegionKind) -> MemoryRegion {
        MemoryRegion {
            base,
            size,
            state: RegionState::Commit,
            protection,
            kind,
        }
    }

    #[test]
    fn test_walk_filters_regions() {
        let mock = MockMemory::new()
            .with_region(0x10000, vec![0; 0x1000])
            .with_custom_region(
                region(0x20000, 0x1000, Protection::READONLY, RegionKind::Private),
                vec![],
            )
            .with_custom_region(
                region(0x30000, 0x1000, Protection::READWRITE, RegionKind::Mapped),
                vec![],
            )
            .with_custom_region(
                region(
                    0x40000,
                    0x1000,
                    Protection::READWRITE | Protection::GUARD,
                    RegionKind::Private,
                ),
                vec![],
            )
            .with_region(0x50000, vec![0; 0x2000]);

        let mut walker = RegionWalker::over(&mock, 1);
        let bases: Vec<u64> = walker.by_ref().map(|r| r.base).collect();
        assert_eq!(bases, vec![0x10000, 0x50000]);
        // three filtered regions plus the free gaps between them
        assert!(walker.skipped() >= 3);
    }

    #[test]
    fn test_walk_respects_min_size() {
        let mock = MockMemory::new()
            .with_region(0x10000, vec![0; 0x100])
            .with_region(0x20000, vec![0; 0x1000]);

        let bases: Vec<u64> = RegionWalker::over(&mock, 0x200).map(|r| r.base).collect();
        assert_eq!(bases, vec![0x20000]);
    }

    #[test]
    fn test_walk_empty_address_space() {
        let mock = MockMemory::new();
        assert_eq!(RegionWalker::over(&mock, 1).count(), 0);
    }

    #[test]
    fn test_unfiltered_walk_covers_range() {
        let mock = MockMemory::new()
            .with_address_range(0x10000, 0x40000)
            .with_region(0x20000, vec![0; 0x1000]);

        let regions: Vec<MemoryRegion> = RegionWalker::over(&mock, 1).unfiltered().collect();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].state, RegionState::Free);
        assert_eq!(regions[1].base, 0x20000);
        assert_eq!(regions[2].end(), 0x40000);
    }

    #[test]
    fn test_failed_query_skips_one_region() {
        let mock = MockMemory::new()
            .with_region(0x10000, vec![0; 0x1000])
            .with_unqueryable_range(0x20000, 0x2000)
            .with_region(0x30000, vec![0; 0x1000]);

        let mut walker = RegionWalker::over(&mock, 1);
        let bases: Vec<u64> = walker.by_ref().map(|r| r.base).collect();
        assert_eq!(bases, vec![0x10000, 0x30000]);
        assert!(walker.skipped() >= 2);
    }

    #[test]
    fn test_repeated_query_failures_end_walk() {
        let mock = MockMemory::new()
            .with_region(0x10000, vec![0; 0x1000])
            .with_unqueryable_range(0x11000, 0x100000)
            .with_region(0x200000, vec![0; 0x1000]);

        let mut walker = RegionWalker::over(&mock, 1);
        let bases: Vec<u64> = walker.by_ref().map(|r| r.base).collect();
        assert_eq!(bases, vec![0x10000]);
        assert_eq!(walker.skipped(), MAX_QUERY_FAILURES);
    }

    #[test]
    fn test_walk_bounded_range() {
        let mock = MockMemory::new()
            .with_region(0x10000, vec![0; 0x1000])
            .with_region(0x90000, vec![0; 0x1000]);

        let bases: Vec<u64> = RegionWalker::new(&mock, 0x10000, 0x80000, 1)
            .map(|r| r.base)
            .collect();
        assert_eq!(bases, vec![0x10000]);
    }
}
