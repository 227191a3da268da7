use std::collections::{BTreeMap, HashMap, VecDeque};

/// Bookkeeping for one physical frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEntry {
    pub page: Option<usize>,
    /// Time step at which the current page was loaded (FIFO)
    pub loaded_at: u64,
    /// Time step of the last reference to the current page (LRU)
    pub last_access: u64,
    /// References to the current page since it was loaded (MFU)
    pub references: u64,
}

impl FrameEntry {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.page.is_none()
    }
}

/// Tracks which frames are available for allocation, lowest index first
#[derive(Debug, Clone)]
pub struct FreeFrameList {
    free: VecDeque<usize>,
}

impl FreeFrameList {
    /// All frames `0..num_frames` start out free
    pub fn new(num_frames: usize) -> Self {
        FreeFrameList { free: (0..num_frames).collect() }
    }

    pub fn allocate(&mut self) -> Option<usize> {
        self.free.pop_front()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

/// Frame table owned by a single paging simulation.
///
/// Frames go `Free -> Occupied` on the first load and are only ever
/// re-occupied by eviction afterwards; nothing frees a frame again.
#[derive(Debug, Clone)]
pub struct FrameTable {
    frames: Vec<FrameEntry>,
    /// page -> frame for resident pages
    resident: HashMap<usize, usize>,
    ffl: FreeFrameList,
}

impl FrameTable {
    pub fn new(num_frames: usize) -> Self {
        FrameTable {
            frames: vec![FrameEntry::default(); num_frames],
            resident: HashMap::with_capacity(num_frames),
            ffl: FreeFrameList::new(num_frames),
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn entry(&self, frame: usize) -> &FrameEntry {
        &self.frames[frame]
    }

    pub fn entries(&self) -> &[FrameEntry] {
        &self.frames
    }

    /// Frame holding `page`, if resident
    #[inline]
    pub fn lookup(&self, page: usize) -> Option<usize> {
        self.resident.get(&page).copied()
    }

    /// Record a hit on `frame` at time `now`
    pub fn touch(&mut self, frame: usize, now: u64) {
        let entry = &mut self.frames[frame];
        entry.last_access = now;
        entry.references += 1;
    }

    pub fn allocate_free(&mut self) -> Option<usize> {
        self.ffl.allocate()
    }

    pub fn free_count(&self) -> usize {
        self.ffl.free_count()
    }

    /// Load `page` into `frame` at time `now`, returning the evicted page if
    /// the frame was occupied. Resets the frame's bookkeeping.
    pub fn load(&mut self, frame: usize, page: usize, now: u64) -> Option<usize> {
        let evicted = self.frames[frame].page;
        if let Some(old) = evicted {
            self.resident.remove(&old);
        }
        self.frames[frame] = FrameEntry {
            page: Some(page),
            loaded_at: now,
            last_access: now,
            references: 1,
        };
        self.resident.insert(page, frame);
        evicted
    }

    /// Final occupancy, frame index -> page
    pub fn snapshot(&self) -> BTreeMap<usize, usize> {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(idx, e)| e.page.map(|page| (idx, page)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_table_initialization() {
        let ft = FrameTable::new(4);
        assert_eq!(ft.num_frames(), 4);
        assert_eq!(ft.free_count(), 4);
        assert!(ft.entries().iter().all(FrameEntry::is_free));
        assert!(ft.snapshot().is_empty());
    }

    #[test]
    fn test_free_frames_lowest_first() {
        let mut ffl = FreeFrameList::new(3);
        assert_eq!(ffl.allocate(), Some(0));
        assert_eq!(ffl.allocate(), Some(1));
        assert_eq!(ffl.free_count(), 1);
        assert_eq!(ffl.allocate(), Some(2));
        assert_eq!(ffl.allocate(), None);
    }

    #[test]
    fn test_load_and_lookup() {
        let mut ft = FrameTable::new(2);
        let frame = ft.allocate_free().unwrap();
        assert_eq!(ft.load(frame, 5, 0), None);

        assert_eq!(ft.lookup(5), Some(0));
        assert_eq!(ft.lookup(6), None);

        let e = ft.entry(0);
        assert_eq!(e.page, Some(5));
        assert_eq!((e.loaded_at, e.last_access, e.references), (0, 0, 1));
    }

    #[test]
    fn test_touch_updates_bookkeeping() {
        let mut ft = FrameTable::new(1);
        ft.load(0, 3, 2);
        ft.touch(0, 7);
        ft.touch(0, 9);

        let e = ft.entry(0);
        assert_eq!(e.loaded_at, 2);
        assert_eq!(e.last_access, 9);
        assert_eq!(e.references, 3);
    }

    #[test]
    fn test_reload_resets_bookkeeping() {
        let mut ft = FrameTable::new(1);
        ft.load(0, 3, 0);
        ft.touch(0, 1);
        ft.touch(0, 2);

        // evict page 3 for page 4
        assert_eq!(ft.load(0, 4, 5), Some(3));
        assert_eq!(ft.lookup(3), None);
        assert_eq!(ft.lookup(4), Some(0));

        let e = ft.entry(0);
        assert_eq!((e.loaded_at, e.last_access, e.references), (5, 5, 1));
    }

    #[test]
    fn test_snapshot_skips_free_frames() {
        let mut ft = FrameTable::new(3);
        ft.load(0, 10, 0);
        ft.load(2, 30, 1);

        let snap = ft.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[&0], 10);
        assert_eq!(snap[&2], 30);
    }
}
