pub const MAX_FRAMES: usize = 65_536;

pub const MIN_PRIORITY: u32 = 0;
pub const MAX_PRIORITY: u32 = 100;

pub const DEFAULT_FRAMES: usize = 3;
pub const DEFAULT_PAGES: usize = 8;
pub const DEFAULT_PAGE_SIZE: u64 = 512;
pub const DEFAULT_QUANTUM: u64 = 10;
