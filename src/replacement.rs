//! Victim selection for the page-replacement simulator.
//!
//! Each policy is a pure function over a *full* frame table: the pager only
//! asks for a victim once no free frame is left, so every frame is occupied
//! and frame 0 is always a valid starting candidate.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::Error;
use crate::memory::{FrameEntry, FrameTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionPolicy {
    /// Evict the page loaded longest ago
    #[default]
    Fifo,
    /// Evict the page referenced longest ago
    Lru,
    /// Evict the page with the most references since it was loaded
    Mfu,
    /// Evict a uniformly chosen frame
    Random,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicy::Fifo => "FIFO",
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Mfu => "MFU",
            EvictionPolicy::Random => "Random",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(EvictionPolicy::Fifo),
            "LRU" => Ok(EvictionPolicy::Lru),
            "MFU" => Ok(EvictionPolicy::Mfu),
            "RANDOM" => Ok(EvictionPolicy::Random),
            _ => Err(Error::InvalidConfig(format!(
                "{} is not a valid pager type {{FIFO|LRU|MFU|Random}}",
                s
            ))),
        }
    }
}

/// Frame whose page was loaded earliest. Load times are strictly increasing,
/// so there are no ties.
pub fn fifo_victim(table: &FrameTable) -> usize {
    select_min_by(table, |e| e.loaded_at)
}

/// Frame whose page has the oldest last access; ties go to the lowest index.
pub fn lru_victim(table: &FrameTable) -> usize {
    select_min_by(table, |e| e.last_access)
}

/// Frame whose page has the highest reference count; ties go to the lowest index.
pub fn mfu_victim(table: &FrameTable) -> usize {
    let mut victim = 0;
    for (idx, entry) in table.entries().iter().enumerate().skip(1) {
        if entry.references > table.entry(victim).references {
            victim = idx;
        }
    }
    victim
}

/// Uniformly chosen frame
pub fn random_victim<R: Rng + ?Sized>(table: &FrameTable, rng: &mut R) -> usize {
    rng.gen_range(0..table.num_frames())
}

fn select_min_by<F>(table: &FrameTable, key: F) -> usize
where
    F: Fn(&FrameEntry) -> u64,
{
    let mut victim = 0;
    for (idx, entry) in table.entries().iter().enumerate().skip(1) {
        // strict comparison keeps the lowest index on ties
        if key(entry) < key(table.entry(victim)) {
            victim = idx;
        }
    }
    victim
}
