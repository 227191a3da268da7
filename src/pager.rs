use std::collections::BTreeMap;

use log::{debug, trace};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::memory::FrameTable;
use crate::replacement::{self, EvictionPolicy};
use crate::translation::translate_trace;

/// Global paging parameters. Always valid once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingConfig {
    frames: usize,
    pages: usize,
    page_size: u64,
    policy: EvictionPolicy,
    seed: Option<u64>,
}

impl PagingConfig {
    pub fn new(frames: usize, pages: usize, page_size: u64, policy: EvictionPolicy) -> Result<Self> {
        if frames == 0 || frames > MAX_FRAMES {
            return Err(Error::InvalidConfig(format!(
                "frames must be between 1 and {}, got {}",
                MAX_FRAMES, frames
            )));
        }
        if pages == 0 {
            return Err(Error::InvalidConfig("pages must be a positive integer".to_string()));
        }
        if !page_size.is_power_of_two() {
            return Err(Error::InvalidConfig(format!(
                "page size must be a positive power of two, got {}",
                page_size
            )));
        }
        Ok(PagingConfig { frames, pages, page_size, policy, seed: None })
    }

    /// Fix the seed of the Random policy. Ignored by the other policies.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn pages(&self) -> usize {
        self.pages
    }

    #[inline]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    #[inline]
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        PagingConfig {
            frames: DEFAULT_FRAMES,
            pages: DEFAULT_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
            policy: EvictionPolicy::default(),
            seed: None,
        }
    }
}

/// What happened to a single memory reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOutcome {
    Hit { frame: usize },
    Fault { frame: usize, evicted: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub address: u64,
    pub page: usize,
    pub outcome: ReferenceOutcome,
}

impl Reference {
    pub fn is_fault(&self) -> bool {
        matches!(self.outcome, ReferenceOutcome::Fault { .. })
    }
}

/// Result of simulating one address trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingResult {
    pub fault_count: u64,
    pub hit_count: u64,
    pub eviction_count: u64,
    /// frame index -> resident page when the trace ended
    pub final_frames: BTreeMap<usize, usize>,
    /// One entry per referenced address, in order
    pub references: Vec<Reference>,
}

impl PagingResult {
    /// Resident pages in frame order
    pub fn resident_pages(&self) -> Vec<usize> {
        self.final_frames.values().copied().collect()
    }
}

/// Page-replacement simulator.
///
/// Holds only the immutable configuration; every call to `simulate` builds a
/// fresh frame table and fault counter, so results of different traces never
/// accumulate.
#[derive(Debug, Clone)]
pub struct PageReplacementEngine {
    config: PagingConfig,
}

impl PageReplacementEngine {
    pub fn new(config: PagingConfig) -> Self {
        PageReplacementEngine { config }
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    pub fn simulate(&self, addresses: &[u64]) -> Result<PagingResult> {
        let config = &self.config;
        let trace = translate_trace(addresses, config)?;

        let mut table = FrameTable::new(config.frames());
        // only the Random policy draws from it
        let mut rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut result = PagingResult {
            fault_count: 0,
            hit_count: 0,
            eviction_count: 0,
            final_frames: BTreeMap::new(),
            references: Vec::with_capacity(trace.len()),
        };

        for (now, pa) in trace.iter().enumerate() {
            let now = now as u64;
            let page = pa.page_index();

            let outcome = if let Some(frame) = table.lookup(page) {
                if matches!(config.policy(), EvictionPolicy::Lru | EvictionPolicy::Mfu) {
                    table.touch(frame, now);
                }
                result.hit_count += 1;
                ReferenceOutcome::Hit { frame }
            } else {
                result.fault_count += 1;
                let frame = match table.allocate_free() {
                    Some(frame) => frame,
                    None => match config.policy() {
                        EvictionPolicy::Fifo => replacement::fifo_victim(&table),
                        EvictionPolicy::Lru => replacement::lru_victim(&table),
                        EvictionPolicy::Mfu => replacement::mfu_victim(&table),
                        EvictionPolicy::Random => replacement::random_victim(&table, &mut rng),
                    },
                };
                let evicted = table.load(frame, page, now);
                if let Some(old) = evicted {
                    result.eviction_count += 1;
                    trace!("t={} page {} evicted from frame {} for page {}", now, old, frame, page);
                } else {
                    trace!("t={} page {} loaded into free frame {}", now, page, frame);
                }
                ReferenceOutcome::Fault { frame, evicted }
            };

            result.references.push(Reference { address: pa.address, page, outcome });
        }

        result.final_frames = table.snapshot();
        debug!(
            "{} paging: {} references, {} faults, {} evictions",
            config.policy(),
            trace.len(),
            result.fault_count,
            result.eviction_count
        );
        Ok(result)
    }
}
