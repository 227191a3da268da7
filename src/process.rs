use crate::error::{Error, Result};
use crate::pager::PagingConfig;
use crate::translation::PageAddress;

/// A single process of the synthetic workload.
///
/// The burst length is the length of the address trace: every time unit of
/// CPU burst references exactly one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadProcess {
    id: u32,
    arrival: u64,
    burst: u64,
    priority: u32,
    addresses: Vec<u64>,
}

impl WorkloadProcess {
    pub fn new(id: u32, arrival: u64, priority: u32, addresses: Vec<u64>) -> Result<Self> {
        if id == 0 {
            return Err(Error::InvalidConfig("process id must be positive".to_string()));
        }
        if addresses.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "process P_{} has an empty address trace (burst must be > 0)",
                id
            )));
        }
        let burst = u64::try_from(addresses.len()).map_err(|_| {
            Error::InvalidConfig(format!("address trace of P_{} is too long", id))
        })?;
        Ok(WorkloadProcess { id, arrival, burst, priority, addresses })
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn arrival(&self) -> u64 {
        self.arrival
    }

    /// CPU burst length in time units
    #[inline]
    pub fn burst(&self) -> u64 {
        self.burst
    }

    /// Lower value means higher priority
    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn addresses(&self) -> &[u64] {
        &self.addresses
    }

    /// Check every address of the trace against a paging configuration,
    /// returning the first one that does not fit.
    pub fn check_addresses(&self, config: &PagingConfig) -> Result<()> {
        for &address in &self.addresses {
            PageAddress::translate(address, config)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for WorkloadProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "P_{} (arrival={}, burst={}, priority={})",
            self.id,
            self.arrival,
            self.burst(),
            self.priority
        )
    }
}
