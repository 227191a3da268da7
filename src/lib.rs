//! Simulation of two OS resource managers over a synthetic workload: a CPU
//! scheduler and a per-process page-replacement simulator.
//!
//! Both engines are pure functions of their inputs. Each paging simulation
//! owns its own frame table, so fault counts never carry over between
//! processes.

pub mod constants;
pub mod error;
pub mod memory;
pub mod pager;
pub mod process;
pub mod replacement;
pub mod scheduler;
pub mod translation;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{Error, Result};
pub use pager::{PageReplacementEngine, PagingConfig, PagingResult, Reference, ReferenceOutcome};
pub use process::WorkloadProcess;
pub use replacement::EvictionPolicy;
pub use scheduler::{
    CpuSchedulingEngine, Dispatch, SchedulePolicy, ScheduleRecord, ScheduleSummary, SchedulingConfig,
};
pub use translation::PageAddress;

/// Simulate one process's address trace against a fresh frame pool.
pub fn simulate_paging(addresses: &[u64], config: &PagingConfig) -> Result<PagingResult> {
    PageReplacementEngine::new(config.clone()).simulate(addresses)
}

/// Schedule a whole workload.
pub fn schedule_processes(
    processes: &[WorkloadProcess],
    config: &SchedulingConfig,
) -> Result<ScheduleSummary> {
    CpuSchedulingEngine::new(config.clone()).run(processes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload() -> Vec<WorkloadProcess> {
        // 4 pages of 512 bytes
        vec![
            WorkloadProcess::new(1, 0, 10, vec![0, 600, 1100, 20, 700]).unwrap(),
            WorkloadProcess::new(2, 1, 5, vec![1600, 1700, 0]).unwrap(),
        ]
    }

    #[test]
    fn test_driver_flow() {
        let processes = workload();

        let summary = schedule_processes(&processes, &SchedulingConfig::fcfs()).unwrap();
        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.average_waiting, 2.0);

        let paging = PagingConfig::new(2, 4, 512, EvictionPolicy::Fifo).unwrap();
        let faults: Vec<u64> = processes
            .iter()
            .map(|p| simulate_paging(p.addresses(), &paging).unwrap().fault_count)
            .collect();
        // pages 0 1 2 0 1 with 2 frames, then pages 3 3 0
        assert_eq!(faults, vec![5, 2]);
    }

    #[test]
    fn test_fault_counts_are_per_process() {
        let processes = workload();
        let paging = PagingConfig::new(2, 4, 512, EvictionPolicy::Lru).unwrap();

        let forward: Vec<u64> = processes
            .iter()
            .map(|p| simulate_paging(p.addresses(), &paging).unwrap().fault_count)
            .collect();
        let backward: Vec<u64> = processes
            .iter()
            .rev()
            .map(|p| simulate_paging(p.addresses(), &paging).unwrap().fault_count)
            .collect();

        assert_eq!(forward, backward.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_errors_are_typed() {
        let paging = PagingConfig::new(2, 4, 512, EvictionPolicy::Mfu).unwrap();
        assert!(matches!(
            simulate_paging(&[2048], &paging),
            Err(Error::AddressOutOfRange { .. })
        ));

        let rr_without_quantum = SchedulingConfig { quantum: None, ..SchedulingConfig::round_robin(1) };
        assert!(matches!(
            schedule_processes(&workload(), &rr_without_quantum),
            Err(Error::InvalidConfig(_))
        ));
    }
}
