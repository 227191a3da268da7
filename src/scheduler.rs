//! CPU scheduling engine.
//!
//! All policies run through one discrete-event loop. A policy only decides
//! three things: how the ready set is ordered, whether a ready process may
//! preempt the running one, and whether dispatches are cut into quanta.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use log::{debug, trace};

use crate::constants::*;
use crate::error::{Error, Result};
use crate::process::WorkloadProcess;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchedulePolicy {
    /// First come, first served
    #[default]
    Fcfs,
    /// Shortest (remaining) job first
    Sjf,
    /// Lowest priority value first
    Priority,
    /// Round robin with a fixed quantum
    RoundRobin,
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulePolicy::Fcfs => "FCFS",
            SchedulePolicy::Sjf => "SJF",
            SchedulePolicy::Priority => "Priority",
            SchedulePolicy::RoundRobin => "RR",
        };
        f.write_str(name)
    }
}

impl FromStr for SchedulePolicy {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FCFS" => Ok(SchedulePolicy::Fcfs),
            "SJF" => Ok(SchedulePolicy::Sjf),
            "PRIORITY" => Ok(SchedulePolicy::Priority),
            "RR" => Ok(SchedulePolicy::RoundRobin),
            _ => Err(Error::InvalidConfig(format!(
                "{} is not a valid scheduler type {{FCFS|SJF|Priority|RR}}",
                s
            ))),
        }
    }
}

/// Scheduling parameters, checked by `validate` before every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub policy: SchedulePolicy,
    pub preemptive: bool,
    /// Required for RR, forbidden otherwise
    pub quantum: Option<u64>,
    /// Highest accepted priority value (inclusive)
    pub max_priority: u32,
}

impl SchedulingConfig {
    pub fn fcfs() -> Self {
        SchedulingConfig {
            policy: SchedulePolicy::Fcfs,
            preemptive: false,
            quantum: None,
            max_priority: MAX_PRIORITY,
        }
    }

    pub fn sjf(preemptive: bool) -> Self {
        SchedulingConfig { policy: SchedulePolicy::Sjf, preemptive, ..Self::fcfs() }
    }

    pub fn priority(preemptive: bool) -> Self {
        SchedulingConfig { policy: SchedulePolicy::Priority, preemptive, ..Self::fcfs() }
    }

    pub fn round_robin(quantum: u64) -> Self {
        SchedulingConfig {
            policy: SchedulePolicy::RoundRobin,
            preemptive: true,
            quantum: Some(quantum),
            ..Self::fcfs()
        }
    }

    pub fn with_max_priority(mut self, max_priority: u32) -> Self {
        self.max_priority = max_priority;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match (self.policy, self.quantum) {
            (SchedulePolicy::RoundRobin, None) => {
                return Err(Error::InvalidConfig("RR requires a quantum".to_string()));
            }
            (SchedulePolicy::RoundRobin, Some(0)) => {
                return Err(Error::InvalidConfig("quantum must be a positive integer".to_string()));
            }
            (SchedulePolicy::RoundRobin, Some(_)) => {}
            (policy, Some(_)) => {
                return Err(Error::InvalidConfig(format!(
                    "only RR takes a quantum, {} does not",
                    policy
                )));
            }
            (_, None) => {}
        }
        match self.policy {
            SchedulePolicy::Fcfs if self.preemptive => {
                Err(Error::InvalidConfig("FCFS cannot be preemptive".to_string()))
            }
            SchedulePolicy::RoundRobin if !self.preemptive => {
                Err(Error::InvalidConfig("RR must be preemptive".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self::fcfs()
    }
}

/// One contiguous stretch of CPU time given to a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub pid: u32,
    pub start: u64,
    pub duration: u64,
}

impl Dispatch {
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleRecord {
    pub pid: u32,
    pub arrival: u64,
    pub burst: u64,
    pub completion: u64,
    /// completion - arrival - burst
    pub waiting: u64,
    /// completion - arrival
    pub turnaround: u64,
    /// first dispatch - arrival
    pub response: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    /// Per-process records, in input order
    pub records: Vec<ScheduleRecord>,
    /// Every dispatch interval, chronologically
    pub trace: Vec<Dispatch>,
    pub average_waiting: f64,
    pub average_turnaround: f64,
    /// last completion - first arrival
    pub makespan: u64,
    /// Time the CPU sat idle between the first arrival and the last completion
    pub idle_time: u64,
}

impl ScheduleSummary {
    fn empty() -> Self {
        ScheduleSummary {
            records: Vec::new(),
            trace: Vec::new(),
            average_waiting: 0.0,
            average_turnaround: 0.0,
            makespan: 0,
            idle_time: 0,
        }
    }

    pub fn record(&self, pid: u32) -> Option<&ScheduleRecord> {
        self.records.iter().find(|r| r.pid == pid)
    }

    pub fn total_waiting(&self) -> u64 {
        self.records.iter().map(|r| r.waiting).sum()
    }

    pub fn dispatch_count(&self) -> usize {
        self.trace.len()
    }
}

/// Ready set: arrival-ordered queue for RR, keyed selection otherwise
#[derive(Debug)]
enum ReadySet {
    Fifo(VecDeque<usize>),
    Keyed(Vec<usize>),
}

/// (primary, arrival, id). Only the primary component decides preemption.
type OrderKey = (u64, u64, u32);

fn order_key(policy: SchedulePolicy, process: &WorkloadProcess, remaining: u64) -> OrderKey {
    let primary = match policy {
        SchedulePolicy::Sjf => remaining,
        SchedulePolicy::Priority => process.priority() as u64,
        SchedulePolicy::Fcfs | SchedulePolicy::RoundRobin => process.arrival(),
    };
    (primary, process.arrival(), process.id())
}

/// State of a single scheduling run
struct Run<'a> {
    processes: &'a [WorkloadProcess],
    policy: SchedulePolicy,
    preemptive: bool,
    quantum: Option<u64>,

    /// Not yet arrived, by (arrival, id)
    pending: VecDeque<usize>,
    ready: ReadySet,
    remaining: Vec<u64>,
    first_start: Vec<Option<u64>>,
    completion: Vec<u64>,
    trace: Vec<Dispatch>,
    clock: u64,
    idle: u64,
}

impl<'a> Run<'a> {
    fn new(processes: &'a [WorkloadProcess], config: &SchedulingConfig) -> Self {
        let mut pending: Vec<usize> = (0..processes.len()).collect();
        pending.sort_by_key(|&i| (processes[i].arrival(), processes[i].id()));
        let clock = pending.first().map_or(0, |&i| processes[i].arrival());

        let ready = match config.policy {
            SchedulePolicy::RoundRobin => ReadySet::Fifo(VecDeque::new()),
            _ => ReadySet::Keyed(Vec::new()),
        };

        Run {
            processes,
            policy: config.policy,
            // preemption by ordering key only; RR preempts through the quantum
            preemptive: config.preemptive && config.policy != SchedulePolicy::RoundRobin,
            quantum: config.quantum,
            pending: pending.into(),
            ready,
            remaining: processes.iter().map(WorkloadProcess::burst).collect(),
            first_start: vec![None; processes.len()],
            completion: vec![0; processes.len()],
            trace: Vec::new(),
            clock,
            idle: 0,
        }
    }

    fn key(&self, idx: usize) -> OrderKey {
        order_key(self.policy, &self.processes[idx], self.remaining[idx])
    }

    /// Move every process that has arrived by `clock` into the ready set
    fn admit(&mut self) {
        while let Some(&idx) = self.pending.front() {
            if self.processes[idx].arrival() > self.clock {
                break;
            }
            self.pending.pop_front();
            self.push_ready(idx);
        }
    }

    fn push_ready(&mut self, idx: usize) {
        match &mut self.ready {
            ReadySet::Fifo(queue) => queue.push_back(idx),
            ReadySet::Keyed(set) => set.push(idx),
        }
    }

    fn pop_ready(&mut self) -> Option<usize> {
        match &mut self.ready {
            ReadySet::Fifo(queue) => queue.pop_front(),
            ReadySet::Keyed(set) => {
                let pos = (0..set.len()).min_by_key(|&pos| {
                    let idx = set[pos];
                    order_key(self.policy, &self.processes[idx], self.remaining[idx])
                })?;
                Some(set.swap_remove(pos))
            }
        }
    }

    /// Whether some ready process strictly beats `running` on the primary key
    fn should_preempt(&self, running: usize) -> bool {
        let ReadySet::Keyed(set) = &self.ready else {
            return false;
        };
        let current = self.key(running).0;
        set.iter().any(|&idx| self.key(idx).0 < current)
    }

    fn close_slice(&mut self, idx: usize, start: u64) {
        let dispatch = Dispatch {
            pid: self.processes[idx].id(),
            start,
            duration: self.clock - start,
        };
        trace!("dispatch P_{} at {} for {}", dispatch.pid, dispatch.start, dispatch.duration);
        self.trace.push(dispatch);
    }

    fn execute(mut self) -> ScheduleSummary {
        let total = self.processes.len();
        let mut done = 0;
        // (process index, start of its current dispatch)
        let mut running: Option<(usize, u64)> = None;

        while done < total {
            self.admit();

            let (idx, start) = match running.take() {
                Some(slice) => slice,
                None => match self.pop_ready() {
                    Some(idx) => {
                        if self.first_start[idx].is_none() {
                            self.first_start[idx] = Some(self.clock);
                        }
                        (idx, self.clock)
                    }
                    None => {
                        // nothing ready: jump to the next arrival
                        let Some(&next) = self.pending.front() else {
                            break;
                        };
                        let next_arrival = self.processes[next].arrival();
                        self.idle += next_arrival - self.clock;
                        self.clock = next_arrival;
                        continue;
                    }
                },
            };

            if self.preemptive && self.should_preempt(idx) {
                self.close_slice(idx, start);
                self.push_ready(idx);
                continue;
            }

            let mut until = self.clock + self.remaining[idx];
            if let Some(quantum) = self.quantum {
                until = until.min(start.saturating_add(quantum));
            }
            if self.preemptive {
                if let Some(&next) = self.pending.front() {
                    until = until.min(self.processes[next].arrival());
                }
            }

            self.remaining[idx] -= until - self.clock;
            self.clock = until;

            if self.remaining[idx] == 0 {
                self.completion[idx] = self.clock;
                self.close_slice(idx, start);
                done += 1;
            } else if self.quantum.is_some_and(|q| self.clock - start >= q) {
                // arrivals during the slice queue up ahead of the preempted process
                self.admit();
                self.close_slice(idx, start);
                self.push_ready(idx);
            } else {
                running = Some((idx, start));
            }
        }

        self.summarize()
    }

    fn summarize(self) -> ScheduleSummary {
        let records: Vec<ScheduleRecord> = self
            .processes
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let completion = self.completion[idx];
                let turnaround = completion - p.arrival();
                ScheduleRecord {
                    pid: p.id(),
                    arrival: p.arrival(),
                    burst: p.burst(),
                    completion,
                    waiting: turnaround - p.burst(),
                    turnaround,
                    response: self.first_start[idx].unwrap_or(completion) - p.arrival(),
                }
            })
            .collect();

        let n = records.len() as f64;
        let first_arrival = records.iter().map(|r| r.arrival).min().unwrap_or(0);
        let last_completion = records.iter().map(|r| r.completion).max().unwrap_or(0);

        ScheduleSummary {
            average_waiting: records.iter().map(|r| r.waiting as f64).sum::<f64>() / n,
            average_turnaround: records.iter().map(|r| r.turnaround as f64).sum::<f64>() / n,
            makespan: last_completion - first_arrival,
            idle_time: self.idle,
            trace: self.trace,
            records,
        }
    }
}

/// CPU scheduler over a whole workload
#[derive(Debug, Clone)]
pub struct CpuSchedulingEngine {
    config: SchedulingConfig,
}

impl CpuSchedulingEngine {
    pub fn new(config: SchedulingConfig) -> Self {
        CpuSchedulingEngine { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn run(&self, processes: &[WorkloadProcess]) -> Result<ScheduleSummary> {
        self.config.validate()?;
        self.validate_workload(processes)?;

        if processes.is_empty() {
            return Ok(ScheduleSummary::empty());
        }

        let summary = Run::new(processes, &self.config).execute();
        debug!(
            "{}{} scheduled {} processes in {} dispatches: avg wait {:.2}, avg turnaround {:.2}",
            self.config.policy,
            if self.config.preemptive { " (preemptive)" } else { "" },
            processes.len(),
            summary.dispatch_count(),
            summary.average_waiting,
            summary.average_turnaround
        );
        Ok(summary)
    }

    fn validate_workload(&self, processes: &[WorkloadProcess]) -> Result<()> {
        // every completion time is bounded by the latest arrival plus all bursts
        let total_burst = processes
            .iter()
            .try_fold(0u64, |acc, p| acc.checked_add(p.burst()))
            .ok_or_else(|| Error::InvalidConfig("total burst length overflows the clock".to_string()))?;

        let mut seen = HashSet::with_capacity(processes.len());
        for p in processes {
            if !seen.insert(p.id()) {
                return Err(Error::InvalidConfig(format!("process id P_{} is not unique", p.id())));
            }
            if p.priority() > self.config.max_priority {
                return Err(Error::InvalidConfig(format!(
                    "priority of P_{} must be an integer from {} to {}, got {}",
                    p.id(),
                    MIN_PRIORITY,
                    self.config.max_priority,
                    p.priority()
                )));
            }
            if p.arrival().checked_add(total_burst).is_none() {
                return Err(Error::InvalidConfig(format!(
                    "arrival {} of P_{} leaves no room for {} time units of burst",
                    p.arrival(),
                    p.id(),
                    total_burst
                )));
            }
        }
        Ok(())
    }
}
