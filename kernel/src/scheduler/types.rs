/*
 * Core Scheduler Types
 *
 * Small value types shared across the scheduler submodules: process
 * identifiers, the handle the heap and the per-CPU loop pass around,
 * process lifecycle states and the two selectable dispatch algorithms.
 */

use core::fmt;

/// Monotonically increasing process identifier, handed out by `process::alloc_pid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProcessId(pub usize);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable index into the process table.
///
/// The heap stores these, never the `Process` itself: the process table
/// owns every slot for the process's full lifetime, and the heap only
/// ever holds an alias into it.
pub type ProcHandle = usize;

/// Lifecycle states a process table slot can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Unused,
    Used,
    Sleeping,
    Runnable,
    Running,
    Zombie,
}

/// Selectable dispatch policy. The raw `u32` encoding (0/1) is what
/// `change_sched` and the `chsched` syscall speak; this enum is the
/// in-kernel representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Shortest-Job-First, ordered by the smoothed burst estimate.
    Sjf = 0,
    /// CFS-style fairness, ordered by cumulative execution time.
    Cfs = 1,
}

impl Algorithm {
    pub fn from_raw(v: i32) -> Option<Self> {
        match v {
            0 => Some(Algorithm::Sjf),
            1 => Some(Algorithm::Cfs),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

/// Identifies one logical CPU. Only `CpuId::BSP` is ever actually brought
/// up by this build; the constant exists so the per-CPU plumbing reads
/// the same whether or not the APs are parked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuId(pub u32);

impl CpuId {
    pub const BSP: CpuId = CpuId(0);

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}
