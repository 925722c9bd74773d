/*!
 * Wait Configuration
 *
 * Runtime configuration for pause-strategy selection
 */

use crate::error::{WaitError, WaitResult};
use crate::limits::{DEFAULT_SPIN_ITERATIONS, MAX_SPIN_ITERATIONS};
use crate::pause::{Park, Pause, Spin, SpinThenPark};

/// Pause strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    /// Pure busy-wait (lowest latency, highest CPU)
    Spin,
    /// Always park (lowest CPU, highest wake latency)
    Park,
    /// Spin briefly, then park
    SpinThenPark,
    /// Auto-select based on available parallelism
    Auto,
}

/// Wait-queue construction configuration
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Preferred pause strategy
    pub pause: PauseKind,
    /// Spin iterations before parking (SpinThenPark only)
    pub spin_iterations: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            pause: PauseKind::SpinThenPark,
            spin_iterations: DEFAULT_SPIN_ITERATIONS,
        }
    }
}

impl WaitConfig {
    /// Configuration optimized for very short expected waits
    pub const fn low_latency() -> Self {
        Self {
            pause: PauseKind::SpinThenPark,
            spin_iterations: 4 * DEFAULT_SPIN_ITERATIONS,
        }
    }

    /// Configuration optimized for waits expected to outlast a scheduler
    /// quantum
    pub const fn long_wait() -> Self {
        Self {
            pause: PauseKind::Park,
            spin_iterations: 0,
        }
    }

    /// Reject malformed configurations before any queue is built
    pub fn validate(&self) -> WaitResult<()> {
        if self.spin_iterations > MAX_SPIN_ITERATIONS {
            return Err(WaitError::SpinBudgetTooLarge(self.spin_iterations));
        }
        Ok(())
    }

    /// Resolve `Auto` for the current host. Spinning is pure waste on a
    /// single hardware thread: the waker cannot run until the spinner
    /// yields, so park immediately there.
    pub fn select_kind(&self) -> PauseKind {
        match self.pause {
            PauseKind::Auto => match std::thread::available_parallelism() {
                Ok(n) if n.get() > 1 => PauseKind::SpinThenPark,
                Ok(_) => PauseKind::Park,
                Err(err) => {
                    log::warn!("failed to detect available parallelism ({err}), assuming multi-core");
                    PauseKind::SpinThenPark
                }
            },
            other => other,
        }
    }

    /// Validate and build the runtime-dispatched strategy
    pub fn build(&self) -> WaitResult<Pause> {
        self.validate()?;
        Ok(match self.select_kind() {
            PauseKind::Spin => Pause::Spin(Spin),
            PauseKind::Park => Pause::Park(Park),
            PauseKind::SpinThenPark | PauseKind::Auto => {
                Pause::SpinThenPark(SpinThenPark::new(self.spin_iterations))
            }
        })
    }
}
