// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("pre_start hook failed: {0}")]
    PreStartHook(String),

    #[error("spawn failed: {0}")]
    Spawn(#[from] procwave_runner::RunnerError),

    #[error("readiness probe did not succeed before its deadline")]
    ProbeTimeout,

    #[error("readiness probe reported failure")]
    ProbeFailed,

    #[error("restart budget exhausted ({restart_count}/{max_retries})")]
    RestartBudgetExhausted { restart_count: u32, max_retries: u32 },
}
