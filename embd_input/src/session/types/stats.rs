use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StepStats {
    pub duration: f64,
    pub positions_count: u64,
    pub model_runs_count: u64,
    pub positions_per_second: f64,
}

impl StepStats {
    pub fn new(
        duration: f64,
        positions_count: u64,
        model_runs_count: u64,
    ) -> Self {
        let positions_per_second = if duration > 0.0 {
            positions_count as f64 / duration
        } else {
            0.0
        };
        Self {
            duration,
            positions_count,
            model_runs_count,
            positions_per_second,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TotalStats {
    pub duration: f64,
    pub positions_count_input: u64,
    pub tokens_count_output: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Stats {
    pub prefill_stats: StepStats,
    pub generate_stats: Option<StepStats>,
    pub total_stats: TotalStats,
}
