use serde::Deserialize;

/// The `output` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputArgs {
    pub optimization: OptimizationOutputArgs,
}

/// The `output.optimization` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationOutputArgs {
    pub save_frequency: usize,
}

impl Default for OptimizationOutputArgs {
    fn default() -> Self {
        Self { save_frequency: 1 }
    }
}
