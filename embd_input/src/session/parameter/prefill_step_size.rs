use crate::session::parameter::ConfigResolvableValue;

/// Largest number of positions sent to the model in one evaluation call.
#[derive(Debug, Clone, Copy)]
pub enum PrefillStepSize {
    Default,
    Maximal,
    Custom(usize),
}

impl Default for PrefillStepSize {
    fn default() -> Self {
        PrefillStepSize::Default
    }
}

impl ConfigResolvableValue<usize, usize> for PrefillStepSize {
    fn resolve(
        &self,
        context_length: &usize,
    ) -> usize {
        let default_limit: usize = 512;
        let maximal_value = std::cmp::max(*context_length, 1);

        let proposed_value = match self {
            PrefillStepSize::Default => default_limit,
            PrefillStepSize::Maximal => maximal_value,
            PrefillStepSize::Custom(value) => std::cmp::max(*value, 1),
        };
        std::cmp::min(proposed_value, maximal_value)
    }
}
