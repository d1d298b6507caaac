use crate::session::parameter::ConfigResolvableValue;

/// Number of positions a session may commit, resolved against the model's
/// own maximum.
#[derive(Debug, Clone, Copy)]
pub enum ContextLength {
    Default,
    Maximal,
    Custom(usize),
}

impl Default for ContextLength {
    fn default() -> Self {
        ContextLength::Default
    }
}

impl ConfigResolvableValue<usize, usize> for ContextLength {
    fn resolve(
        &self,
        model_context_length: &usize,
    ) -> usize {
        let proposed_value = match self {
            ContextLength::Default => 4096,
            ContextLength::Maximal => *model_context_length,
            ContextLength::Custom(value) => *value,
        };
        std::cmp::min(proposed_value, *model_context_length)
    }
}
