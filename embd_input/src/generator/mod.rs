mod cancellation;
mod generation;
mod state;

pub use cancellation::{CancellationHandle, CancellationToken};
pub use generation::Generation;
pub use state::GenerationState;
