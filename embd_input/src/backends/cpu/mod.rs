mod reference_model;

pub use reference_model::{ReferenceModel, ReferenceModelConfig};
