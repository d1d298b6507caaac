mod run;

pub use run::{RunArgs, handle_run};
