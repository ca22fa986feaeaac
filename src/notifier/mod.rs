mod engine;
mod runner;

pub use engine::{EngineSettings, NotifierEngine};
pub use runner::Runner;
