pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod stages;
pub mod unit;
pub mod writer;

pub use config::{DebugOptions, LogFormat, PipelineOptions};
pub use error::{PipelineDiagnostics, PipelineError};
pub use logging::init_logging;
pub use pipeline::{Pipeline, PipelineBuilder, PipelineStage};
pub use stages::{compile, AggregateStage, EmitStage, ResolveStage};
pub use unit::{AggregatedUnit, CompilationUnit, ResolvedUnit};
pub use writer::WriteModules;

pub use dt_emit::{EmitOptions, EmittedModules};
