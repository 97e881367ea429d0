pub mod cli;
pub mod config;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod plot;
pub mod report;
pub mod stats;
pub mod tools;

pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::model::dataset::{Dataset, Factor};
    pub use crate::model::results::StatResult;
    pub use crate::pipeline::stage1_load::AnalysisCtx;
}
