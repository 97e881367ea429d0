pub mod dataset;
pub mod frame;
pub mod results;
