pub mod config;
pub mod pipeline;
pub mod pivot;
pub mod plot;
pub mod report;
pub mod table;
pub mod util;
