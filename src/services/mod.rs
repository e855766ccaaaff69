pub mod actions;
pub mod ai;
pub mod alarm;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod media;
pub mod navigation;
pub mod parser;
pub mod progress;
pub mod routine;
pub mod scheduling;
pub mod spatial;
