pub mod pipeline;
pub mod recording;
pub mod shared;
pub mod telemetry;
pub mod tracking;
pub mod video;
