pub mod frame_painter;
pub mod overlay_plan;
pub mod point_dump;
pub mod tracking_log;
