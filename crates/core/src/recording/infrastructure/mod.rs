pub mod csv_tracking_log;
pub mod glyph_painter;
pub mod json_point_dump;
