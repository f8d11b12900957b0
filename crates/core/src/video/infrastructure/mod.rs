pub mod capture_factory;
pub mod ffmpeg_frame_source;
pub mod ffmpeg_writer;
pub mod raw_rgb_frame_source;
