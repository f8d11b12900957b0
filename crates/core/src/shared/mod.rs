pub mod constants;
pub mod face_result;
pub mod frame;
pub mod frame_stamp;
pub mod record_layout;
pub mod video_metadata;
