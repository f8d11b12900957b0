pub mod clock;
pub mod pacer;
pub mod pipeline_logger;
pub mod source_supervisor;
pub mod stream_faces_use_case;
