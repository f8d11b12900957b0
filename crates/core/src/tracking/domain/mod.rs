pub mod eye_state;
pub mod symmetrizer;
pub mod tracking_engine;
