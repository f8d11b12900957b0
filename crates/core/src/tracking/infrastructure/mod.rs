pub mod log_replay_engine;
