pub mod discovery;
pub mod match_engine;
pub mod profile_service;
pub mod scoring;
pub mod thread_service;
