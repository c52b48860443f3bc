pub mod browser;
pub mod log;
pub mod playback;
pub mod queue;
