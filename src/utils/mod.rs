pub mod process;
pub mod throttle;
