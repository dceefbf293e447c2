pub mod geometry;
pub mod process;
pub mod storage;
pub mod window_server;
