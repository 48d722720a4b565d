pub mod init;
pub mod reset;
pub mod seed;
pub mod stats;
pub mod videos;
