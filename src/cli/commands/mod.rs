pub mod index;
pub mod init;
pub mod retrieve;
