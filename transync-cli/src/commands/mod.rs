pub mod catalog;
pub mod init;
pub mod slug;
pub mod sync;
