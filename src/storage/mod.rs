pub mod byte_store;
pub mod file_lock;
pub mod layout;
pub mod segment;
pub mod segment_writer;
pub mod segment_reader;
pub mod live_docs;
pub mod commit;
