pub mod atomic_write;
pub mod file_detection;
pub mod test_helpers;
