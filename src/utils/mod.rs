pub mod file_detection;
#[cfg(any(test, feature = "test-helpers"))]
pub mod in_memory_host;
pub mod test_helpers;
