#[cfg(feature = "sea-orm")]
pub mod entity;
pub mod storage;
