pub mod analysis;
pub mod collector;
pub mod storage;
pub mod youtube;
