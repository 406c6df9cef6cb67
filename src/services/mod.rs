pub mod storage;
pub mod telegram;
pub mod weather;
