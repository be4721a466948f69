pub mod completion;
pub mod kv;
