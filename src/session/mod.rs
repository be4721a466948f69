pub mod answers;
pub mod controller;
pub mod result;
