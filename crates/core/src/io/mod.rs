pub mod frame;
pub mod input;
