pub mod point;
pub mod position;
pub mod session;
