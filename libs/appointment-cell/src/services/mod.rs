pub mod booking;
pub mod finalize;
pub mod lifecycle;
pub mod quota;
