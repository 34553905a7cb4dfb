pub mod aggregate;
pub mod readings_frame;
