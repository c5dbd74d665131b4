pub mod forward;
pub mod v1;
