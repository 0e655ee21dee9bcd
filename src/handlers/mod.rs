pub mod info;
pub mod status;
