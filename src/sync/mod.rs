pub mod policy;
pub mod preview;
