pub mod client;
pub mod ntp;
