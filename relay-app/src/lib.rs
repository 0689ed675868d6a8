pub mod cli;
pub mod relay;

pub use relay::Relay;
