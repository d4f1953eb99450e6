pub mod grouper;
pub mod node;
pub mod provider;
