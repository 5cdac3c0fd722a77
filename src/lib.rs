mod client_management;
mod data_provider;
mod generic;

pub use client_management::*;
pub use data_provider::*;
pub use generic::*;
