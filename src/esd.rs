pub mod accept;
pub mod aggregate;
pub mod partition;
pub mod pipeline;
pub mod split;
