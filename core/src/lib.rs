pub mod context;
pub mod error;
pub mod gate;
pub mod handoff;
pub mod identification;
pub mod message;
pub mod normalize;
pub mod session;
