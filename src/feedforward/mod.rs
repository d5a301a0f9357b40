//! Fully-connected feedforward networks: model, initialization, forward execution and
//! backpropagation-based gradient descent training

mod activation;
mod executer;
mod initializer;
mod net;
mod trainer;

pub use activation::*;
pub use executer::*;
pub use initializer::*;
pub use net::*;
pub use trainer::*;
