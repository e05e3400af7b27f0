mod activation;
mod connection;
mod conv;
mod error;
mod layer;
mod linear;
mod network;
mod norm;
mod pool;
mod shape;
mod structural;

pub use activation::*;
pub use connection::*;
pub use conv::*;
pub use error::*;
pub use layer::*;
pub use linear::*;
pub use network::*;
pub use norm::*;
pub use pool::*;
pub use shape::*;
pub use structural::*;
