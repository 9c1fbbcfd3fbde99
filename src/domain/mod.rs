pub mod activations;
pub mod errors;
pub mod models;
pub mod parser;
pub mod plot;
pub mod services;
pub mod vocabulary;

pub use activations::*;
pub use errors::*;
pub use models::*;
pub use plot::*;
pub use services::*;
pub use vocabulary::*;
