pub mod resolver;
pub mod validation;

pub use resolver::resolve;
pub use validation::ValidationError;
