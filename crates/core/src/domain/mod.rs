pub mod plan;
pub mod quote;
pub mod selection;
