pub mod analysis;
pub mod series;
pub mod stock;

pub use analysis::*;
pub use series::*;
pub use stock::*;
