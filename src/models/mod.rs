pub mod forecast;
pub mod location;
pub mod recommendation;
pub mod soil;
pub mod weather;
pub mod yield_series;

pub use forecast::*;
pub use location::*;
pub use recommendation::*;
pub use soil::*;
pub use weather::*;
pub use yield_series::*;
