//! Domain types: bars and price series.

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::PriceSeries;
