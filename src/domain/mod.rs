// Domain layer: market data models and ports (interfaces) implemented by adapters.

pub mod model;
pub mod ports;
