// Domain layer: acquisition models and the ports the connector talks through.

pub mod model;
pub mod ports;
