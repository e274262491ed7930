// Domain layer: records, upstream wire types and the store port.

pub mod model;
pub mod ports;
pub mod raw;
