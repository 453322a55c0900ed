// Domain layer: table model, derived reports and ports. No I/O here.

pub mod export;
pub mod model;
pub mod ports;
pub mod report;
