// Domain layer: core models and ports (interfaces). No dependencies on parsers or the engine.

pub mod model;
pub mod ports;
