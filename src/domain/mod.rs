// Domain layer: entities produced by the importer and the persistence port they flow through.

pub mod model;
pub mod ports;
