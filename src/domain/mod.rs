// Domain layer: request/response models and the in-memory tabular dataset.

pub mod model;
