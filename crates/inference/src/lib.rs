pub mod backends;
pub mod model;

pub use backends::forest::ForestModel;
pub use backends::linear::LinearModel;
pub use model::{load_model, ModelArtifact};
