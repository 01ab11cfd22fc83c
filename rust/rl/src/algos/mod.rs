pub mod mbased;
pub mod model_free;
