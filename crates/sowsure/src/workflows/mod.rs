pub mod assessment;
pub mod batch;
pub mod location;
