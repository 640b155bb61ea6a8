pub mod bounding_box;
pub mod chromosome_class;
pub mod detection;
