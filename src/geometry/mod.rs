// private sub-modules defined in other files
mod bounding_box;
mod point2d;
mod polygon;

// exports identifiers from private sub-modules in the current module namespace
pub use self::bounding_box::BoundingBox;
pub use self::point2d::Point2D;
pub use self::polygon::Polygon;
