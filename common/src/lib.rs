pub mod shapes;

pub use shapes::{contains, overlaps, split, BBox};
