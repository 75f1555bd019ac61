pub mod bezier;
pub mod hit_testing;

pub use bezier::{eval_cubic, split_cubic, CubicSplit, CURVE_STEPS};
pub use hit_testing::{point_on_line, rotate_about};
