#![warn(clippy::all, rust_2018_idioms)]

pub mod annotation;
pub mod clipboard;
pub mod command;
pub mod compositor;
pub mod error;
pub mod external;
pub mod geometry;
pub mod session;
pub mod shape;
pub mod source;
pub mod view;

pub use annotation::{AnnotationSet, ShapeId};
pub use clipboard::Clipboard;
pub use command::{CommandHistory, EditCommand};
pub use compositor::{FloatImage, GradingTable, RegionIndexMask, RemovePreview};
pub use error::{AlgorithmError, LoadError};
pub use external::{CradleRemoval, MarkedSegments, TextureRemoval};
pub use session::{EditSession, ToolProfile, Verb};
pub use shape::{ControlPoint, Handle, Shape, ShapeKind};
pub use source::{ImageLoader, PyramidSource, TileSource};
pub use view::ViewTransform;
