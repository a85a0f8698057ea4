pub mod annotation;
pub mod args;
pub mod canvas;
pub mod complex;
pub mod error;
pub mod function;
pub mod newton;
pub mod quadratic;
pub mod registry;
pub mod sample;
pub mod viewport;

// Re-export primary types for convenience.
pub use annotation::{Annotation, AnnotationOp, Annotations};
pub use args::{Arg, ArgValue, Args};
pub use canvas::{Canvas, PixelSink};
pub use complex::Complex;
pub use error::CoreError;
pub use function::{orbit_trace, IterationFunction, Space, ORBIT_ESCAPE_RADIUS};
pub use newton::Newton;
pub use quadratic::Quadratic;
pub use registry::FunctionRegistry;
pub use sample::{Sample, COLOR_TAG, ERROR_COLOR};
pub use viewport::{PlaneRect, Viewport};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
