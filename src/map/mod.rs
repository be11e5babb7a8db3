mod geometry;
pub mod projection;
pub mod renderer;
pub mod scale;
pub mod scene;
mod spatial;
pub mod style;
pub mod transform;

pub use projection::{ConicEqualArea, GeoPath, ProjectedPath, Projection, ProjectionConfig};
pub use renderer::{render, CanvasFit, MapLayers};
pub use scale::{build_scale, ScaleMapping};
pub use scene::{compute_rescale, BoundaryPath, PointGroup, Scene};
pub use style::{Level, LevelTable, Palette, Rgb, SceneStyle};
pub use transform::{ViewTransform, ZoomConfig};
