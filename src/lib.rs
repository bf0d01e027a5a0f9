pub mod diagram;
pub mod text;
pub mod theme;

pub use diagram::{
    Communication, Diagram, DiagramOptions, LayoutError, RequestData, layout, render_svg,
};
pub use theme::Palette;
