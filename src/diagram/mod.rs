mod layout;
mod model;
mod render;

pub use layout::{
    AnnotationKind, Arrow, ArrowLabel, Banner, BannerLine, CrossMark, Diagram, EndpointHeader,
    IndexBadge, LayoutError, Loopback, Row, RowBody, TimestampLabel, layout, order_communications,
};
pub use model::{
    Annotation, Communication, DiagramOptions, Endpoint, RequestData, parse_request_data,
};
pub use render::render_svg;
