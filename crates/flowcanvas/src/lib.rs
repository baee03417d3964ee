pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod hit;
pub mod interaction;
pub mod layout;
pub mod lock;
pub mod minimap;
pub mod model;
pub mod route;
pub mod store;
pub mod viewport;

pub use config::{CanvasConfig, CardMetrics, LayoutConfig, MinimapConfig, SliderRange, ZoomBounds};
pub use document::Document;
pub use error::GraphError;
pub use geometry::{Point, Rect, Size};
pub use hit::HitTarget;
pub use interaction::{
    ContextMenu, ContextTarget, DragMode, InputEvent, Interaction, Outcome, PointerButton,
    PointerKind, Selection,
};
pub use minimap::MinimapProjection;
pub use model::{
    Attachment, AttachmentKind, Edge, EdgeId, Group, GroupId, Insight, KindInfo, Node, NodeData,
    NodeId, NodeKind,
};
pub use route::{CubicPath, Route, WireStatus};
pub use store::{Batch, GraphStore, SizeLimits, StoreEvent};
pub use viewport::Viewport;
