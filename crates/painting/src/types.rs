use serde::{Deserialize, Serialize};

/// Identifies one paintable surface (and its canvas)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// When prepared strokes reach the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Composite inside the paint call
    #[default]
    Immediate,
    /// Queue per surface and composite on the next render-tick flush
    Deferred,
}

