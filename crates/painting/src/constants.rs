/// Largest canvas edge we agree to allocate.
pub const MAX_CANVAS_SIZE: u32 = 4096;

/// Smallest radius (UV units) a stroke may carry once mapped.
pub const MIN_STROKE_RADIUS_UV: f32 = 1e-5;

/// Hardness values at or above this produce a pure hard edge.
pub const HARD_EDGE_THRESHOLD: f32 = 0.999;
