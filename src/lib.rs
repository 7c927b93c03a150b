//! Region segmentation engine for photographs.
//!
//! Splits an RGBA image into edge-aligned regions and supports
//! interactive selection over the result, producing binary projection
//! masks at source resolution.
//!
//! The pipeline:
//! - Grid marker seeding scaled by a detail level ([`grid`])
//! - Priority-flood watershed over a Sobel edge map ([`watershed`],
//!   [`gradient`])
//! - Coverage resolution so every pixel ends up labeled ([`coverage`])
//! - Region building with bounds, masks, average colors and an
//!   adjacency graph ([`region`])
//! - Small-region redistribution and optional color merging ([`merge`])
//! - Contour tracing and densification ([`contour`])
//! - Hit-testing, similarity selection and mask export ([`selection`])
//!
//! Entry point is [`segment_rgba`]; [`segment_with_edges`] accepts a
//! precomputed edge map. Large photos are downscaled for processing and
//! every [`Region`] carries the scale factor back to source coordinates.

pub mod contour;
pub mod coverage;
pub mod error;
pub mod gradient;
pub mod grid;
pub mod merge;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod selection;
pub mod watershed;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use contour::{densify_contour, rebuild_region_mask};
pub use error::{Result, SegmentError};
pub use pipeline::{segment_rgba, segment_with_edges, SegmentOptions};
pub use raster::{Rect, RasterBuffer};
pub use region::Region;
pub use selection::{
    create_mask, find_region_at_point, find_regions_in_radius, select_similar_regions,
};
