//! Region detection methods

use crate::input::RegionInput;
use scriptorium_common::{EdgeKind, PixelBox};
use std::fmt;

/// Undirected adjacency between two zones of one method, `a < b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjacency {
    pub a: usize,
    pub b: usize,
    pub kind: EdgeKind,
    pub weight: f64,
}

/// A named, parameterized way of cutting a page into zones
///
/// Zones are returned in a deterministic order; their position in that order
/// becomes the region index.
pub trait RegionMethod: fmt::Debug + Send + Sync {
    /// Method id, part of every region's identity
    fn id(&self) -> &'static str;

    /// Scale the zones were detected at
    fn scale(&self) -> u32;

    /// Canonical parameter string, distinguishing configurations of one method
    fn signature(&self) -> String;

    /// Zones found on the page
    fn zones(&self, input: &RegionInput<'_>) -> Vec<PixelBox>;

    /// Adjacency between the zones this method returned
    fn adjacency(&self, input: &RegionInput<'_>, zones: &[PixelBox]) -> Vec<Adjacency>;
}
