//! Map presentation boundary.
//!
//! The navigation core never renders anything itself. It issues declarative
//! operations through [`MapAdapter`], addressing every drawn feature by a
//! stable [`FeatureKey`]. Single-instance features (the live position marker,
//! the hover preview, the active route line) use fixed keys so an upsert
//! replaces the previous feature instead of adding a duplicate.
//!
//! [`FeatureTable`] is an in-memory adapter that records the resulting scene.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::location::Coordinates;

/// Category tag carried by every drawn feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    /// Start/end marker of the active route.
    Marker,
    /// Transient hover line for a candidate route.
    Preview,
    /// Line of the confirmed route.
    RouteLine,
    /// Reference marker for a campus location.
    AccessibilityMarker,
    /// Live device position.
    UserLocation,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Marker => "marker",
            FeatureKind::Preview => "preview",
            FeatureKind::RouteLine => "route-line",
            FeatureKind::AccessibilityMarker => "accessibility-marker",
            FeatureKind::UserLocation => "user-location",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a drawn feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FeatureKey {
    pub kind: FeatureKind,
    pub id: u32,
}

impl FeatureKey {
    pub const USER_LOCATION: FeatureKey = FeatureKey::new(FeatureKind::UserLocation, 0);
    pub const PREVIEW: FeatureKey = FeatureKey::new(FeatureKind::Preview, 0);
    pub const ROUTE_LINE: FeatureKey = FeatureKey::new(FeatureKind::RouteLine, 0);
    pub const START_MARKER: FeatureKey = FeatureKey::new(FeatureKind::Marker, 0);
    pub const END_MARKER: FeatureKey = FeatureKey::new(FeatureKind::Marker, 1);

    pub const fn new(kind: FeatureKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn accessibility(id: u32) -> Self {
        Self::new(FeatureKind::AccessibilityMarker, id)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// Icon used for a point feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointStyle {
    AccessibilityIcon,
    UserLocation,
    Start,
    End,
}

/// Stroke used for a line feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f32,
    pub dash: Option<[f32; 2]>,
}

impl LineStyle {
    /// Solid stroke for a walking route.
    pub const WALKING: LineStyle = LineStyle {
        color: "#2563eb",
        width: 4.0,
        dash: None,
    };

    /// Dashed, lighter stroke so wheelchair routes are distinguishable.
    pub const WHEELCHAIR: LineStyle = LineStyle {
        color: "#4287f5",
        width: 4.0,
        dash: Some([5.0, 5.0]),
    };

    /// Low-emphasis hover stroke.
    pub const PREVIEW: LineStyle = LineStyle {
        color: "rgba(37, 99, 235, 0.5)",
        width: 4.0,
        dash: None,
    };
}

/// Axis-aligned geographic extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn spanning(a: Coordinates, b: Coordinates) -> Self {
        Self {
            min_lon: a.lon.min(b.lon),
            min_lat: a.lat.min(b.lat),
            max_lon: a.lon.max(b.lon),
            max_lat: a.lat.max(b.lat),
        }
    }
}

/// Constraints for fitting the viewport to a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitOptions {
    /// Padding in pixels: top, right, bottom, left.
    pub padding: [u32; 4],
    pub max_zoom: f64,
    pub duration: Duration,
}

/// Base tile source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseLayer {
    #[default]
    Standard,
    Satellite,
}

impl BaseLayer {
    pub fn toggled(self) -> Self {
        match self {
            BaseLayer::Standard => BaseLayer::Satellite,
            BaseLayer::Satellite => BaseLayer::Standard,
        }
    }
}

/// Failures reported by a presentation adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map mount target is missing")]
    MissingTarget,
    #[error("map rendering failed: {0}")]
    Render(String),
}

/// Declarative drawing surface driven by the navigation core.
pub trait MapAdapter {
    /// Insert or replace a point feature.
    fn upsert_point(
        &mut self,
        key: FeatureKey,
        at: Coordinates,
        style: PointStyle,
    ) -> Result<(), MapError>;

    /// Insert or replace a line feature.
    fn draw_line(
        &mut self,
        key: FeatureKey,
        path: &[Coordinates],
        style: &LineStyle,
    ) -> Result<(), MapError>;

    /// Remove one feature. Removing an absent feature is not an error.
    fn remove(&mut self, key: FeatureKey) -> Result<(), MapError>;

    /// Remove every feature of `kind`.
    fn remove_kind(&mut self, kind: FeatureKind) -> Result<(), MapError>;

    fn set_center(&mut self, at: Coordinates, zoom: Option<f64>) -> Result<(), MapError>;

    fn fit_bounds(&mut self, bounds: BoundingBox, options: &FitOptions) -> Result<(), MapError>;

    fn set_base_layer(&mut self, layer: BaseLayer) -> Result<(), MapError>;
}

/// Geometry of a recorded feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coordinates),
    Line(Vec<Coordinates>),
}

/// Style of a recorded feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureStyle {
    Point(PointStyle),
    Line(LineStyle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub style: FeatureStyle,
}

/// Current viewport of a [`FeatureTable`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Viewport {
    Centered { at: Coordinates, zoom: Option<f64> },
    Fitted { bounds: BoundingBox, options: FitOptions },
}

/// In-memory scene keyed by [`FeatureKey`].
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    target: String,
    features: BTreeMap<FeatureKey, Feature>,
    viewport: Option<Viewport>,
    base_layer: BaseLayer,
}

impl FeatureTable {
    /// Attach a scene to a mount target. A missing or blank target is refused.
    pub fn mount(target: Option<&str>) -> Result<Self, MapError> {
        match target.map(str::trim) {
            Some(target) if !target.is_empty() => Ok(Self {
                target: target.to_string(),
                ..Self::default()
            }),
            _ => Err(MapError::MissingTarget),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn get(&self, key: FeatureKey) -> Option<&Feature> {
        self.features.get(&key)
    }

    pub fn features(&self) -> impl Iterator<Item = (&FeatureKey, &Feature)> {
        self.features.iter()
    }

    pub fn count(&self, kind: FeatureKind) -> usize {
        self.features.keys().filter(|key| key.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn base_layer(&self) -> BaseLayer {
        self.base_layer
    }
}

impl MapAdapter for FeatureTable {
    fn upsert_point(
        &mut self,
        key: FeatureKey,
        at: Coordinates,
        style: PointStyle,
    ) -> Result<(), MapError> {
        self.features.insert(
            key,
            Feature {
                geometry: Geometry::Point(at),
                style: FeatureStyle::Point(style),
            },
        );
        Ok(())
    }

    fn draw_line(
        &mut self,
        key: FeatureKey,
        path: &[Coordinates],
        style: &LineStyle,
    ) -> Result<(), MapError> {
        if path.len() < 2 {
            return Err(MapError::Render(format!(
                "line {key} needs at least two points"
            )));
        }
        self.features.insert(
            key,
            Feature {
                geometry: Geometry::Line(path.to_vec()),
                style: FeatureStyle::Line(style.clone()),
            },
        );
        Ok(())
    }

    fn remove(&mut self, key: FeatureKey) -> Result<(), MapError> {
        self.features.remove(&key);
        Ok(())
    }

    fn remove_kind(&mut self, kind: FeatureKind) -> Result<(), MapError> {
        self.features.retain(|key, _| key.kind != kind);
        Ok(())
    }

    fn set_center(&mut self, at: Coordinates, zoom: Option<f64>) -> Result<(), MapError> {
        self.viewport = Some(Viewport::Centered { at, zoom });
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, options: &FitOptions) -> Result<(), MapError> {
        self.viewport = Some(Viewport::Fitted {
            bounds,
            options: *options,
        });
        Ok(())
    }

    fn set_base_layer(&mut self, layer: BaseLayer) -> Result<(), MapError> {
        self.base_layer = layer;
        Ok(())
    }
}
