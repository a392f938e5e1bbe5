//! Map adapter for terminal sessions.
//!
//! Keeps the scene in a [`FeatureTable`] and reports each draw instruction as
//! a `debug` event, so `RUST_LOG=campusnav_cli=debug` traces what a graphical
//! map would have rendered.

use campusnav_lib::map::{BoundingBox, FitOptions, LineStyle, PointStyle};
use campusnav_lib::{BaseLayer, Coordinates, FeatureKey, FeatureKind, FeatureTable, MapAdapter, MapError};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TextMap {
    scene: FeatureTable,
}

impl TextMap {
    /// Attach to `target`. A blank target fails with [`campusnav_lib::Error::Map`].
    pub fn mount(target: &str) -> campusnav_lib::Result<Self> {
        Ok(Self {
            scene: FeatureTable::mount(Some(target))?,
        })
    }

    pub fn scene(&self) -> &FeatureTable {
        &self.scene
    }
}

impl MapAdapter for TextMap {
    fn upsert_point(
        &mut self,
        key: FeatureKey,
        at: Coordinates,
        style: PointStyle,
    ) -> Result<(), MapError> {
        debug!(feature = %key, %at, ?style, "draw point");
        self.scene.upsert_point(key, at, style)
    }

    fn draw_line(
        &mut self,
        key: FeatureKey,
        path: &[Coordinates],
        style: &LineStyle,
    ) -> Result<(), MapError> {
        debug!(
            feature = %key,
            points = path.len(),
            color = style.color,
            dashed = style.dash.is_some(),
            "draw line"
        );
        self.scene.draw_line(key, path, style)
    }

    fn remove(&mut self, key: FeatureKey) -> Result<(), MapError> {
        debug!(feature = %key, "remove feature");
        self.scene.remove(key)
    }

    fn remove_kind(&mut self, kind: FeatureKind) -> Result<(), MapError> {
        debug!(%kind, "remove features");
        self.scene.remove_kind(kind)
    }

    fn set_center(&mut self, at: Coordinates, zoom: Option<f64>) -> Result<(), MapError> {
        debug!(%at, ?zoom, "center map");
        self.scene.set_center(at, zoom)
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, options: &FitOptions) -> Result<(), MapError> {
        debug!(?bounds, max_zoom = options.max_zoom, "fit map to bounds");
        self.scene.fit_bounds(bounds, options)
    }

    fn set_base_layer(&mut self, layer: BaseLayer) -> Result<(), MapError> {
        debug!(?layer, "switch base layer");
        self.scene.set_base_layer(layer)
    }
}
