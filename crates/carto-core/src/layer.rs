// crates/carto-core/src/layer.rs

//! # Geometry Layer
//!
//! The single vector layer of a map view. It owns every [`Feature`] loaded
//! from the geometry source; other components only ever hold a
//! [`FeatureId`] into it.

use crate::geometry::{Extent, Geometry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a feature inside its [`GeometryLayer`].
///
/// Ids follow source order, which is also the order map engines assign when
/// they read the same source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A scalar attribute value.
///
/// Nested arrays/objects are kept as their JSON text so the layer can be
/// cached with bincode (which cannot replay self-describing values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Raw(String),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A geometry plus its attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub properties: BTreeMap<String, PropertyValue>,
    pub geometry: Option<Geometry>,
    /// Bounding box in map projection units, computed once at load.
    pub extent: Option<Extent>,
}

impl Feature {
    pub fn new(
        id: FeatureId,
        properties: BTreeMap<String, PropertyValue>,
        geometry: Option<Geometry>,
    ) -> Self {
        let extent = geometry.as_ref().and_then(Geometry::projected_extent);
        Self {
            id,
            properties,
            geometry,
            extent,
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// The loaded vector layer. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryLayer {
    features: Vec<Feature>,
}

impl GeometryLayer {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a layer from `(properties, geometry)` pairs, assigning ids in
    /// iteration order.
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = (BTreeMap<String, PropertyValue>, Option<Geometry>)>,
    {
        let features = parts
            .into_iter()
            .enumerate()
            .map(|(i, (props, geom))| Feature::new(FeatureId(i), props, geom))
            .collect();
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Union of every feature extent.
    pub fn extent(&self) -> Option<Extent> {
        let mut all = Extent::EMPTY;
        for e in self.features.iter().filter_map(|f| f.extent.as_ref()) {
            all.merge(e);
        }
        (!all.is_empty()).then_some(all)
    }
}

// -----------------------------------------------------------------------------
// GEOJSON PARSING
// -----------------------------------------------------------------------------

#[cfg(feature = "json")]
mod geojson {
    use super::{GeometryLayer, PropertyValue};
    use crate::error::{CartoError, Result};
    use crate::geometry::{Geometry, Position};
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;
    use std::io::Read;

    impl GeometryLayer {
        /// Parses a GeoJSON `FeatureCollection` (or a lone `Feature`).
        pub fn from_geojson_str(text: &str) -> Result<Self> {
            let value: Value = serde_json::from_str(text)?;
            Self::from_geojson_value(&value)
        }

        pub fn from_geojson_reader(reader: impl Read) -> Result<Self> {
            let value: Value = serde_json::from_reader(reader)?;
            Self::from_geojson_value(&value)
        }

        pub fn from_geojson_value(value: &Value) -> Result<Self> {
            let features = match type_of(value)? {
                "FeatureCollection" => value
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("FeatureCollection without a `features` array"))?
                    .iter()
                    .map(parse_feature)
                    .collect::<Result<Vec<_>>>()?,
                "Feature" => vec![parse_feature(value)?],
                other => return Err(invalid(format!("expected a FeatureCollection, got `{other}`"))),
            };
            Ok(Self::from_parts(features))
        }
    }

    fn invalid(msg: impl Into<String>) -> CartoError {
        CartoError::InvalidData(msg.into())
    }

    fn type_of(value: &Value) -> Result<&str> {
        value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("GeoJSON object without a `type` member"))
    }

    fn parse_feature(
        value: &Value,
    ) -> Result<(BTreeMap<String, PropertyValue>, Option<Geometry>)> {
        if type_of(value)? != "Feature" {
            return Err(invalid("FeatureCollection member is not a Feature"));
        }
        let properties = match value.get("properties") {
            Some(Value::Object(map)) => convert_properties(map),
            Some(Value::Null) | None => BTreeMap::new(),
            Some(_) => return Err(invalid("feature `properties` must be an object")),
        };
        let geometry = match value.get("geometry") {
            Some(Value::Null) | None => None,
            Some(g) => Some(parse_geometry(g)?),
        };
        Ok((properties, geometry))
    }

    fn convert_properties(map: &Map<String, Value>) -> BTreeMap<String, PropertyValue> {
        map.iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::Null => PropertyValue::Null,
                    Value::Bool(b) => PropertyValue::Bool(*b),
                    Value::Number(n) => n
                        .as_f64()
                        .map(PropertyValue::Number)
                        .unwrap_or_else(|| PropertyValue::Raw(n.to_string())),
                    Value::String(s) => PropertyValue::Text(s.clone()),
                    other => PropertyValue::Raw(other.to_string()),
                };
                (k.clone(), v)
            })
            .collect()
    }

    fn parse_geometry(value: &Value) -> Result<Geometry> {
        let kind = type_of(value)?;
        if kind == "GeometryCollection" {
            let parts = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("GeometryCollection without `geometries`"))?
                .iter()
                .map(parse_geometry)
                .collect::<Result<Vec<_>>>()?;
            return Ok(Geometry::GeometryCollection(parts));
        }

        let coords = value
            .get("coordinates")
            .ok_or_else(|| invalid(format!("{kind} without `coordinates`")))?;
        Ok(match kind {
            "Point" => Geometry::Point(position(coords)?),
            "MultiPoint" => Geometry::MultiPoint(positions(coords)?),
            "LineString" => Geometry::LineString(positions(coords)?),
            "MultiLineString" => Geometry::MultiLineString(nested(coords, positions)?),
            "Polygon" => Geometry::Polygon(nested(coords, positions)?),
            "MultiPolygon" => {
                Geometry::MultiPolygon(nested(coords, |ring| nested(ring, positions))?)
            }
            other => return Err(invalid(format!("unsupported geometry type `{other}`"))),
        })
    }

    fn position(value: &Value) -> Result<Position> {
        let arr = value
            .as_array()
            .filter(|a| a.len() >= 2)
            .ok_or_else(|| invalid("position must be an array of at least two numbers"))?;
        match (arr[0].as_f64(), arr[1].as_f64()) {
            (Some(lon), Some(lat)) => Ok([lon, lat]),
            _ => Err(invalid("position members must be numbers")),
        }
    }

    fn positions(value: &Value) -> Result<Vec<Position>> {
        nested(value, position)
    }

    fn nested<T>(value: &Value, item: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
        value
            .as_array()
            .ok_or_else(|| invalid("coordinates must be nested arrays"))?
            .iter()
            .map(item)
            .collect()
    }
}
