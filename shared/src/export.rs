//! Map marker layer.
//!
//! The map renderer consumes the filtered collection as a GeoJSON
//! `FeatureCollection` of points. Longitudes are emitted as stored; the
//! renderer wraps them itself.

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use std::sync::Arc;

use crate::model::{Quake, QuakeId};
use crate::palette::magnitude_color;

fn feature_id(id: &QuakeId) -> Id {
    match id {
        QuakeId::Numeric(n) => Id::Number((*n).into()),
        QuakeId::Text(s) => Id::String(s.clone()),
    }
}

#[must_use]
pub fn quake_feature(quake: &Quake, selected: bool) -> Feature {
    let color = magnitude_color(quake.magnitude);
    let mut properties = JsonObject::new();
    properties.insert("id".into(), json!(quake.id));
    properties.insert("place".into(), json!(quake.place));
    properties.insert("magnitude".into(), json!(quake.magnitude));
    properties.insert("depth".into(), json!(quake.depth));
    properties.insert("color".into(), json!(color.hex));
    properties.insert("hover_color".into(), json!(color.hover_hex));
    properties.insert("selected".into(), json!(selected));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            quake.longitude,
            quake.latitude,
        ]))),
        id: Some(feature_id(&quake.id)),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// One point feature per event, in collection order.
#[must_use]
pub fn marker_layer(quakes: &[Arc<Quake>], selected: Option<&QuakeId>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: quakes
            .iter()
            .map(|quake| quake_feature(quake, selected == Some(&quake.id)))
            .collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quake(id: QuakeId, magnitude: f64) -> Arc<Quake> {
        Arc::new(Quake {
            id,
            place: "10 km N of Somewhere".into(),
            time: Utc::now(),
            latitude: -12.5,
            longitude: 190.0,
            depth: 33.0,
            magnitude,
            country: None,
        })
    }

    #[test]
    fn points_are_lng_lat_with_marker_properties() {
        let quakes = vec![quake(QuakeId::new("a"), 5.2), quake(QuakeId::Numeric(7), 1.0)];
        let layer = marker_layer(&quakes, Some(&QuakeId::Numeric(7)));
        assert_eq!(layer.features.len(), 2);

        let first = &layer.features[0];
        assert_eq!(
            first.geometry.as_ref().map(|g| &g.value),
            Some(&Value::Point(vec![190.0, -12.5]))
        );
        assert_eq!(first.id, Some(Id::String("a".into())));
        let props = first.properties.as_ref().unwrap();
        assert_eq!(props["color"], json!("#F56565"));
        assert_eq!(props["selected"], json!(false));

        let second = &layer.features[1];
        assert_eq!(second.id, Some(Id::Number(7.into())));
        assert_eq!(second.properties.as_ref().unwrap()["selected"], json!(true));
    }

    #[test]
    fn serializes_as_feature_collection() {
        let layer = marker_layer(&[quake(QuakeId::new("x"), 3.0)], None);
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["properties"]["id"], "x");
    }
}
