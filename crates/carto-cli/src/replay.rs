//! Scripted sessions for the `replay` command.

use anyhow::{anyhow, bail, Context};
use carto_core::geometry::from_lon_lat;
use carto_core::index::resolve_name;
use carto_core::{
    BaseLayer, EventQueue, FeatureId, LonLat, RecordingEngine, SelectionCoordinator,
};
use std::str::FromStr;

/// One user gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Click on the (first) feature named `name`.
    ClickName(String),
    /// Click on a raw feature id, which may not exist.
    ClickId(usize),
    ClickEmpty,
    List(String),
    Dismiss,
    Base(BaseLayer),
    Pointer(LonLat),
    Width(f64),
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (verb, arg) = match s.split_once(':') {
            Some((v, a)) => (v.trim(), a.trim()),
            None => (s.trim(), ""),
        };
        let step = match verb {
            "click" => match arg.strip_prefix('#') {
                Some(id) => Step::ClickId(id.parse().with_context(|| format!("bad feature id in `{s}`"))?),
                None if arg.is_empty() => Step::ClickEmpty,
                None => Step::ClickName(arg.to_owned()),
            },
            "empty" => Step::ClickEmpty,
            "list" if !arg.is_empty() => Step::List(arg.to_owned()),
            "dismiss" => Step::Dismiss,
            "base" => Step::Base(arg.parse().map_err(|e: String| anyhow!(e))?),
            "pointer" => {
                let (lon, lat) = arg
                    .split_once(',')
                    .ok_or_else(|| anyhow!("expected pointer:<lon>,<lat>, got `{s}`"))?;
                Step::Pointer(LonLat::new(lon.trim().parse()?, lat.trim().parse()?))
            }
            "width" => Step::Width(arg.parse().with_context(|| format!("bad width in `{s}`"))?),
            _ => bail!("unknown replay step `{s}`"),
        };
        Ok(step)
    }
}

/// Applies `step` and returns the hit-test result the engine would report,
/// for logging.
pub fn apply(
    map: &mut SelectionCoordinator<RecordingEngine>,
    step: &Step,
) -> Option<FeatureId> {
    match step {
        Step::ClickName(name) => {
            let hit = map
                .layer()
                .features()
                .iter()
                .find(|f| resolve_name(f) == Some(name.as_str()))
                .map(|f| f.id);
            map.map_click(hit);
            hit
        }
        Step::ClickId(id) => {
            map.map_click(Some(FeatureId(*id)));
            Some(FeatureId(*id))
        }
        Step::ClickEmpty => {
            map.map_click(None);
            None
        }
        Step::List(name) => {
            map.select_from_list(name);
            None
        }
        Step::Dismiss => {
            map.dismiss_popup();
            None
        }
        Step::Base(layer) => {
            map.set_base_layer(*layer);
            None
        }
        Step::Pointer(point) => {
            let position = from_lon_lat(*point);
            let hit = map
                .layer()
                .features()
                .iter()
                .find(|f| f.extent.is_some_and(|e| e.contains(position)))
                .map(|f| f.id);
            map.pointer_moved(position, hit);
            hit
        }
        Step::Width(px) => {
            map.set_viewport_width(*px);
            None
        }
    }
}

/// Runs every step, printing engine commands and shell events as they occur.
pub fn run(
    map: &mut SelectionCoordinator<RecordingEngine>,
    events: &EventQueue,
    steps: &[Step],
) {
    for (n, step) in steps.iter().enumerate() {
        let hit = apply(map, step);
        println!("[{}] {:?} (hit: {})", n + 1, step, hit.map_or("none".to_owned(), |h| h.to_string()));
        for command in map.engine_mut().take() {
            println!("    engine: {command}");
        }
        for event in events.drain() {
            println!("    shell:  {event:?}");
        }
        match map.selected_name() {
            Some(name) => println!("    state:  Selected({name})"),
            None => println!("    state:  Idle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_core::geometry::Geometry;
    use carto_core::layer::PropertyValue;
    use carto_core::{GeometryLayer, MapConfig};
    use std::collections::BTreeMap;

    #[test]
    fn steps_parse() {
        assert_eq!("click:Rabat".parse::<Step>().unwrap(), Step::ClickName("Rabat".into()));
        assert_eq!("click:#4".parse::<Step>().unwrap(), Step::ClickId(4));
        assert_eq!("empty".parse::<Step>().unwrap(), Step::ClickEmpty);
        assert_eq!("base:satellite".parse::<Step>().unwrap(), Step::Base(BaseLayer::Satellite));
        assert_eq!(
            "pointer:-6.8, 34.0".parse::<Step>().unwrap(),
            Step::Pointer(LonLat::new(-6.8, 34.0))
        );
        assert!("zoom:3".parse::<Step>().is_err());
        assert!("list:".parse::<Step>().is_err());
    }

    #[test]
    fn click_by_name_selects() {
        let mut props = BTreeMap::new();
        props.insert("name".to_owned(), PropertyValue::Text("Ifrane".to_owned()));
        let ring = vec![[-5.5, 33.0], [-5.0, 33.0], [-5.0, 33.5], [-5.5, 33.0]];
        let layer = GeometryLayer::from_parts([(props, Some(Geometry::Polygon(vec![ring])))]);

        let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
        map.load_layer(layer);
        assert_eq!(apply(&mut map, &Step::ClickName("Ifrane".into())), Some(FeatureId(0)));
        assert_eq!(map.selected_name(), Some("Ifrane"));

        apply(&mut map, &Step::ClickName("Azrou".into()));
        assert!(map.selection().is_idle());
    }
}
