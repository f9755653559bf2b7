use assert_matches::assert_matches;
use chrono::{TimeDelta, Utc};
use crux_core::testing::AppTester;
use crux_http::protocol::{HttpResponse, HttpResult};
use shared::engine::Topic;
use shared::geo_bounds::{LngLat, RawViewport};
use shared::model::{AggregationScope, ChartHover, Panel, Quake, QuakeId};
use shared::sort::SortKey;
use shared::{App, Effect, Event, Model};

fn fixture() -> Vec<Quake> {
    let now = Utc::now();
    let raw = serde_json::json!([
        {
            "earthquake_id": "us1", "place": "Near San Francisco", "magnitude": 5.4,
            "depth": 8.0, "latitude": 37.0, "longitude": -122.0, "country": "United States",
            "time": now - TimeDelta::hours(1)
        },
        {
            "earthquake_id": 2, "place": "Near Los Angeles", "magnitude": 2.1,
            "depth": 4.0, "latitude": 34.0, "longitude": -118.0, "country": "United States",
            "time": now - TimeDelta::hours(2)
        },
        {
            "earthquake_id": "jp1", "place": "Off Honshu", "magnitude": 6.3,
            "depth": 35.0, "latitude": 38.0, "longitude": 142.0, "country": "Japan",
            "time": now - TimeDelta::hours(30)
        },
        {
            "earthquake_id": "fj1", "place": "Fiji region", "magnitude": 4.7,
            "depth": 550.0, "latitude": -18.0, "longitude": 179.5,
            "time": now - TimeDelta::hours(5)
        },
        {
            "earthquake_id": "cl1", "place": "Central Chile", "magnitude": 3.3,
            "depth": 20.0, "latitude": -33.0, "longitude": -71.0, "country": "Chile",
            "time": now - TimeDelta::hours(50)
        }
    ]);
    serde_json::from_value(raw).unwrap()
}

fn loaded() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::QuakesLoaded(fixture()), &mut model);
    (app, model)
}

fn list_ids(app: &AppTester<App, Effect>, model: &Model) -> Vec<String> {
    app.view(model)
        .list
        .iter()
        .map(|item| item.id.to_string())
        .collect()
}

fn renders(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

#[test]
fn app_start_requests_the_feed() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::AppStarted, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
    assert!(renders(&update.effects));
    assert!(model.is_loading());
    assert!(app.view(&model).is_loading);
}

fn resolve_feed(app: &AppTester<App, Effect>, model: &mut Model, result: HttpResult) {
    let update = app.update(Event::RefreshRequested, model);
    let mut request = update
        .into_effects()
        .find_map(|e| match e {
            Effect::Http(request) => Some(request),
            Effect::Render(_) => None,
        })
        .expect("refresh should request the feed");
    assert_eq!(
        request.operation.url,
        model.config.quakes_url().unwrap().to_string()
    );

    let update = app.resolve(&mut request, result).unwrap();
    for event in update.events {
        app.update(event, model);
    }
}

#[test]
fn feed_response_is_decoded_into_the_collection() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let body = serde_json::to_vec(&fixture()).unwrap();
    resolve_feed(
        &app,
        &mut model,
        HttpResult::Ok(HttpResponse::ok().body(body).build()),
    );
    let view = app.view(&model);
    assert!(!view.is_loading);
    assert!(view.error.is_none());
    assert_eq!(view.counts.all, 5);
    assert_eq!(list_ids(&app, &model), ["us1", "2", "fj1", "jp1", "cl1"]);
}

#[test]
fn malformed_feed_is_a_deserialization_error() {
    let (app, mut model) = loaded();

    resolve_feed(
        &app,
        &mut model,
        HttpResult::Ok(HttpResponse::ok().body(b"{not json".to_vec()).build()),
    );
    let view = app.view(&model);
    assert_eq!(view.counts.all, 0);
    let error = view.error.unwrap();
    assert_eq!(error.error_code, "DESERIALIZATION_ERROR");
    assert!(!error.is_retryable);
}

#[test]
fn transport_failure_is_a_network_error() {
    let (app, mut model) = loaded();

    resolve_feed(&app, &mut model, HttpResult::Err(crux_http::Error::Timeout));
    let view = app.view(&model);
    assert_eq!(view.counts.all, 0);
    assert!(!view.is_loading);
    let error = view.error.unwrap();
    assert_eq!(error.error_code, "NETWORK_ERROR");
    assert!(error.is_retryable);
}

#[test]
fn loaded_collection_is_sorted_by_time_and_fully_in_view() {
    let (app, model) = loaded();
    let view = app.view(&model);

    assert!(!view.is_loading);
    assert_eq!(view.counts.all, 5);
    assert_eq!(view.counts.filtered, 5);
    assert_eq!(view.counts.in_view, 5);
    assert_eq!(list_ids(&app, &model), ["us1", "2", "fj1", "jp1", "cl1"]);
    assert_eq!(view.markers.features.len(), 5);
    assert_eq!(
        view.filters.country_options,
        ["Chile", "Japan", "United States"]
    );
    assert_eq!(view.list[2].country, "International");
    assert!(view.changed.contains(&Topic::All));
    assert!(view.changed.contains(&Topic::InView));
}

#[test]
fn filters_combine_and_reject_malformed_input() {
    let (app, mut model) = loaded();

    let update = app.update(
        Event::MinMagnitudeChanged {
            value: Some("4+".into()),
        },
        &mut model,
    );
    assert!(renders(&update.effects));
    assert_eq!(list_ids(&app, &model), ["us1", "fj1", "jp1"]);

    app.update(
        Event::MinMagnitudeChanged {
            value: Some("lots".into()),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.filters.min_magnitude, Some(4.0));
    assert_eq!(view.counts.filtered, 3);
    assert!(view.error.is_none());

    app.update(
        Event::RecencyChanged {
            hours: Some("24".into()),
        },
        &mut model,
    );
    assert_eq!(list_ids(&app, &model), ["us1", "fj1"]);

    app.update(
        Event::CountrySelected {
            country: Some("United States".into()),
        },
        &mut model,
    );
    assert_eq!(list_ids(&app, &model), ["us1"]);
    assert!(app.view(&model).filters.is_active);

    app.update(Event::FiltersCleared, &mut model);
    let view = app.view(&model);
    assert_eq!(view.counts.filtered, 5);
    assert!(!view.filters.is_active);
}

#[test]
fn viewport_across_the_antimeridian() {
    let (app, mut model) = loaded();

    let update = app.update(
        Event::ViewportSettled {
            viewport: RawViewport::new(LngLat::new(170.0, -30.0), LngLat::new(-170.0, 30.0)),
        },
        &mut model,
    );
    assert!(renders(&update.effects));
    let view = app.view(&model);
    assert_eq!(view.counts.in_view, 1);
    assert_eq!(view.list[0].id, QuakeId::new("fj1"));
    // Markers follow the filtered collection, not the viewport.
    assert_eq!(view.markers.features.len(), 5);
    assert!(!view.is_recomputing);
}

#[test]
fn sort_reorders_the_list() {
    let (app, mut model) = loaded();

    app.update(
        Event::SortChanged {
            key: SortKey::Magnitude,
        },
        &mut model,
    );
    assert_eq!(list_ids(&app, &model), ["jp1", "us1", "fj1", "cl1", "2"]);
    let changed = app.view(&model).changed;
    assert!(changed.contains(&Topic::All));
    assert!(changed.contains(&Topic::Filtered));

    app.update(
        Event::SortChanged {
            key: SortKey::Country,
        },
        &mut model,
    );
    assert_eq!(list_ids(&app, &model), ["cl1", "jp1", "us1", "2", "fj1"]);
    assert_eq!(app.view(&model).sort.key, SortKey::Country);
}

#[test]
fn tapping_toggles_selection_and_leads_the_list() {
    let (app, mut model) = loaded();

    app.update(
        Event::QuakeTapped {
            id: QuakeId::new("jp1"),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(list_ids(&app, &model), ["jp1", "us1", "2", "fj1", "cl1"]);
    assert!(view.list[0].is_selected);
    let detail = view.selected.unwrap();
    assert_eq!(detail.place, "Off Honshu");
    assert_eq!(detail.magnitude_text, "6.3");
    assert!(detail.is_filtered_in);
    assert!(view.changed.contains(&Topic::Selection));

    let selected_marker = view
        .markers
        .features
        .iter()
        .find(|f| f.properties.as_ref().unwrap()["selected"] == true)
        .unwrap();
    assert_eq!(
        selected_marker.properties.as_ref().unwrap()["id"],
        "jp1"
    );

    app.update(
        Event::QuakeTapped {
            id: QuakeId::new("jp1"),
        },
        &mut model,
    );
    assert!(app.view(&model).selected.is_none());

    app.update(
        Event::QuakeTapped {
            id: QuakeId::Numeric(2),
        },
        &mut model,
    );
    app.update(Event::SelectionCleared, &mut model);
    assert!(app.view(&model).selected.is_none());
}

#[test]
fn fetch_failure_empties_the_collection() {
    let (app, mut model) = loaded();

    app.update(
        Event::FetchFailed {
            reason: "connection refused".into(),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert_eq!(view.counts.all, 0);
    assert_eq!(view.counts.in_view, 0);
    assert!(view.list.is_empty());
    let error = view.error.unwrap();
    assert_eq!(error.error_code, "NETWORK_ERROR");
    assert!(error.is_retryable);

    app.update(Event::QuakesLoaded(fixture()), &mut model);
    assert!(app.view(&model).error.is_none());
}

#[test]
fn graph_panel_summarizes_the_chosen_scope() {
    let (app, mut model) = loaded();
    assert_eq!(app.view(&model).open_panel, Some(Panel::List));
    assert!(app.view(&model).charts.is_none());

    app.update(Event::PanelToggled { panel: Panel::Graph }, &mut model);
    app.update(
        Event::ViewportSettled {
            viewport: RawViewport::new(LngLat::new(-130.0, 30.0), LngLat::new(-110.0, 45.0)),
        },
        &mut model,
    );

    let charts = app.view(&model).charts.unwrap();
    assert_eq!(charts.scope, AggregationScope::InView);
    assert_eq!(charts.summary.total, 2);
    let labels: Vec<_> = charts
        .magnitude_segments
        .iter()
        .map(|s| (s.label.as_str(), s.count))
        .collect();
    assert_eq!(labels, [("2-3", 1), ("5-6", 1)]);
    assert_eq!(charts.magnitude_segments[1].color_hex, "#F56565");

    app.update(
        Event::ChartHovered {
            hover: ChartHover::Country {
                country: "United States".into(),
                count: 2,
            },
        },
        &mut model,
    );
    assert_matches!(
        app.view(&model).charts.and_then(|c| c.hover_caption),
        Some(caption) if caption == "United States: 2 earthquakes"
    );

    app.update(
        Event::ScopeChanged {
            scope: AggregationScope::Filtered,
        },
        &mut model,
    );
    let charts = app.view(&model).charts.unwrap();
    assert_eq!(charts.summary.total, 5);
    assert!(charts.hover_caption.is_none());

    app.update(Event::PanelToggled { panel: Panel::Graph }, &mut model);
    let view = app.view(&model);
    assert_eq!(view.open_panel, None);
    assert!(view.charts.is_none());

    app.update(Event::PanelToggled { panel: Panel::Filter }, &mut model);
    app.update(Event::PanelsClosed, &mut model);
    assert_eq!(app.view(&model).open_panel, None);
}

#[test]
fn config_is_validated_before_use() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(
        Event::ConfigLoaded {
            json: r#"{"magnitude_chart_ceiling": 99}"#.into(),
        },
        &mut model,
    );
    assert_matches!(
        app.view(&model).error,
        Some(error) if error.error_code == "CONFIG_ERROR"
    );
    assert_eq!(model.config.magnitude_chart_ceiling, 9);

    app.update(
        Event::ConfigLoaded {
            json: r#"{"api_base_url": "https://quakes.example.org/api", "magnitude_presets": [5.0]}"#
                .into(),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(view.error.is_none());
    assert_eq!(view.filters.magnitude_presets, [5.0]);

    let update = app.update(Event::RefreshRequested, &mut model);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Http(_))));
}
