//! Tests for the layer renderer registry, driven through a headless map.

mod common;

use common::Harness;
use map_common::Diagnostic;
use renderer::style::{DEFAULT_HIGH_COLOR, DEFAULT_LOW_COLOR};
use renderer::{ColorScale, MapSurface, NO_DATA_COLOR};
use serde_json::json;
use storage::MemoryFetcher;
use test_utils::{assert_approx_eq, fixtures, urls};

fn choropleth(features: &str) -> serde_json::Value {
    json!({"layers": [{"type": "choropleth", "data": urls::JSON_ROWS, "features": features}]})
}

// ============================================================================
// Tile layers
// ============================================================================

#[tokio::test]
async fn test_tiles_layer() {
    let mut harness = Harness::new(MemoryFetcher::new());
    let scene = harness
        .render(json!({"layers": [{"type": "tiles", "src": "foo", "attribution": "bar"}]}))
        .await;

    assert_eq!(scene.tile_layers.len(), 1);
    assert_eq!(scene.tile_layers[0].url, "foo");
    assert_eq!(scene.tile_layers[0].attribution.as_deref(), Some("bar"));
    assert_eq!(harness.fetcher.total_requests(), 0);
}

#[tokio::test]
async fn test_osm_background() {
    let mut harness = Harness::new(MemoryFetcher::new());
    let scene = harness
        .render(json!({"layers": [{"type": "background", "source": "osm"}]}))
        .await;

    let layer = &scene.tile_layers[0];
    assert!(layer.url.contains("tile.osm.org/{z}/{x}/{y}.png"));
    assert!(layer
        .attribution
        .as_deref()
        .unwrap()
        .contains("<a href=\"http://osm.org/copyright\">OpenStreetMap</a>"));
}

#[tokio::test]
async fn test_unknown_background_source() {
    let mut harness = Harness::new(MemoryFetcher::new());
    let scene = harness
        .render(json!({"layers": [{"type": "background", "source": "stamen"}]}))
        .await;

    assert!(scene.tile_layers.is_empty());
    assert_eq!(
        harness.diagnostics(),
        vec![Diagnostic::UnknownBackgroundSource {
            layer: 0,
            name: "stamen".to_string()
        }]
    );
}

// ============================================================================
// Choropleth layers
// ============================================================================

#[tokio::test]
async fn test_choropleth_single_joined_feature() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &json!([{"id": 1, "value": 1}]))
        .with_json(urls::REGIONS, &fixtures::single_region(json!(1)));
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(choropleth(urls::REGIONS)).await;

    let features: Vec<_> = scene.features().collect();
    assert_eq!(features.len(), 1);
    let properties = features[0].feature.properties.as_ref().unwrap();
    assert_eq!(properties["id"], json!(1));

    let expected = ColorScale::new((1.0, 1.0), DEFAULT_LOW_COLOR, DEFAULT_HIGH_COLOR).fill(1.0);
    assert_eq!(features[0].style.fill_color, expected);
    assert_approx_eq!(features[0].style.fill_opacity, 0.5);
    assert!(harness.diagnostics().is_empty());
}

#[tokio::test]
async fn test_choropleth_from_topology_fits_viewport() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(urls::TOPOLOGY, &fixtures::regions_topology());
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(choropleth(urls::TOPOLOGY)).await;

    let features: Vec<_> = scene.features().collect();
    assert_eq!(features.len(), 2);
    assert_ne!(features[0].style.fill_color, features[1].style.fill_color);

    let viewport = scene.viewport.unwrap();
    assert_approx_eq!(viewport.min_lng, 0.0);
    assert_approx_eq!(viewport.max_lng, 2.0);
    assert_approx_eq!(viewport.max_lat, 1.0);
}

#[tokio::test]
async fn test_choropleth_feature_without_row() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &json!([{"id": "2", "value": "4"}]))
        .with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(choropleth(urls::REGIONS)).await;

    let features: Vec<_> = scene.features().collect();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0].style.fill_color, NO_DATA_COLOR);
    assert_eq!(features[0].popup.html, "<table class=\"properties\"></table>");
}

#[tokio::test]
async fn test_choropleth_click_opens_popup_at_center() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    harness.render(choropleth(urls::REGIONS)).await;

    let map = harness.viewer.current_map().unwrap();
    let mut map = map.lock().await;
    let popup = map.click_feature(0, 1).unwrap().clone();
    assert_approx_eq!(popup.at.lat, 0.5);
    assert_approx_eq!(popup.at.lng, 1.5);
    assert!(popup.html.contains("<tr><th>name</th><td>South</td></tr>"));
    assert!(!map.is_removed());
}

#[tokio::test]
async fn test_choropleth_color_range_override() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    let scene = harness
        .render(json!({"layers": [{
            "type": "choropleth",
            "data": urls::JSON_ROWS,
            "features": urls::REGIONS,
            "colorRange": {
                "min": {"color": "#000000", "value": 0},
                "max": {"color": "#ffffff", "value": 10}
            }
        }]}))
        .await;

    // Row 2 (30) is far past the top of the range and saturates to white.
    let features: Vec<_> = scene.features().collect();
    assert_eq!(features[1].style.fill_color.to_hex(), "#ffffff");
}

#[tokio::test]
async fn test_choropleth_invalid_range_color() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    let scene = harness
        .render(json!({"layers": [{
            "type": "choropleth",
            "data": urls::JSON_ROWS,
            "features": urls::REGIONS,
            "colorRange": {
                "min": {"color": "nope", "value": 0},
                "max": {"color": "#fff", "value": 10}
            }
        }]}))
        .await;

    assert!(scene.feature_layers.is_empty());
    assert_eq!(
        harness.diagnostics(),
        vec![Diagnostic::InvalidColor {
            layer: 0,
            color: "nope".to_string()
        }]
    );
}

#[tokio::test]
async fn test_choropleth_unknown_data_source() {
    let fetcher = MemoryFetcher::new().with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    let scene = harness
        .render(json!({"layers": [{
            "type": "choropleth",
            "data": "https://data.example.org/rows.xlsx",
            "features": urls::REGIONS
        }]}))
        .await;

    assert!(scene.is_empty());
    let diagnostics = harness.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code(), "unknown_data_source");
    assert_eq!(harness.fetcher.requests(urls::REGIONS), 0);
}

#[tokio::test]
async fn test_choropleth_unrecognized_document() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(
            urls::REGIONS,
            &json!({"type": "Point", "coordinates": [1.0, 2.0]}),
        );
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(choropleth(urls::REGIONS)).await;

    assert!(scene.feature_layers.is_empty());
    let diagnostics = harness.diagnostics();
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::UnrecognizedFeatureDocument { layer: 0, .. }]
    ));
}

#[tokio::test]
async fn test_choropleth_fetch_failure() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_failure(urls::REGIONS, "HTTP 500");
    let mut harness = Harness::new(fetcher);
    harness.render(choropleth(urls::REGIONS)).await;

    let diagnostics = harness.diagnostics();
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::FetchFailed { layer: Some(0), message }] if message.contains("HTTP 500")
    ));
}

// ============================================================================
// Bubble layers
// ============================================================================

fn bubble(color: Option<&str>) -> serde_json::Value {
    let mut layer = json!({"type": "bubble", "data": urls::JSON_ROWS, "features": urls::POINTS});
    if let Some(color) = color {
        layer["color"] = json!(color);
    }
    json!({ "layers": [layer] })
}

fn city_rows() -> serde_json::Value {
    json!([
        {"id": "a", "value": "100"},
        {"id": "b", "value": "25"},
        {"id": "z", "value": "7"}
    ])
}

#[tokio::test]
async fn test_bubble_radii_and_skipped_features() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &city_rows())
        .with_json(urls::POINTS, &fixtures::cities());
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(bubble(None)).await;

    // City "c" has no row.
    assert_eq!(scene.circles.len(), 2);
    let max = (5e9 / std::f64::consts::PI).sqrt();
    assert_approx_eq!(scene.circles[0].radius, max, 1e-6);
    assert_approx_eq!(scene.circles[1].radius, max / 2.0, 1e-6);
    assert_approx_eq!(scene.circles[0].center.lat, 44.43);
    assert_approx_eq!(scene.circles[0].center.lng, 26.10);
    assert_eq!(scene.circles[0].style.color.to_hex(), "#000088");
    assert_eq!(scene.circles[0].style.fill_color.to_hex(), "#000088");

    let viewport = scene.viewport.unwrap();
    assert_approx_eq!(viewport.min_lat, 44.43);
    assert_approx_eq!(viewport.max_lat, 46.77);
}

#[tokio::test]
async fn test_bubble_custom_color_and_popup() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &city_rows())
        .with_json(urls::POINTS, &fixtures::cities());
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(bubble(Some("#800"))).await;
    assert_eq!(scene.circles[1].style.color.to_hex(), "#880000");

    let map = harness.viewer.current_map().unwrap();
    let mut map = map.lock().await;
    let popup = map.click_circle(1).unwrap();
    assert_approx_eq!(popup.at.lat, 46.77);
    assert!(popup.html.contains("<tr><th>id</th><td>b</td></tr>"));
}

#[tokio::test]
async fn test_bubble_without_rows_is_empty() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &json!([{"id": "zz", "value": 3}]))
        .with_json(urls::POINTS, &fixtures::cities());
    let mut harness = Harness::new(fetcher);
    let scene = harness.render(bubble(None)).await;

    assert!(scene.circles.is_empty());
    assert!(scene.viewport.is_none());
    assert_eq!(harness.diagnostics(), vec![Diagnostic::EmptyLayer { layer: 0 }]);
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_unknown_layer_does_not_block_others() {
    let mut harness = Harness::new(MemoryFetcher::new());
    let scene = harness
        .render(json!({"layers": [
            {"type": "heatmap"},
            {"type": "tiles", "src": "foo"},
            {"src": "untyped"}
        ]}))
        .await;

    assert_eq!(scene.tile_layers.len(), 1);
    let mut diagnostics = harness.diagnostics();
    diagnostics.sort_by_key(|d| d.layer());
    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::UnknownLayerType {
                layer: 0,
                kind: Some("heatmap".to_string())
            },
            Diagnostic::UnknownLayerType { layer: 2, kind: None },
        ]
    );
}

#[tokio::test]
async fn test_invalid_layer_fields() {
    let mut harness = Harness::new(MemoryFetcher::new());
    harness
        .render(json!({"layers": [{"type": "choropleth", "features": urls::REGIONS}]}))
        .await;

    let diagnostics = harness.diagnostics();
    assert!(matches!(
        &diagnostics[..],
        [Diagnostic::InvalidLayer { layer: 0, kind, .. }] if kind == "choropleth"
    ));
}

#[tokio::test]
async fn test_shared_sources_are_fetched_once() {
    let fetcher = MemoryFetcher::new()
        .with_json(urls::JSON_ROWS, &fixtures::region_rows())
        .with_json(urls::REGIONS, &fixtures::regions());
    let mut harness = Harness::new(fetcher);
    let layer = json!({"type": "choropleth", "data": urls::JSON_ROWS, "features": urls::REGIONS});
    let scene = harness.render(json!({"layers": [layer.clone(), layer]})).await;

    assert_eq!(scene.feature_layers.len(), 2);
    assert_eq!(harness.fetcher.requests(urls::REGIONS), 1);
    assert_eq!(harness.fetcher.requests(urls::JSON_ROWS), 1);
}
