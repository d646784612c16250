use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flood_watch::data::generate_simple_world;
use flood_watch::map::{zoom_factor_for_level, MapRenderer, Viewport};
use flood_watch::risk::classify;
use flood_watch::weather::{Units, WeatherSnapshot};
use flood_watch::zones::embedded_zones;

fn bench_render(c: &mut Criterion) {
    let mut renderer = MapRenderer::new();
    generate_simple_world(&mut renderer);
    renderer.add_zones(embedded_zones().expect("embedded zones parse"));

    // Street-level view with the zone filling most of the screen
    let street = Viewport::new(78.925, 20.525, zoom_factor_for_level(14), 400, 200);
    c.bench_function("render_zone_street_level", |b| {
        b.iter(|| renderer.render(200, 50, black_box(&street)))
    });

    let country = Viewport::new(78.9629, 20.5937, zoom_factor_for_level(5), 400, 200);
    c.bench_function("render_country_level", |b| {
        b.iter(|| renderer.render(200, 50, black_box(&country)))
    });
}

fn bench_classify(c: &mut Criterion) {
    let snapshot = WeatherSnapshot {
        temperature: 27.0,
        humidity_pct: 88.0,
        rain_1h_mm: Some(4.2),
        wind_speed: 5.0,
        description: "moderate rain".to_string(),
        units: Units::Metric,
    };
    c.bench_function("classify", |b| b.iter(|| classify(black_box(&snapshot))));
}

criterion_group!(benches, bench_render, bench_classify);
criterion_main!(benches);
