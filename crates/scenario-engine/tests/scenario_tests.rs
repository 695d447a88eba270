//! End-to-end behavior of scenario editing and statistics.

use std::sync::Arc;

use proptest::prelude::*;
use projection::{CoordinateTransformer, CrsRegistry, ProjectionParams};
use raster_common::{AffineTransform, RasterGrid};
use scenario_engine::{
    Edit, EditingSession, EngineConfig, Geometry, GeometryRasterizer, Scenario, ScenarioEditor,
    StatisticsEngine, ValueRule,
};
use test_utils::{
    assert_approx_eq, assert_cells_eq, create_constant_grid, create_gradient_grid, crs,
    geographic_grid_20x20, index_space_grid, no_data, rings, with_no_data_stride,
};

fn transformer() -> CoordinateTransformer {
    let mut registry = CrsRegistry::with_defaults();
    registry
        .register_params(crs::LOCAL, &ProjectionParams::Geographic)
        .unwrap();
    CoordinateTransformer::new(Arc::new(registry))
}

fn editor() -> ScenarioEditor {
    ScenarioEditor::new(transformer(), EngineConfig::default())
}

fn full_square(size: f64, rule: ValueRule) -> Edit {
    Edit::new(Geometry::rectangle(0.0, 0.0, size, size), crs::LOCAL, rule)
}

#[test]
fn test_end_to_end_set_constant() {
    let base = index_space_grid(4, 4, create_constant_grid(4, 4, 1.0), Some(no_data::NEGATIVE_9999));
    let scenario = Scenario::new("flatten", vec![full_square(4.0, ValueRule::SetConstant { value: 5.0 })]);

    let edited = editor().apply(&scenario, &base).unwrap();
    assert_cells_eq!(edited.cells(), [5.0; 16]);

    let summary = StatisticsEngine::default().summarize(&edited, None).unwrap();
    assert_eq!(summary.count, 16);
    assert_eq!(summary.min, Some(5.0));
    assert_eq!(summary.max, Some(5.0));
    assert_eq!(summary.mean, Some(5.0));
    assert_eq!(summary.excluded, 0);
}

#[test]
fn test_edit_order_is_honored() {
    let base = index_space_grid(4, 4, create_constant_grid(4, 4, 1.0), None);
    let set = full_square(4.0, ValueRule::SetConstant { value: 5.0 });
    let add = full_square(4.0, ValueRule::AddDelta { delta: 1.0 });

    let forward = Scenario::new("set then add", vec![set, add]);
    let backward = forward.reversed();

    let editor = editor();
    assert_cells_eq!(editor.apply(&forward, &base).unwrap().cells(), [6.0; 16]);
    assert_cells_eq!(editor.apply(&backward, &base).unwrap().cells(), [5.0; 16]);
}

#[test]
fn test_overlapping_edits_accumulate_without_clamping() {
    let base = index_space_grid(4, 1, vec![250.0; 4], None);
    let scenario = Scenario::new(
        "stack",
        vec![
            Edit::new(Geometry::rectangle(0.0, 0.0, 3.0, 1.0), crs::LOCAL, ValueRule::AddDelta { delta: 10.0 }),
            Edit::new(Geometry::rectangle(1.0, 0.0, 4.0, 1.0), crs::LOCAL, ValueRule::AddDelta { delta: 10.0 }),
        ],
    );
    let edited = editor().apply(&scenario, &base).unwrap();
    assert_cells_eq!(edited.cells(), [260.0, 270.0, 270.0, 260.0]);
}

#[test]
fn test_full_extent_mask() {
    let rasterizer = GeometryRasterizer::new(transformer(), EngineConfig::default());
    let grid = test_utils::identity_grid_4x4();
    let mask = rasterizer
        .rasterize(&Geometry::polygon(rings::square(0.0, 0.0, 4.0, 4.0)), crs::LOCAL, &grid)
        .unwrap();
    assert!(mask.is_full());

    let grid = geographic_grid_20x20();
    let mask = rasterizer
        .rasterize(&Geometry::rectangle(-10.0, -10.0, 10.0, 10.0), crs::EPSG_4326, &grid)
        .unwrap();
    assert!(mask.is_full());
}

#[test]
fn test_geometry_in_web_mercator_over_geographic_grid() {
    let t = transformer();
    let corners = t
        .transform_all(&[(-2.0, -2.0), (2.0, -2.0), (2.0, 2.0), (-2.0, 2.0)], crs::EPSG_4326, crs::EPSG_3857)
        .unwrap();
    assert!(corners[2].0 > 200_000.0);

    let grid = geographic_grid_20x20();
    let scenario = Scenario::new(
        "mercator patch",
        vec![Edit::new(Geometry::polygon(corners), crs::EPSG_3857, ValueRule::SetConstant { value: -1.0 })],
    );
    let edited = ScenarioEditor::new(t, EngineConfig::default()).apply(&scenario, &grid).unwrap();

    let changed: Vec<(usize, usize)> = (0..20)
        .flat_map(|row| (0..20).map(move |col| (col, row)))
        .filter(|&(col, row)| edited.get(col, row).unwrap() == -1.0)
        .collect();
    assert_eq!(changed.len(), 16);
    assert!(changed.iter().all(|&(c, r)| (8..12).contains(&c) && (8..12).contains(&r)));
}

#[test]
fn test_unknown_crs_fails_whole_scenario() {
    let base = test_utils::identity_grid_4x4();
    let scenario = Scenario::new(
        "partly unknown",
        vec![
            full_square(4.0, ValueRule::SetConstant { value: 0.0 }),
            Edit::new(Geometry::polygon(rings::unit_square()), "EPSG:31337", ValueRule::AddDelta { delta: 1.0 }),
        ],
    );
    let err = editor().apply(&scenario, &base).unwrap_err();
    assert_eq!(err.kind(), "UnknownCRS");
    assert_cells_eq!(base.cells(), [10.0; 16]);
}

#[test]
fn test_statistics_exclude_no_data() {
    let cells = with_no_data_stride(create_gradient_grid(5, 4, 0.0, 70.0), 3, no_data::NEGATIVE_9999);
    let grid = index_space_grid(5, 4, cells.clone(), Some(no_data::NEGATIVE_9999));
    let summary = StatisticsEngine::new(7).summarize(&grid, None).unwrap();

    let valid: Vec<f64> = cells.into_iter().filter(|v| *v != no_data::NEGATIVE_9999).collect();
    assert_eq!(summary.count, valid.len());
    assert_eq!(summary.excluded, 20 - valid.len());
    assert_eq!(summary.histogram.len(), 7);
    assert_eq!(summary.histogram.iter().map(|b| b.count).sum::<usize>(), valid.len());
    assert_approx_eq!(summary.sum, valid.iter().sum::<f64>(), 1e-9);
    assert_approx_eq!(summary.mean.unwrap(), summary.sum / valid.len() as f64, 1e-12);
}

#[test]
fn test_statistics_all_no_data() {
    let grid = index_space_grid(3, 3, vec![no_data::NEGATIVE_9999; 9], Some(no_data::NEGATIVE_9999));
    let summary = StatisticsEngine::default().summarize(&grid, None).unwrap();
    assert_eq!(summary.count, 0);
    assert_eq!(summary.excluded, 9);
    assert!(summary.min.is_none() && summary.max.is_none() && summary.mean.is_none());
    assert!(summary.histogram.is_empty());
}

#[test]
fn test_summary_serializes_to_json() {
    let grid = test_utils::identity_grid_4x4();
    let summary = StatisticsEngine::new(2).summarize(&grid, None).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["count"], 16);
    assert_eq!(json["mean"], 10.0);
    assert_eq!(json["histogram"][0]["count"], 16);
}

#[test]
fn test_session_over_branches() {
    let base = Arc::new(index_space_grid(4, 4, create_constant_grid(4, 4, 1.0), None));
    let editor = editor();
    let branches = vec![
        Scenario::new("raise", vec![full_square(4.0, ValueRule::AddDelta { delta: 3.0 })]),
        Scenario::new("lower", vec![full_square(4.0, ValueRule::AddDelta { delta: -3.0 })]),
    ];
    let results = editor.apply_branches(&branches, &base);
    assert_cells_eq!(results[0].as_ref().unwrap().cells(), [4.0; 16]);
    assert_cells_eq!(results[1].as_ref().unwrap().cells(), [-2.0; 16]);

    let mut session = EditingSession::new(editor, StatisticsEngine::default(), Arc::clone(&base)).unwrap();
    session.apply(branches[0].clone()).unwrap();
    assert_eq!(session.summary().mean, Some(4.0));
    session.revert().unwrap();
    assert_eq!(session.current(), base.as_ref());
}

fn rule_strategy() -> impl Strategy<Value = ValueRule> {
    prop_oneof![
        (-100.0..100.0f64).prop_map(|value| ValueRule::SetConstant { value }),
        (-100.0..100.0f64).prop_map(|delta| ValueRule::AddDelta { delta }),
        (-100.0..100.0f64, -100.0..100.0f64).prop_map(|(min, max)| ValueRule::ClampToRange { min, max }),
    ]
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    (0.0..8.0f64, 0.0..8.0f64, 0.5..8.0f64, 0.5..8.0f64, rule_strategy()).prop_map(|(x, y, w, h, rule)| {
        Edit::new(Geometry::rectangle(x, y, x + w, y + h), crs::LOCAL, rule)
    })
}

proptest! {
    #[test]
    fn no_data_cells_survive_any_scenario(
        edits in prop::collection::vec(edit_strategy(), 0..6),
        stride in 1usize..5,
        seed in any::<u32>(),
    ) {
        let cells = with_no_data_stride(
            test_utils::create_noise_grid(8, 8, seed, 50.0),
            stride,
            no_data::NEGATIVE_9999,
        );
        let base = index_space_grid(8, 8, cells, Some(no_data::NEGATIVE_9999));
        let edited = editor().apply(&Scenario::new("random", edits), &base).unwrap();

        for (before, after) in base.cells().iter().zip(edited.cells()) {
            if *before == no_data::NEGATIVE_9999 {
                prop_assert_eq!(*after, no_data::NEGATIVE_9999);
            }
        }
        prop_assert_eq!(edited.width(), base.width());
        prop_assert_eq!(edited.transform(), base.transform());
        prop_assert_eq!(edited.crs(), base.crs());
    }
}

#[test]
fn test_grid_outside_geometry_unchanged() {
    let base = RasterGrid::new(
        3,
        1,
        vec![1.0, 2.0, 3.0],
        AffineTransform::north_up(100.0, 50.0, 1.0, -1.0).unwrap(),
        None,
        crs::EPSG_4326,
    )
    .unwrap();
    let scenario = Scenario::new(
        "elsewhere",
        vec![Edit::new(Geometry::rectangle(0.0, 0.0, 1.0, 1.0), crs::EPSG_4326, ValueRule::SetConstant { value: 0.0 })],
    );
    assert_eq!(editor().apply(&scenario, &base).unwrap(), base);
}
