//! End-to-end tests for area zonal statistics on small synthetic grids.

use approx::assert_relative_eq;
use geo::Rect;
use zonalis_algorithms::statistics::{
    compute_area_zonal_stats, AggregationSpec, AreaZonal, AreaZonalInput, AreaZonalParams,
    AreaZonalStats,
};
use zonalis_core::{Algorithm, AttributeValue, Error, Feature, FeatureCollection, CRS};

const UTM_31N: u32 = 32631;

fn square(x: f64, y: f64, w: f64, h: f64) -> Feature {
    Feature::new(Rect::new((x, y), (x + w, y + h)))
}

fn table(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection::from_features(features).with_crs(CRS::from_epsg(UTM_31N))
}

/// Three AOI cells in a row; the third has no data under it
fn aoi() -> FeatureCollection {
    table(vec![
        square(0.0, 0.0, 10.0, 10.0).with_id("cell-a"),
        square(10.0, 0.0, 10.0, 10.0).with_id("cell-b"),
        square(100.0, 100.0, 10.0, 10.0).with_id("cell-c"),
    ])
    .with_index_name("cell_id")
}

/// Two data polygons: one exactly on cell-a, one covering 60% of cell-b
fn data() -> FeatureCollection {
    table(vec![
        square(0.0, 0.0, 10.0, 10.0)
            .with_property("population", 100_i64)
            .with_property("density", 8.0),
        square(10.0, 0.0, 6.0, 10.0)
            .with_property("population", 30_i64)
            .with_property("density", 5.0),
    ])
}

fn run(aggregations: &[AggregationSpec], params: AreaZonalParams) -> AreaZonalStats {
    compute_area_zonal_stats(&aoi(), &data(), aggregations, params).unwrap()
}

fn col(result: &AreaZonalStats, name: &str) -> Vec<f64> {
    result
        .column(name)
        .unwrap_or_else(|| panic!("missing column {name}"))
}

#[test]
fn rows_and_index_follow_aoi() {
    let result = run(
        &[AggregationSpec::new("population", ["sum", "mean", "max"])],
        AreaZonalParams::default(),
    );

    assert_eq!(result.len(), 3);
    assert_eq!(
        result.features.index(),
        vec![Some("cell-a"), Some("cell-b"), Some("cell-c")]
    );
    assert_eq!(result.features.index_name.as_deref(), Some("cell_id"));
    assert_eq!(result.features.crs, Some(CRS::from_epsg(UTM_31N)));
    assert_eq!(
        result.columns,
        vec![
            "intersect_area_sum",
            "population_sum",
            "population_mean",
            "population_max"
        ]
    );
}

#[test]
fn area_is_conserved_on_exact_cover() {
    let result = run(
        &[AggregationSpec::new("population", "sum")],
        AreaZonalParams::default(),
    );

    let covered = col(&result, "intersect_area_sum");
    assert_relative_eq!(covered[0], 100.0, epsilon = 1e-9);
    assert_relative_eq!(covered[1], 60.0, epsilon = 1e-9);
    assert!(covered[2].is_nan());

    // pct_data is 1 for both data polygons
    let sums = col(&result, "population_sum");
    assert_relative_eq!(sums[0], 100.0, epsilon = 1e-9);
    assert_relative_eq!(sums[1], 30.0, epsilon = 1e-9);
}

#[test]
fn aoi_inside_data_polygon() {
    let aoi = table(vec![square(2.0, 2.0, 2.0, 2.0)]);
    let data = table(vec![square(0.0, 0.0, 10.0, 10.0).with_property("population", 100_i64)]);
    let specs = [AggregationSpec::new("population", ["sum", "aoi_sum", "raw_sum"])
        .with_output(vec!["by_data", "by_aoi", "raw"])];

    let result = compute_area_zonal_stats(&aoi, &data, &specs, AreaZonalParams::default()).unwrap();

    // 4 of the data polygon's 100 square units fall in the AOI
    assert_relative_eq!(col(&result, "by_data")[0], 4.0, epsilon = 1e-9);
    // the AOI is entirely covered, so pct_aoi is 1
    assert_relative_eq!(col(&result, "by_aoi")[0], 100.0, epsilon = 1e-9);
    assert_relative_eq!(col(&result, "raw")[0], 100.0, epsilon = 1e-9);
}

#[test]
fn mean_defaults_to_aoi_apportionment() {
    let aoi = table(vec![square(0.0, 0.0, 10.0, 10.0)]);
    let data = table(vec![
        square(0.0, 0.0, 5.0, 10.0).with_property("density", 10.0),
        square(5.0, 0.0, 5.0, 10.0).with_property("density", 20.0),
    ]);
    let specs = [AggregationSpec::new("density", ["mean", "raw_mean"])
        .with_output(vec!["weighted", "plain"])];

    let result = compute_area_zonal_stats(&aoi, &data, &specs, AreaZonalParams::default()).unwrap();

    // apportioned values 0.5 * 10 and 0.5 * 20
    assert_relative_eq!(col(&result, "weighted")[0], 7.5, epsilon = 1e-9);
    assert_relative_eq!(col(&result, "plain")[0], 15.0, epsilon = 1e-9);
}

#[test]
fn min_is_zeroed_on_partial_cover() {
    let specs = [AggregationSpec::new("density", "min")];

    let fixed = run(&specs, AreaZonalParams::default());
    let mins = col(&fixed, "density_min");
    assert_eq!(mins[0], 8.0);
    assert_eq!(mins[1], 0.0); // cell-b is only 60% covered
    assert_eq!(mins[2], 0.0); // no coverage at all

    let params = AreaZonalParams {
        fix_min: false,
        ..Default::default()
    };
    let raw = run(&specs, params);
    let mins = col(&raw, "density_min");
    assert_eq!(mins[1], 5.0);
    assert!(mins[2].is_nan());
}

#[test]
fn imputed_sum_extrapolates_to_full_area() {
    let aoi = table(vec![square(0.0, 0.0, 10.0, 10.0)]);
    let data = table(vec![square(0.0, 0.0, 4.0, 10.0).with_property("count", 20_i64)]);
    let specs = [AggregationSpec::new("count", ["sum", "imputed_sum"])
        .with_output(vec!["observed", "imputed"])];

    let result = compute_area_zonal_stats(&aoi, &data, &specs, AreaZonalParams::default()).unwrap();

    assert_relative_eq!(col(&result, "observed")[0], 20.0, epsilon = 1e-9);
    assert_relative_eq!(col(&result, "imputed")[0], 50.0, epsilon = 1e-9);
}

#[test]
fn unmatched_aoi_gets_fill_value() {
    let specs = [
        AggregationSpec::new("population", ["sum", "max"])
            .with_fillna(vec![true, false]),
        AggregationSpec::new("density", "mean")
            .with_output("avg_density")
            .with_fillna(-1.0),
        AggregationSpec::new("density", "imputed_sum").with_fillna(true),
    ];
    let result = run(&specs, AreaZonalParams::default());

    assert_eq!(col(&result, "population_sum")[2], 0.0);
    assert!(col(&result, "population_max")[2].is_nan());
    assert_eq!(col(&result, "avg_density")[2], -1.0);
    // imputation runs after filling and has no coverage to scale by
    assert!(col(&result, "density_sum")[2].is_nan());
}

#[test]
fn include_intersect_drops_only_that_column() {
    let specs = [AggregationSpec::new("population", ["sum", "min"])];
    let with = run(&specs, AreaZonalParams::default());
    let without = run(
        &specs,
        AreaZonalParams {
            include_intersect: false,
            ..Default::default()
        },
    );

    let mut expected = with.columns.clone();
    expected.retain(|c| c != "intersect_area_sum");
    assert_eq!(without.columns, expected);
    assert_eq!(col(&without, "population_min"), col(&with, "population_min"));
    assert!(without.features.features[0]
        .get_property("intersect_area_sum")
        .is_none());
}

#[test]
fn empty_aggregations_yield_intersect_area_only() {
    let result = run(&[], AreaZonalParams::default());
    assert_eq!(result.columns, vec!["intersect_area_sum"]);

    let result = run(
        &[],
        AreaZonalParams {
            include_intersect: false,
            ..Default::default()
        },
    );
    assert!(result.columns.is_empty());
    assert_eq!(result.features.features, aoi().features);
}

#[test]
fn aoi_attributes_are_kept() {
    let mut aoi = aoi();
    aoi.features[0].set_property("name", AttributeValue::from("north"));
    let result =
        compute_area_zonal_stats(&aoi, &data(), &[], AreaZonalParams::default()).unwrap();
    assert_eq!(
        result.features.features[0].get_property("name"),
        Some(&AttributeValue::from("north"))
    );
    assert_eq!(
        result.features.features[0].geometry,
        aoi.features[0].geometry
    );
}

#[test]
fn repeated_runs_are_identical() {
    let specs = [
        AggregationSpec::new("population", ["sum", "imputed_mean", "median", "std"]),
        AggregationSpec::new("density", ["first", "last", "count"]),
    ];
    let a = run(&specs, AreaZonalParams::default());
    let b = run(&specs, AreaZonalParams::default());

    assert_eq!(a.columns, b.columns);
    for name in &a.columns {
        let bits = |r: &AreaZonalStats| -> Vec<u64> {
            col(r, name).iter().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b), "column {name}");
    }
}

#[test]
fn geographic_crs_is_rejected() {
    let geographic = aoi().with_crs(CRS::wgs84());
    let err = compute_area_zonal_stats(&geographic, &data(), &[], AreaZonalParams::default())
        .unwrap_err();
    assert_eq!(
        err,
        Error::GeographicCrs {
            role: "aoi",
            crs: "EPSG:4326".into()
        }
    );

    let geographic = data().with_crs(CRS::from_epsg(4269));
    let err = compute_area_zonal_stats(&aoi(), &geographic, &[], AreaZonalParams::default())
        .unwrap_err();
    assert!(matches!(err, Error::GeographicCrs { role: "data", .. }));
}

#[test]
fn geographic_crs_outside_4xxx_is_rejected() {
    // GDA2020 and NAD83(2011) are geographic despite their codes
    for code in [7844, 6318] {
        let geographic = aoi().with_crs(CRS::from_epsg(code));
        let err = compute_area_zonal_stats(&geographic, &data(), &[], AreaZonalParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            Error::GeographicCrs {
                role: "aoi",
                crs: format!("EPSG:{code}")
            }
        );
    }

    let geodetic = CRS::from_wkt(
        r#"GEODCRS["GDA2020",DATUM["GDA2020",ELLIPSOID["GRS 1980",6378137,298.257222101]],
        CS[ellipsoidal,2],AXIS["latitude",north],AXIS["longitude",east]]"#,
    );
    let err = compute_area_zonal_stats(
        &aoi(),
        &data().with_crs(geodetic),
        &[],
        AreaZonalParams::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::GeographicCrs { role: "data", .. }));
}

#[test]
fn projected_crs_in_4xxx_is_accepted() {
    // World Equidistant Cylindrical, in metres
    let eqc = CRS::from_epsg(4087);
    let aoi = aoi().with_crs(eqc.clone());
    let data = data().with_crs(eqc);
    let result = compute_area_zonal_stats(&aoi, &data, &[], AreaZonalParams::default()).unwrap();
    assert_relative_eq!(col(&result, "intersect_area_sum")[0], 100.0, epsilon = 1e-9);
}

#[test]
fn unrecognized_crs_is_rejected() {
    let unknown = aoi().with_crs(CRS::from_epsg(1));
    let err = compute_area_zonal_stats(&unknown, &data(), &[], AreaZonalParams::default())
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnknownCrs {
            role: "aoi",
            crs: "EPSG:1".into()
        }
    );
}

#[test]
fn data_attribute_named_intersect_area() {
    let data = table(vec![
        square(0.0, 0.0, 10.0, 10.0).with_property("intersect_area", 7.0)
    ]);
    let specs = [AggregationSpec::new("intersect_area", ["max", "raw_mean"])];
    let result = compute_area_zonal_stats(&aoi(), &data, &specs, AreaZonalParams::default())
        .unwrap();

    // the attribute is read, not the computed overlap area
    assert_eq!(col(&result, "intersect_area_max")[0], 7.0);
    assert_eq!(col(&result, "intersect_area_mean")[0], 7.0);
    assert_relative_eq!(col(&result, "intersect_area_sum")[0], 100.0, epsilon = 1e-9);
}

#[test]
fn missing_crs_is_rejected() {
    let mut bare = aoi();
    bare.crs = None;
    let err = compute_area_zonal_stats(&bare, &data(), &[], AreaZonalParams::default())
        .unwrap_err();
    assert_eq!(err, Error::MissingCrs { role: "aoi" });
}

#[test]
fn spec_errors_come_before_geometry_work() {
    let mut data = data();
    data.push(Feature::new(geo::Point::new(1.0, 1.0)));

    let err = compute_area_zonal_stats(
        &aoi(),
        &data,
        &[AggregationSpec::new("households", "sum")],
        AreaZonalParams::default(),
    )
    .unwrap_err();
    assert_eq!(err, Error::UnknownColumn("households".into()));

    let err = compute_area_zonal_stats(&aoi(), &data, &[], AreaZonalParams::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedGeometry { role: "data", row: 2, .. }
    ));
}

#[test]
fn data_is_reprojected_into_aoi_crs() {
    // A 1 km AOI square on the zone 31 central meridian near the equator
    let aoi = table(vec![square(500_000.0, 0.0, 1_000.0, 1_000.0)]);
    // A Web Mercator polygon comfortably containing it
    let data = FeatureCollection::from_features(vec![
        square(320_000.0, -5_000.0, 30_000.0, 10_000.0).with_property("density", 2.0),
    ])
    .with_crs(CRS::web_mercator());
    let specs = [AggregationSpec::new("density", ["raw_max", "aoi_sum"])];

    let result = compute_area_zonal_stats(&aoi, &data, &specs, AreaZonalParams::default()).unwrap();

    assert_relative_eq!(col(&result, "intersect_area_sum")[0], 1_000_000.0, max_relative = 1e-6);
    assert_eq!(col(&result, "density_max")[0], 2.0);
    assert_relative_eq!(col(&result, "density_sum")[0], 2.0, max_relative = 1e-6);
}

#[test]
fn unsupported_reprojection_is_an_error() {
    let data = data().with_crs(CRS::from_epsg(2154));
    let err = compute_area_zonal_stats(&aoi(), &data, &[], AreaZonalParams::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedTransform { .. }));
}

#[test]
fn algorithm_trait_runs_with_defaults() {
    let algo = AreaZonal;
    assert_eq!(algo.name(), "AreaZonalStats");

    let input = AreaZonalInput {
        aoi: aoi(),
        data: data(),
        aggregations: vec![AggregationSpec::new("population", "sum")],
    };
    let result = algo.execute_default(input).unwrap();
    assert_relative_eq!(col(&result, "population_sum")[1], 30.0, epsilon = 1e-9);
}

#[test]
fn specs_load_from_json() {
    let specs: Vec<AggregationSpec> = serde_json::from_str(
        r#"[
            {
                "column": "population",
                "func": ["data_sum", "raw_min"],
                "output": ["pop", "pop_min"],
                "fillna": [true, true]
            },
            {"column": "density", "func": "imputed_mean"}
        ]"#,
    )
    .unwrap();
    let result = run(&specs, AreaZonalParams::default());

    assert_eq!(
        result.columns,
        vec!["intersect_area_sum", "pop", "pop_min", "density_mean"]
    );
    assert_eq!(col(&result, "pop_min"), vec![100.0, 0.0, 0.0]);
    // cell-b: mean of pct_aoi * density = 0.6 * 5, imputed by 100 / 60
    assert_relative_eq!(col(&result, "density_mean")[1], 5.0, epsilon = 1e-9);
}
