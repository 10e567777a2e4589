//! Integration tests for the SVY21 transform and geohash derivation.

use carpark_core::Location;
use carpark_core::spatial::{SVY21, project_to_geographic, project_to_grid, spatial_hash};
use geo::Coord;
use rstest::rstest;

fn grid(easting: f64, northing: f64) -> Coord<f64> {
    Coord {
        x: easting,
        y: northing,
    }
}

fn shared_prefix(left: &str, right: &str) -> usize {
    left.bytes()
        .zip(right.bytes())
        .take_while(|(a, b)| a == b)
        .count()
}

#[rstest]
fn known_facility_lands_in_singapore() {
    // Aliwal Street, as published in the facility feed.
    let location = project_to_geographic(grid(31_045.6165, 31_694.0055)).expect("projects");
    assert!((103.6..104.1).contains(&location.longitude));
    assert!((1.15..1.48).contains(&location.latitude));

    let hash = spatial_hash(location.latitude, location.longitude).expect("hashes");
    assert!(hash.starts_with("w2"), "unexpected hash {hash}");
}

#[rstest]
fn hashes_of_projected_neighbours_share_prefixes() {
    let anchor = project_to_geographic(grid(30_000.0, 30_000.0)).expect("anchor");
    let near = project_to_geographic(grid(30_010.0, 30_000.0)).expect("near");
    let far = project_to_geographic(grid(40_000.0, 30_000.0)).expect("far");

    let anchor_hash = spatial_hash(anchor.latitude, anchor.longitude).expect("anchor hash");
    let near_hash = spatial_hash(near.latitude, near.longitude).expect("near hash");
    let far_hash = spatial_hash(far.latitude, far.longitude).expect("far hash");

    assert!(shared_prefix(&anchor_hash, &near_hash) >= 6);
    assert!(shared_prefix(&anchor_hash, &near_hash) > shared_prefix(&anchor_hash, &far_hash));
}

#[rstest]
#[case(Location::new(103.8198, 1.3521))]
#[case(Location::new(103.9915, 1.3644))]
fn geographic_round_trip(#[case] location: Location) {
    let position = project_to_grid(location).expect("forward");
    let back = SVY21.to_geographic(position).expect("inverse");
    assert!((back.longitude - location.longitude).abs() < 1.0e-8);
    assert!((back.latitude - location.latitude).abs() < 1.0e-8);
}
