//! Great-circle distance for the geographic modifier.

use crate::domain::GeoPoint;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROOKLYN: GeoPoint = GeoPoint {
        latitude: 40.6782,
        longitude: -73.9442,
    };
    const PHILADELPHIA: GeoPoint = GeoPoint {
        latitude: 39.9526,
        longitude: -75.1652,
    };

    #[test]
    fn zero_distance_for_identical_points() {
        assert!(haversine_km(BROOKLYN, BROOKLYN) < 1e-9);
    }

    #[test]
    fn brooklyn_to_philadelphia_is_about_130_km() {
        let distance = haversine_km(BROOKLYN, PHILADELPHIA);
        assert!((125.0..135.0).contains(&distance), "got {distance}");
    }

    #[test]
    fn distance_is_symmetric() {
        let forward = haversine_km(BROOKLYN, PHILADELPHIA);
        let backward = haversine_km(PHILADELPHIA, BROOKLYN);
        assert!((forward - backward).abs() < 1e-9);
    }
}
