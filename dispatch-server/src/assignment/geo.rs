//! Great-circle distance

use shared::order::GeoPoint;

/// Mean Earth radius (IUGG)
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Distance rounded to whole metres
///
/// Ranking compares at this resolution so that GPS jitter below a metre
/// does not decide between two partners.
pub fn distance_metres(a: GeoPoint, b: GeoPoint) -> u64 {
    (haversine_km(a, b) * 1000.0).round() as u64
}
