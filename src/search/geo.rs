use std::cmp::Ordering;

use crate::models::job::Job;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Coordinates for cities we can resolve from free-text locations. Lookup is
/// a substring match against the lowercased location.
static CITY_COORDINATES: &[(&str, f64, f64)] = &[
    ("mumbai", 19.0760, 72.8777),
    ("bangalore", 12.9716, 77.5946),
    ("bengaluru", 12.9716, 77.5946),
    ("delhi", 28.7041, 77.1025),
    ("hyderabad", 17.3850, 78.4867),
    ("pune", 18.5204, 73.8567),
    ("chennai", 13.0827, 80.2707),
    ("kolkata", 22.5726, 88.3639),
    ("ahmedabad", 23.0225, 72.5714),
    ("gurgaon", 28.4595, 77.0266),
    ("gurugram", 28.4595, 77.0266),
    ("noida", 28.5355, 77.3910),
    ("london", 51.5074, -0.1278),
    ("manchester", 53.4808, -2.2426),
    ("new york", 40.7128, -74.0060),
    ("san francisco", 37.7749, -122.4194),
    ("dubai", 25.2048, 55.2708),
    ("toronto", 43.6532, -79.3832),
    ("sydney", -33.8688, 151.2093),
];

/// Great-circle distance in km, rounded to two decimals.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    (EARTH_RADIUS_KM * c * 100.0).round() / 100.0
}

pub fn locate(location: &str) -> Option<(f64, f64)> {
    let normalized = location.to_lowercase();
    CITY_COORDINATES
        .iter()
        .find(|(city, _, _)| normalized.contains(city))
        .map(|(_, lat, lng)| (*lat, *lng))
}

/// Annotates each job with its distance from the request point, drops
/// resolvable jobs outside the radius, and sorts nearest first. Jobs whose
/// location cannot be resolved keep a null distance and sort last; a radius
/// never drops them.
pub fn apply(jobs: &mut Vec<Job>, lat: f64, lng: f64, radius_km: Option<f64>) {
    for job in jobs.iter_mut() {
        job.distance =
            locate(&job.location).map(|(job_lat, job_lng)| haversine_km(lat, lng, job_lat, job_lng));
    }
    if let Some(radius) = radius_km {
        jobs.retain(|job| job.distance.is_none_or(|d| d <= radius));
    }
    jobs.sort_by(|a, b| match (a.distance, b.distance) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
