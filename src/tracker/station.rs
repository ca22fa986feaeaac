use geo::{Distance, Geodesic, Point};

/// The fixed observer position that range rings are centred on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Station {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    /// Parse a `"lat, lon"` pair in decimal degrees.
    pub fn from_coordinates(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon))
    }

    /// WGS-84 geodesic distance in meters to the given position.
    pub fn distance_m(&self, latitude_deg: f64, longitude_deg: f64) -> f64 {
        let here = Point::new(self.longitude_deg, self.latitude_deg);
        let there = Point::new(longitude_deg, latitude_deg);
        Geodesic.distance(here, there)
    }
}
