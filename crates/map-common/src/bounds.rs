//! Geographic coordinates and bounding boxes.

use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON position, which is ordered `[lon, lat, ...]`.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }
}

/// A geographic bounding box.
///
/// Coordinates are in degrees; the box never crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl LatLngBounds {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// Degenerate box covering a single point.
    pub fn from_point(point: LatLng) -> Self {
        Self::new(point.lat, point.lng, point.lat, point.lng)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut bounds: Option<Self> = None;
        for point in points {
            match bounds.as_mut() {
                Some(b) => b.extend(point),
                None => bounds = Some(Self::from_point(point)),
            }
        }
        bounds
    }

    /// Grow the box to include a point.
    pub fn extend(&mut self, point: LatLng) {
        self.min_lat = self.min_lat.min(point.lat);
        self.min_lng = self.min_lng.min(point.lng);
        self.max_lat = self.max_lat.max(point.lat);
        self.max_lng = self.max_lng.max(point.lng);
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        LatLngBounds {
            min_lat: self.min_lat.min(other.min_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lat: self.max_lat.max(other.max_lat),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Check if a point is contained within this box.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}
