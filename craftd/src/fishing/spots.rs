//! Fishing spot table

use serde::{Deserialize, Serialize};

use crate::domain::Vec3;

/// A known valid fishing location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishingSpot {
    pub name: String,
    pub position: Vec3,
}

impl FishingSpot {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Nearest spot within `radius` of `from`, if any
pub fn nearest_spot<'a>(from: &Vec3, radius: f32, spots: &'a [FishingSpot]) -> Option<&'a FishingSpot> {
    spots
        .iter()
        .map(|s| (s, from.distance_to(&s.position)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(s, _)| s)
}

/// Built-in demo spot table
pub fn default_spots() -> Vec<FishingSpot> {
    vec![
        FishingSpot::new("riverbank", Vec3::new(40.0, 0.0, -12.0)),
        FishingSpot::new("pier", Vec3::new(-85.0, 2.0, 60.0)),
        FishingSpot::new("tidepool", Vec3::new(320.0, -1.0, 110.0)),
    ]
}
