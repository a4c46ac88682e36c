use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A geo-tagged spot as displayed by the client.
///
/// Built only by the normalizer; field names on the wire match the names the
/// normalizer reads, so a serialized `Post` normalizes back to itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "username")]
    pub author_username: Option<String>,
    #[serde(rename = "user_id")]
    pub author_id: Option<String>,
    pub created_at: String,
    pub score: i64,
    pub user_vote: Vote,
    pub tags: Vec<String>,
}

impl Post {
    /// Both coordinates, or `None` when the post cannot be placed on a map.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    pub fn has_any_tag<'a, I>(&self, wanted: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        wanted
            .into_iter()
            .any(|tag| self.tags.iter().any(|own| own == tag))
    }
}

/// The viewer's vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Vote {
    Down,
    #[default]
    None,
    Up,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Self::Down => -1,
            Self::None => 0,
            Self::Up => 1,
        }
    }

    /// Maps any number onto the tri-state by sign. NaN counts as no vote.
    pub fn from_sign(raw: f64) -> Self {
        if raw > 0.0 {
            Self::Up
        } else if raw < 0.0 {
            Self::Down
        } else {
            Self::None
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "up" | "1" | "+1" => Some(Self::Up),
            "down" | "-1" => Some(Self::Down),
            "clear" | "none" | "0" => Some(Self::None),
            _ => None,
        }
    }

    /// Signed change to a score when moving from `self` to `next`.
    pub fn delta_to(self, next: Vote) -> i64 {
        next.value() - self.value()
    }
}

impl Serialize for Vote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

impl<'de> Deserialize<'de> for Vote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Ok(Self::from_sign(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A pin for the map screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub username: Option<String>,
}

pub const UNTITLED_SPOT: &str = "Untitled Spot";

impl MapMarker {
    pub fn from_post(post: &Post) -> Option<Self> {
        let coordinates = post.coordinates()?;
        let title = if post.title.is_empty() {
            UNTITLED_SPOT.to_string()
        } else {
            post.title.clone()
        };
        let description = (!post.description.is_empty()).then(|| post.description.clone());

        Some(Self {
            id: post.id.to_string(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            title,
            description,
            image_url: post.image_url.clone(),
            username: post.author_username.clone(),
        })
    }
}
