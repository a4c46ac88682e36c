/// Labels the app knows how to color. Posts may carry others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Food,
    Scenic,
    Hangout,
    Nature,
}

impl Tag {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "food" => Some(Self::Food),
            "scenic" => Some(Self::Scenic),
            "hangout" => Some(Self::Hangout),
            "nature" => Some(Self::Nature),
            _ => None,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Food => "#F97316",
            Self::Scenic => "#22C55E",
            Self::Hangout => "#3B82F6",
            Self::Nature => "#16A34A",
        }
    }
}

/// Display color for a raw label; `None` for labels outside the vocabulary.
pub fn tag_color(label: &str) -> Option<&'static str> {
    Tag::from_label(label).map(|tag| tag.color())
}
