//! Rooms and tracks of a conference.

use common::{RoomId, TrackId};
use serde::{Deserialize, Serialize};

/// A room events can be scheduled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub size: Option<u32>,
    pub public: bool,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(),
            name: name.into(),
            size: None,
            public: true,
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// A thematic track grouping events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Display color as a hex string, e.g. "fefd7f".
    pub color: Option<String>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
