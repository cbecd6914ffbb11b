use serde::{Deserialize, Serialize};

/// Rank value the service reports for users that have no rank yet.
pub(crate) const UNRANKED_SENTINEL: &str = "0";

/// One game from the user's recently-played list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecentlyPlayed {
    pub console_id: String,
    pub console_name: String,
    pub game_id: String,
    pub title: String,
    /// Icon path relative to the service origin.
    pub image_icon: String,
    pub last_played: String,
}

/// A single achievement, flattened out of the per-game grouping the service
/// uses on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub game_id: String,
    pub game_title: String,
    pub points: u32,
    /// `"0"` on the wire means earned-in-hardcore. The polarity is the
    /// opposite of `is_awarded`; both are kept exactly as the service
    /// defines them.
    pub hardcore_achieved: bool,
    pub is_awarded: bool,
    /// `YYYY-MM-DD HH:MM:SS`; lexicographic order is chronological order.
    pub date_awarded: String,
    /// Absolute badge image URL.
    pub badge_url: String,
}

/// Snapshot of a user's profile built from one summary poll.
///
/// Constructed fresh each refresh cycle and replaced wholesale; nothing
/// mutates it after normalization.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct UserSummary {
    pub username: String,
    /// Overall site rank as reported; `"0"` means unranked.
    pub rank: String,
    pub total_points: String,
    pub total_true_points: String,
    pub rich_presence: String,
    pub status: String,
    /// Absolute avatar URL.
    pub user_pic_url: String,
    pub last_game_id: u32,
    pub recently_played: Vec<RecentlyPlayed>,
    /// Newest first; ties keep wire order.
    pub recent_achievements: Vec<Achievement>,
}

impl UserSummary {
    pub fn is_ranked(&self) -> bool {
        self.rank != UNRANKED_SENTINEL
    }

    /// The recently-played entry matching `last_game_id`, falling back to
    /// the head of the list when the id is missing from it.
    pub fn last_game(&self) -> Option<&RecentlyPlayed> {
        let id = self.last_game_id.to_string();
        self.recently_played
            .iter()
            .find(|g| g.game_id == id)
            .or_else(|| self.recently_played.first())
    }
}

/// A fully-earned achievement set for one game.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct CompletedGame {
    pub game_id: u32,
    pub title: String,
    pub max_possible: u32,
    pub num_awarded: u32,
    /// Standard sentinel (`"1"` on the wire means hardcore), unlike the
    /// inverted per-achievement flag.
    pub hardcore_mode: bool,
    pub console_name: String,
    /// Absolute icon URL.
    pub icon_url: String,
}
