use crate::config::{MAX_ACHIEVEMENTS_TO_SHOW, MIN_ACHIEVEMENTS_TO_SHOW};

/// Parse the achievements-to-show field. `None` means the text is not an
/// integer and the committed value must stay untouched; anything numeric is
/// clamped into range.
pub(crate) fn clamp_achievement_count(raw: &str) -> Option<u32> {
    let n: i64 = raw.trim().parse().ok()?;
    Some(n.clamp(i64::from(MIN_ACHIEVEMENTS_TO_SHOW), i64::from(MAX_ACHIEVEMENTS_TO_SHOW)) as u32)
}

/// Per-field error messages for the config form. Save stays disabled while
/// any of them is set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FieldErrors {
    pub username: Option<&'static str>,
    pub api_key: Option<&'static str>,
    pub count: Option<&'static str>,
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.username.is_some() || self.api_key.is_some() || self.count.is_some()
    }
}

/// Recomputed on every keystroke.
pub(crate) fn validate_fields(username: &str, api_key: &str, count_raw: &str) -> FieldErrors {
    FieldErrors {
        username: username
            .trim()
            .is_empty()
            .then_some("Username is required"),
        api_key: api_key.trim().is_empty().then_some("API key is required"),
        count: clamp_achievement_count(count_raw)
            .is_none()
            .then_some("Enter a whole number from 1 to 30"),
    }
}
