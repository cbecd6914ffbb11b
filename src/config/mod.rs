pub(crate) mod sections;
pub(crate) mod validate;

use crate::config::sections::{default_sections, SectionDescriptor};
use serde::{Deserialize, Serialize};

/// Configuration-service version key; must match what is registered on the
/// Twitch developer console.
pub(crate) const EXT_CONFIG_VERSION: &str = "1.3.0";

/// Default number of recent achievements to display.
pub(crate) const DEFAULT_ACHIEVEMENT_COUNT: u32 = 5;

pub(crate) const MIN_ACHIEVEMENTS_TO_SHOW: u32 = 1;
// TODO: Determine the actual max the service accepts. 30 seems good so far.
pub(crate) const MAX_ACHIEVEMENTS_TO_SHOW: u32 = 30;

/// Broadcaster-facing settings, persisted as one JSON blob in the host
/// configuration store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppConfig {
    pub username: String,
    pub api_key: String,
    pub num_achievements_to_show: u32,
    pub show_completed_with_mastered: bool,
    pub sections: Vec<SectionDescriptor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            api_key: String::new(),
            num_achievements_to_show: DEFAULT_ACHIEVEMENT_COUNT,
            show_completed_with_mastered: false,
            sections: default_sections(),
        }
    }
}

impl AppConfig {
    /// Decode the persisted blob, falling back to defaults when it is
    /// absent or unreadable, then fill any missing field.
    pub fn from_stored(content: Option<&str>) -> Self {
        let Some(content) = content else {
            return Self::default();
        };
        match serde_json::from_str::<PartialConfig>(content) {
            Ok(partial) => reconcile(partial, &Self::default()),
            Err(_) => Self::default(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Wire shape of the persisted blob: after a schema upgrade any field may be
/// missing.
#[derive(Deserialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct PartialConfig {
    pub username: Option<String>,
    pub api_key: Option<String>,
    pub num_achievements_to_show: Option<u32>,
    pub show_completed_with_mastered: Option<bool>,
    pub sections: Option<Vec<SectionDescriptor>>,
}

/// Field-by-field merge of a possibly-partial stored config over defaults.
///
/// An empty string, a zero count, or an explicit `false` is treated the same
/// as a missing key and falls back to the default value. The section list is
/// substituted wholesale when missing; a present list is taken as-is.
pub(crate) fn reconcile(partial: PartialConfig, defaults: &AppConfig) -> AppConfig {
    AppConfig {
        username: partial
            .username
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.username.clone()),
        api_key: partial
            .api_key
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| defaults.api_key.clone()),
        num_achievements_to_show: partial
            .num_achievements_to_show
            .filter(|n| *n != 0)
            .unwrap_or(defaults.num_achievements_to_show),
        show_completed_with_mastered: partial
            .show_completed_with_mastered
            .filter(|b| *b)
            .unwrap_or(defaults.show_completed_with_mastered),
        sections: partial
            .sections
            .unwrap_or_else(|| defaults.sections.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sections::SectionKind;

    #[test]
    fn test_missing_sections_get_the_full_default_list() {
        let merged = AppConfig::from_stored(Some(
            r#"{"username":"bdjeffyp","apiKey":"k","numAchievementsToShow":10}"#,
        ));
        assert_eq!(merged.username, "bdjeffyp");
        assert_eq!(merged.num_achievements_to_show, 10);
        assert_eq!(merged.sections.len(), 4);
        assert_eq!(merged.sections[0].kind, SectionKind::UserProfile);
        assert_eq!(merged.sections[1].kind, SectionKind::LastGamePlaying);
        assert_eq!(merged.sections[2].kind, SectionKind::RecentAchievements);
        assert_eq!(merged.sections[3].kind, SectionKind::MasteredSets);
    }

    #[test]
    fn test_zero_count_falls_back_to_default() {
        // 0 is indistinguishable from a missing key under the truthy merge.
        let merged = AppConfig::from_stored(Some(r#"{"numAchievementsToShow":0}"#));
        assert_eq!(merged.num_achievements_to_show, DEFAULT_ACHIEVEMENT_COUNT);
    }

    #[test]
    fn test_explicit_false_falls_back_to_default() {
        let merged = AppConfig::from_stored(Some(r#"{"showCompletedWithMastered":false}"#));
        assert!(!merged.show_completed_with_mastered);

        let merged = AppConfig::from_stored(Some(r#"{"showCompletedWithMastered":true}"#));
        assert!(merged.show_completed_with_mastered);
    }

    #[test]
    fn test_empty_username_falls_back_to_default() {
        let merged = AppConfig::from_stored(Some(r#"{"username":""}"#));
        assert_eq!(merged.username, "");

        let merged = AppConfig::from_stored(Some(r#"{"username":"bdjeffyp"}"#));
        assert_eq!(merged.username, "bdjeffyp");
    }

    #[test]
    fn test_malformed_blob_yields_defaults() {
        let merged = AppConfig::from_stored(Some("not json {"));
        assert_eq!(merged, AppConfig::default());
    }

    #[test]
    fn test_absent_blob_yields_defaults() {
        assert_eq!(AppConfig::from_stored(None), AppConfig::default());
    }

    #[test]
    fn test_present_sections_are_taken_as_is() {
        let merged = AppConfig::from_stored(Some(
            r#"{"sections":[{"kind":"masteredSets","visible":false}]}"#,
        ));
        assert_eq!(merged.sections.len(), 1);
        assert_eq!(merged.sections[0].kind, SectionKind::MasteredSets);
        assert!(!merged.sections[0].visible);
    }

    #[test]
    fn test_round_trip_uses_camel_case_keys() {
        let json = AppConfig::default().to_json();
        assert!(json.contains("\"apiKey\""));
        assert!(json.contains("\"numAchievementsToShow\""));
        assert!(json.contains("\"showCompletedWithMastered\""));
        assert!(json.contains("\"userProfile\""));

        let back = AppConfig::from_stored(Some(&json));
        assert_eq!(back, AppConfig::default());
    }
}
