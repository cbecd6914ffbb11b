//! Conversion of the service's loosely-typed wire shapes into the internal
//! model. Everything numeric arrives as a decimal string, booleans arrive as
//! `"0"`/`"1"` sentinels, and recent achievements arrive as a two-level map
//! keyed by game id and achievement id.

use crate::api::{ApiError, ApiResult, RA_URL};
use crate::models::{Achievement, CompletedGame, RecentlyPlayed, UserSummary};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RawLastActivity {
    #[serde(rename = "User", default)]
    pub user: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RawRecentlyPlayed {
    #[serde(rename = "ConsoleID", default)]
    pub console_id: String,
    #[serde(rename = "ConsoleName", default)]
    pub console_name: String,
    #[serde(rename = "GameID")]
    pub game_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "ImageIcon", default)]
    pub image_icon: String,
    #[serde(rename = "LastPlayed", default)]
    pub last_played: String,
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RawAchievement {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "GameID")]
    pub game_id: String,
    #[serde(rename = "GameTitle", default)]
    pub game_title: String,
    #[serde(rename = "Points")]
    pub points: String,
    #[serde(rename = "HardcoreAchieved")]
    pub hardcore_achieved: String,
    #[serde(rename = "IsAwarded")]
    pub is_awarded: String,
    #[serde(rename = "DateAwarded")]
    pub date_awarded: String,
    #[serde(rename = "BadgeName", default)]
    pub badge_name: String,
}

/// game id -> (achievement id -> achievement), in wire order.
type RawAchievementGroups = serde_json::Map<String, serde_json::Value>;

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RawUserSummary {
    #[serde(rename = "Rank")]
    pub rank: String,
    #[serde(rename = "TotalPoints")]
    pub total_points: String,
    #[serde(rename = "TotalTruePoints")]
    pub total_true_points: String,
    #[serde(rename = "RichPresenceMsg", default)]
    pub rich_presence_msg: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "RecentlyPlayed", default)]
    pub recently_played: Vec<RawRecentlyPlayed>,
    #[serde(rename = "UserPic")]
    pub user_pic: String,
    #[serde(rename = "LastGameID")]
    pub last_game_id: String,
    #[serde(rename = "LastActivity", default)]
    pub last_activity: Option<RawLastActivity>,
    #[serde(
        rename = "RecentAchievements",
        default,
        deserialize_with = "de_achievement_groups"
    )]
    pub recent_achievements: RawAchievementGroups,
}

/// The service emits an empty PHP array (`[]`) instead of an empty object
/// when the user has no recent achievements.
fn de_achievement_groups<'de, D>(de: D) -> Result<RawAchievementGroups, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(de)?;
    match v {
        serde_json::Value::Object(m) => Ok(m),
        serde_json::Value::Array(a) if a.is_empty() => Ok(serde_json::Map::new()),
        serde_json::Value::Null => Ok(serde_json::Map::new()),
        _ => Err(serde::de::Error::custom(
            "RecentAchievements: expected an object or an empty array",
        )),
    }
}

#[derive(Deserialize, Clone, Debug)]
pub(crate) struct RawCompletedGame {
    #[serde(rename = "GameID")]
    pub game_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "MaxPossible")]
    pub max_possible: String,
    #[serde(rename = "NumAwarded")]
    pub num_awarded: String,
    #[serde(rename = "HardcoreMode")]
    pub hardcore_mode: String,
    #[serde(rename = "ConsoleName", default)]
    pub console_name: String,
    #[serde(rename = "ImageIcon", default)]
    pub image_icon: String,
}

fn parse_u32(value: &str, field: &str) -> ApiResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::parse(format!("{field}: not a number: {value:?}")))
}

/// Asset paths come back relative to the site origin. No validation of the
/// result; the service owns the path.
fn asset_url(path: &str) -> String {
    format!("{RA_URL}{path}")
}

fn badge_url(badge_name: &str) -> String {
    format!("{RA_URL}/Badge/{badge_name}.png")
}

fn achievement(raw: RawAchievement) -> ApiResult<Achievement> {
    Ok(Achievement {
        points: parse_u32(&raw.points, "Points")?,
        // "0" really does mean earned-in-hardcore; the awarded flag below
        // uses the usual polarity.
        hardcore_achieved: raw.hardcore_achieved == "0",
        is_awarded: raw.is_awarded == "1",
        badge_url: badge_url(&raw.badge_name),
        id: raw.id,
        title: raw.title,
        description: raw.description,
        game_id: raw.game_id,
        game_title: raw.game_title,
        date_awarded: raw.date_awarded,
    })
}

/// Build a [`UserSummary`] from the wire shape. Total function: every
/// failure is reported as a parse error, nothing panics.
pub(crate) fn user_summary(raw: RawUserSummary) -> ApiResult<UserSummary> {
    let last_game_id = parse_u32(&raw.last_game_id, "LastGameID")?;

    // Flatten game id -> achievement id -> achievement, keeping wire order,
    // then sort newest first. The sort is stable, so equal timestamps keep
    // their encounter order.
    let mut achievements: Vec<Achievement> = Vec::new();
    for (game_id, group) in raw.recent_achievements.iter() {
        let group = group.as_object().ok_or_else(|| {
            ApiError::parse(format!("RecentAchievements[{game_id}]: expected an object"))
        })?;
        for (_, value) in group.iter() {
            let parsed: RawAchievement =
                serde_json::from_value(value.clone()).map_err(ApiError::parse)?;
            achievements.push(achievement(parsed)?);
        }
    }
    achievements.sort_by(|a, b| b.date_awarded.cmp(&a.date_awarded));

    let recently_played = raw
        .recently_played
        .into_iter()
        .map(|g| RecentlyPlayed {
            console_id: g.console_id,
            console_name: g.console_name,
            game_id: g.game_id,
            title: g.title,
            image_icon: g.image_icon,
            last_played: g.last_played,
        })
        .collect();

    Ok(UserSummary {
        username: raw.last_activity.map(|l| l.user).unwrap_or_default(),
        rank: raw.rank,
        total_points: raw.total_points,
        total_true_points: raw.total_true_points,
        rich_presence: raw.rich_presence_msg,
        status: raw.status,
        user_pic_url: asset_url(&raw.user_pic),
        last_game_id,
        recently_played,
        recent_achievements: achievements,
    })
}

pub(crate) fn completed_games(raw: Vec<RawCompletedGame>) -> ApiResult<Vec<CompletedGame>> {
    raw.into_iter()
        .map(|g| {
            Ok(CompletedGame {
                game_id: parse_u32(&g.game_id, "GameID")?,
                max_possible: parse_u32(&g.max_possible, "MaxPossible")?,
                num_awarded: parse_u32(&g.num_awarded, "NumAwarded")?,
                hardcore_mode: g.hardcore_mode == "1",
                icon_url: asset_url(&g.image_icon),
                title: g.title,
                console_name: g.console_name,
            })
        })
        .collect()
}

/// Reduce the completed-sets list to what the panel shows.
///
/// Only fully-earned sets qualify. With `include_softcore` off, only
/// hardcore (mastered) sets are kept. With it on, softcore completions
/// appear too, but when a game has both records the hardcore one wins,
/// keeping the first-encounter position.
pub(crate) fn mastered_sets(
    games: Vec<CompletedGame>,
    include_softcore: bool,
) -> Vec<CompletedGame> {
    let mut out: Vec<CompletedGame> = Vec::new();
    for game in games {
        if game.num_awarded != game.max_possible {
            continue;
        }
        if !include_softcore && !game.hardcore_mode {
            continue;
        }
        match out.iter_mut().find(|g| g.game_id == game.game_id) {
            Some(existing) => {
                if game.hardcore_mode && !existing.hardcore_mode {
                    *existing = game;
                }
            }
            None => out.push(game),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;

    fn raw_achievement_json(
        id: &str,
        date: &str,
        hardcore: &str,
        awarded: &str,
        points: &str,
    ) -> String {
        format!(
            r#"{{
                "ID": "{id}",
                "Title": "Achievement {id}",
                "Description": "Do the thing",
                "GameID": "504",
                "GameTitle": "Mega Man 2",
                "Points": "{points}",
                "HardcoreAchieved": "{hardcore}",
                "IsAwarded": "{awarded}",
                "DateAwarded": "{date}",
                "BadgeName": "05062"
            }}"#
        )
    }

    fn raw_summary_json(recent_achievements: &str) -> String {
        format!(
            r#"{{
                "Rank": "4071",
                "TotalPoints": "1234",
                "TotalTruePoints": "2468",
                "RichPresenceMsg": "Fighting Air Man",
                "Status": "Online",
                "RecentlyPlayed": [{{
                    "ConsoleID": "7",
                    "ConsoleName": "NES",
                    "GameID": "504",
                    "Title": "Mega Man 2",
                    "ImageIcon": "/Images/024519.png",
                    "LastPlayed": "2021-02-07 22:33:44",
                    "MyVote": null
                }}],
                "UserPic": "/UserPic/bdjeffyp.png",
                "LastGameID": "504",
                "LastActivity": {{ "User": "bdjeffyp" }},
                "RecentAchievements": {recent_achievements}
            }}"#
        )
    }

    fn summary_from(recent_achievements: &str) -> UserSummary {
        let raw: RawUserSummary =
            serde_json::from_str(&raw_summary_json(recent_achievements)).expect("raw should parse");
        user_summary(raw).expect("normalization should succeed")
    }

    #[test]
    fn test_hardcore_sentinel_is_inverted() {
        let group = format!(
            r#"{{"504": {{"1": {a}, "2": {b}}}}}"#,
            a = raw_achievement_json("1", "2021-02-07 22:00:00", "0", "1", "5"),
            b = raw_achievement_json("2", "2021-02-07 21:00:00", "1", "1", "5"),
        );
        let s = summary_from(&group);
        assert!(s.recent_achievements[0].hardcore_achieved);
        assert!(!s.recent_achievements[1].hardcore_achieved);
    }

    #[test]
    fn test_awarded_sentinel_is_not_inverted() {
        let group = format!(
            r#"{{"504": {{"1": {a}, "2": {b}}}}}"#,
            a = raw_achievement_json("1", "2021-02-07 22:00:00", "0", "1", "5"),
            b = raw_achievement_json("2", "2021-02-07 21:00:00", "0", "0", "5"),
        );
        let s = summary_from(&group);
        assert!(s.recent_achievements[0].is_awarded);
        assert!(!s.recent_achievements[1].is_awarded);
    }

    #[test]
    fn test_achievements_flatten_across_games_newest_first() {
        let group = format!(
            r#"{{
                "504": {{"1": {a}}},
                "637": {{"2": {b}}}
            }}"#,
            a = raw_achievement_json("1", "2021-02-01 10:00:00", "0", "1", "5"),
            b = raw_achievement_json("2", "2021-02-05 10:00:00", "0", "1", "10"),
        );
        let s = summary_from(&group);
        let ids: Vec<&str> = s.recent_achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_timestamp_ties_keep_wire_order() {
        let group = format!(
            r#"{{"504": {{"9": {a}, "3": {b}, "7": {c}}}}}"#,
            a = raw_achievement_json("9", "2021-02-07 22:00:00", "0", "1", "5"),
            b = raw_achievement_json("3", "2021-02-07 22:00:00", "0", "1", "5"),
            c = raw_achievement_json("7", "2021-02-07 22:00:00", "0", "1", "5"),
        );
        let s = summary_from(&group);
        let ids: Vec<&str> = s.recent_achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "3", "7"]);
    }

    #[test]
    fn test_empty_achievements_arrive_as_php_array() {
        let s = summary_from("[]");
        assert!(s.recent_achievements.is_empty());
    }

    #[test]
    fn test_badge_and_avatar_urls_are_absolute() {
        let group = format!(
            r#"{{"504": {{"1": {a}}}}}"#,
            a = raw_achievement_json("1", "2021-02-01 10:00:00", "0", "1", "5"),
        );
        let s = summary_from(&group);
        assert_eq!(
            s.user_pic_url,
            "https://retroachievements.org/UserPic/bdjeffyp.png"
        );
        assert_eq!(
            s.recent_achievements[0].badge_url,
            "https://retroachievements.org/Badge/05062.png"
        );
    }

    #[test]
    fn test_non_numeric_points_is_a_parse_failure() {
        let group = format!(
            r#"{{"504": {{"1": {a}}}}}"#,
            a = raw_achievement_json("1", "2021-02-01 10:00:00", "0", "1", "lots"),
        );
        let raw: RawUserSummary =
            serde_json::from_str(&raw_summary_json(&group)).expect("raw should parse");
        let err = user_summary(raw).expect_err("bad Points should fail");
        assert_eq!(err.kind, ApiErrorKind::Parse);
    }

    #[test]
    fn test_non_numeric_last_game_id_is_a_parse_failure() {
        let json = raw_summary_json("{}").replace("\"LastGameID\": \"504\"", "\"LastGameID\": \"n/a\"");
        let raw: RawUserSummary = serde_json::from_str(&json).expect("raw should parse");
        assert_eq!(
            user_summary(raw).expect_err("bad id should fail").kind,
            ApiErrorKind::Parse
        );
    }

    fn completed(game_id: u32, hardcore: bool, awarded: u32, possible: u32) -> CompletedGame {
        CompletedGame {
            game_id,
            title: format!("Game {game_id}"),
            max_possible: possible,
            num_awarded: awarded,
            hardcore_mode: hardcore,
            console_name: "NES".to_string(),
            icon_url: String::new(),
        }
    }

    #[test]
    fn test_completed_games_parses_sentinels_and_counts() {
        let json = r#"[{
            "GameID": "1",
            "Title": "Sonic the Hedgehog",
            "MaxPossible": "24",
            "NumAwarded": "24",
            "HardcoreMode": "1",
            "ConsoleName": "Mega Drive",
            "ImageIcon": "/Images/010139.png"
        }]"#;
        let raw: Vec<RawCompletedGame> = serde_json::from_str(json).expect("should parse");
        let games = completed_games(raw).expect("should normalize");
        assert_eq!(games[0].game_id, 1);
        assert_eq!(games[0].max_possible, 24);
        assert!(games[0].hardcore_mode);
        assert_eq!(
            games[0].icon_url,
            "https://retroachievements.org/Images/010139.png"
        );
    }

    #[test]
    fn test_hardcore_record_wins_on_conflict() {
        let games = vec![
            completed(1, true, 10, 10),
            completed(1, false, 10, 10),
            completed(2, false, 8, 8),
        ];
        let sets = mastered_sets(games, true);
        assert_eq!(sets.len(), 2);
        assert_eq!((sets[0].game_id, sets[0].hardcore_mode), (1, true));
        assert_eq!((sets[1].game_id, sets[1].hardcore_mode), (2, false));
    }

    #[test]
    fn test_hardcore_wins_regardless_of_record_order() {
        let games = vec![completed(1, false, 10, 10), completed(1, true, 10, 10)];
        let sets = mastered_sets(games, true);
        assert_eq!(sets.len(), 1);
        assert!(sets[0].hardcore_mode);
    }

    #[test]
    fn test_softcore_sets_hidden_unless_enabled() {
        let games = vec![completed(1, true, 10, 10), completed(2, false, 8, 8)];
        let sets = mastered_sets(games, false);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].game_id, 1);
    }

    #[test]
    fn test_partially_earned_sets_are_excluded() {
        let games = vec![completed(1, true, 9, 10), completed(2, true, 8, 8)];
        let sets = mastered_sets(games, true);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].game_id, 2);
    }
}
