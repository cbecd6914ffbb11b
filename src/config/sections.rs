//! Ordered list of the display panel's sections. Both the panel (render
//! order) and the config editor (checkbox cards, drag-and-drop order)
//! consume this model; lookups go by kind, never by index.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The independently toggleable blocks of the display panel. The `Display`
/// strings double as checkbox labels on the config page.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Display)]
#[serde(rename_all = "camelCase")]
pub(crate) enum SectionKind {
    #[strum(serialize = "User profile")]
    UserProfile,
    #[strum(serialize = "Last seen playing")]
    LastGamePlaying,
    #[strum(serialize = "Rich presence")]
    RichPresence,
    #[strum(serialize = "Recent achievements list")]
    RecentAchievements,
    #[strum(serialize = "Recent mastered sets list")]
    MasteredSets,
}

/// One entry of the ordered section list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SectionDescriptor {
    pub kind: SectionKind,
    pub visible: bool,
    /// Dependent setting rendered under this section; only meaningful (and
    /// only editable) while the parent is visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_kind: Option<SectionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_visible: Option<bool>,
}

impl SectionDescriptor {
    fn simple(kind: SectionKind) -> Self {
        Self {
            kind,
            visible: true,
            child_kind: None,
            child_visible: None,
        }
    }
}

/// The default order the panel ships with.
pub(crate) fn default_sections() -> Vec<SectionDescriptor> {
    vec![
        SectionDescriptor::simple(SectionKind::UserProfile),
        SectionDescriptor {
            kind: SectionKind::LastGamePlaying,
            visible: true,
            child_kind: Some(SectionKind::RichPresence),
            child_visible: Some(true),
        },
        SectionDescriptor::simple(SectionKind::RecentAchievements),
        SectionDescriptor::simple(SectionKind::MasteredSets),
    ]
}

pub(crate) fn index_of(sections: &[SectionDescriptor], kind: SectionKind) -> Option<usize> {
    sections.iter().position(|s| s.kind == kind)
}

/// Visibility of the section with the given kind, if present.
pub(crate) fn setting_for(sections: &[SectionDescriptor], kind: SectionKind) -> Option<bool> {
    sections.iter().find(|s| s.kind == kind).map(|s| s.visible)
}

/// Visibility of the child setting hosted under the given parent kind.
pub(crate) fn child_setting_for(sections: &[SectionDescriptor], kind: SectionKind) -> Option<bool> {
    sections
        .iter()
        .find(|s| s.kind == kind)
        .and_then(|s| s.child_visible)
}

pub(crate) fn set_visible(sections: &mut [SectionDescriptor], kind: SectionKind, value: bool) {
    if let Some(section) = sections.iter_mut().find(|s| s.kind == kind) {
        section.visible = value;
    }
}

pub(crate) fn set_child_visible(sections: &mut [SectionDescriptor], kind: SectionKind, value: bool) {
    if let Some(section) = sections.iter_mut().find(|s| s.kind == kind) {
        if section.child_kind.is_some() {
            section.child_visible = Some(value);
        }
    }
}

/// Move the entry with the given kind to `to`, shifting everything between;
/// the relative order of all other entries is preserved. Out-of-range
/// targets clamp to the end of the list.
pub(crate) fn move_entry(sections: &mut Vec<SectionDescriptor>, kind: SectionKind, to: usize) {
    let Some(from) = index_of(sections, kind) else {
        return;
    };
    let entry = sections.remove(from);
    let to = to.min(sections.len());
    sections.insert(to, entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sections: &[SectionDescriptor]) -> Vec<SectionKind> {
        sections.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            kinds(&default_sections()),
            vec![
                SectionKind::UserProfile,
                SectionKind::LastGamePlaying,
                SectionKind::RecentAchievements,
                SectionKind::MasteredSets,
            ]
        );
    }

    #[test]
    fn test_lookups_by_kind() {
        let mut sections = default_sections();
        assert_eq!(index_of(&sections, SectionKind::MasteredSets), Some(3));
        assert_eq!(setting_for(&sections, SectionKind::UserProfile), Some(true));
        assert_eq!(setting_for(&sections, SectionKind::RichPresence), None);
        assert_eq!(
            child_setting_for(&sections, SectionKind::LastGamePlaying),
            Some(true)
        );

        set_visible(&mut sections, SectionKind::UserProfile, false);
        assert_eq!(
            setting_for(&sections, SectionKind::UserProfile),
            Some(false)
        );

        set_child_visible(&mut sections, SectionKind::LastGamePlaying, false);
        assert_eq!(
            child_setting_for(&sections, SectionKind::LastGamePlaying),
            Some(false)
        );
    }

    #[test]
    fn test_child_toggle_ignores_childless_sections() {
        let mut sections = default_sections();
        set_child_visible(&mut sections, SectionKind::UserProfile, true);
        assert_eq!(sections[0].child_visible, None);
    }

    #[test]
    fn test_move_first_to_last_preserves_relative_order() {
        let mut sections = default_sections();
        move_entry(&mut sections, SectionKind::UserProfile, 3);
        assert_eq!(
            kinds(&sections),
            vec![
                SectionKind::LastGamePlaying,
                SectionKind::RecentAchievements,
                SectionKind::MasteredSets,
                SectionKind::UserProfile,
            ]
        );
    }

    #[test]
    fn test_move_last_to_first_preserves_relative_order() {
        let mut sections = default_sections();
        move_entry(&mut sections, SectionKind::MasteredSets, 0);
        assert_eq!(
            kinds(&sections),
            vec![
                SectionKind::MasteredSets,
                SectionKind::UserProfile,
                SectionKind::LastGamePlaying,
                SectionKind::RecentAchievements,
            ]
        );
    }

    #[test]
    fn test_move_clamps_out_of_range_targets() {
        let mut sections = default_sections();
        move_entry(&mut sections, SectionKind::UserProfile, 99);
        assert_eq!(kinds(&sections).last(), Some(&SectionKind::UserProfile));
    }

    #[test]
    fn test_move_to_same_index_is_a_no_op() {
        let mut sections = default_sections();
        let before = kinds(&sections);
        move_entry(&mut sections, SectionKind::LastGamePlaying, 1);
        assert_eq!(kinds(&sections), before);
    }

    #[test]
    fn test_section_labels() {
        assert_eq!(SectionKind::UserProfile.to_string(), "User profile");
        assert_eq!(
            SectionKind::MasteredSets.to_string(),
            "Recent mastered sets list"
        );
    }
}
