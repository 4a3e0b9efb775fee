//! Keyboards shown during the conversation.

use rotabot_core::types::{InlineButton, Keyboard, Participant, Policy};

use crate::callback::CallbackAction;

pub const MENU_CONFIGURE: &str = "Configure Participants";
pub const MENU_ASSIGN: &str = "Assign Participants";

/// Persistent reply keyboard with the two main actions.
pub fn main_menu() -> Keyboard {
    Keyboard::Reply(vec![vec![MENU_CONFIGURE.into(), MENU_ASSIGN.into()]])
}

/// One checkbox row per roster member plus a Next / Cancel row.
pub fn toggle_members(roster: &[Participant], active: &[Participant]) -> Keyboard {
    let mut rows: Vec<Vec<InlineButton>> = roster
        .iter()
        .map(|member| {
            let mark = if active.contains(member) { "✅" } else { "☑️" };
            vec![InlineButton::new(
                format!("{mark} {member}"),
                CallbackAction::Toggle(member.clone()).to_string(),
            )]
        })
        .collect();
    rows.push(vec![
        InlineButton::new("Next ▶️", CallbackAction::Next.to_string()),
        InlineButton::new("Cancel", CallbackAction::Cancel.to_string()),
    ]);
    Keyboard::Inline(rows)
}

pub fn policies() -> Keyboard {
    Keyboard::Inline(vec![
        [Policy::Rotating, Policy::Random]
            .into_iter()
            .map(|p| InlineButton::new(p.label(), CallbackAction::Policy(p).to_string()))
            .collect(),
        vec![InlineButton::new("Cancel", CallbackAction::Cancel.to_string())],
    ])
}

/// Count buttons `1..=max`.
pub fn counts(max: usize) -> Keyboard {
    Keyboard::Inline(vec![
        (1..=max.max(1))
            .map(|n| InlineButton::new(n.to_string(), CallbackAction::Count(n).to_string()))
            .collect(),
        vec![InlineButton::new("Cancel", CallbackAction::Cancel.to_string())],
    ])
}
