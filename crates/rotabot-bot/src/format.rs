//! User-facing texts.

use rotabot_core::types::{Participant, Poll};
use rotabot_roster::Assignment;

pub const GREETING: &str = "Hi! I'm RotaBot.\n\n\
Commands:\n\
/configure — set the participant list (@usernames)\n\
/assign — pick active members and make an assignment\n\
/roster — show the current participant list\n\
/cancel — abort the current operation\n\
/reset — forget the participant list and the rotation";

pub const ASK_ROSTER: &str = "Send the participant list separated by spaces, commas or new lines.\n\
Example: @alice, @bob, @carol";
pub const NO_ROSTER: &str = "No participants configured yet. Use /configure first.";
pub const UNRECOGNISED_ROSTER: &str =
    "Could not recognise any participant. Try again with /configure.";
pub const SELECT_ACTIVE: &str = "Select the active participants for this round:";
pub const CHOOSE_POLICY: &str = "Choose the assignment policy:";
pub const CHOOSE_COUNT: &str = "How many participants should be assigned?";
pub const ASK_DESCRIPTION: &str = "Enter the task description (free text).";
pub const ASK_CHANNEL: &str =
    "Enter the target channel (as @channel_username) to post the assignment to.";
pub const BAD_CHANNEL: &str =
    "Expected a channel name like @channel_username. Please try again.";
pub const CANCELLED: &str = "Operation cancelled.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const RESET_DONE: &str = "Participant list and rotation cleared. Use /configure to start over.";
pub const NOT_ADMIN: &str = "Only bot admins can do that.";
pub const NOT_OWNER: &str = "This assignment was started by someone else.";
pub const NO_DIALOG: &str = "This assignment is no longer active. Start again with /assign.";
pub const UNKNOWN_ACTION: &str = "Unknown action";
pub const CHANNEL_POST_FAILED: &str =
    "Could not post to the channel. Check the bot's rights and the channel name.";

/// `• @a` bullet list, or a dash when empty.
pub fn user_list(participants: &[Participant]) -> String {
    if participants.is_empty() {
        return "—".into();
    }
    participants
        .iter()
        .map(|p| format!("• {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn roster_saved(participants: &[Participant]) -> String {
    format!("Participant list saved:\n{}", user_list(participants))
}

pub fn current_roster(participants: &[Participant]) -> String {
    format!("Current participants:\n{}", user_list(participants))
}

pub fn default_roster_applied(participants: &[Participant]) -> String {
    format!(
        "No participant list was set. Using the default participants:\n{}",
        user_list(participants)
    )
}

/// Channel post announcing the assignees.
pub fn assignment_post(assignment: &Assignment, description: &str) -> String {
    format!("Assigned: {}\n{}", assignment.joined(), description)
        .trim()
        .to_string()
}

pub fn assignment_confirmed(assignment: &Assignment, channel: &str) -> String {
    format!(
        "Posted to {channel} ({}): {}",
        assignment.policy,
        assignment.joined()
    )
}

pub fn selection_failed(reason: &str) -> String {
    format!("Could not make the assignment: {reason}")
}

/// Completion poll posted as a reply to the assignment.
pub fn completion_poll(reply_to: i64) -> Poll {
    Poll {
        question: "Mark completion".into(),
        options: vec!["✔️ Done".into(), "⏳ In progress".into()],
        anonymous: false,
        multiple_answers: true,
        reply_to: Some(reply_to),
    }
}
