//! Update handler — routes commands, dialog text and button presses.

use rotabot_core::config::RosterConfig;
use rotabot_core::error::{Result, RotaError};
use rotabot_core::traits::Messenger;
use rotabot_core::types::{
    ChatTarget, Incoming, IncomingCallback, IncomingMessage, Keyboard, Participant,
    parse_participants,
};
use rotabot_roster::{Assignment, RotaBook, Roster};
use rotabot_security::Allowlist;
use tokio::sync::Mutex;

use crate::callback::CallbackAction;
use crate::dialog::{Dialog, Dialogs, Step};
use crate::format;
use crate::keyboard::{self, MENU_ASSIGN, MENU_CONFIGURE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Configure,
    Assign,
    Roster,
    Cancel,
    Reset,
}

/// Recognise `/cmd`, `/cmd@BotName` and the reply-keyboard labels.
fn parse_command(text: &str) -> Option<Command> {
    match text {
        MENU_CONFIGURE => return Some(Command::Configure),
        MENU_ASSIGN => return Some(Command::Assign),
        _ => {}
    }
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    match name.to_lowercase().as_str() {
        "start" | "help" => Some(Command::Start),
        "configure" => Some(Command::Configure),
        "assign" => Some(Command::Assign),
        "roster" => Some(Command::Roster),
        "cancel" => Some(Command::Cancel),
        "reset" => Some(Command::Reset),
        _ => None,
    }
}

fn is_channel_name(text: &str) -> bool {
    text.len() > 1 && text.starts_with('@') && !text.chars().any(char::is_whitespace)
}

/// What a button press does to the keyboard message.
enum Outcome {
    Keyboard(Keyboard),
    Text(&'static str, Option<Keyboard>),
    Cancelled,
}

fn apply(
    dialog: &mut Dialog,
    action: CallbackAction,
    roster: &[Participant],
    limit: usize,
) -> Result<Outcome> {
    match action {
        CallbackAction::Toggle(p) => {
            dialog.toggle(&p, roster)?;
            Ok(Outcome::Keyboard(keyboard::toggle_members(roster, &dialog.active)))
        }
        CallbackAction::Next => {
            dialog.confirm_active()?;
            Ok(Outcome::Text(format::CHOOSE_POLICY, Some(keyboard::policies())))
        }
        CallbackAction::Policy(policy) => {
            dialog.choose_policy(policy)?;
            Ok(Outcome::Text(
                format::CHOOSE_COUNT,
                Some(keyboard::counts(dialog.max_count(limit))),
            ))
        }
        CallbackAction::Count(n) => {
            dialog.choose_count(n, limit)?;
            Ok(Outcome::Text(format::ASK_DESCRIPTION, None))
        }
        CallbackAction::Cancel => Ok(Outcome::Cancelled),
    }
}

fn alert_text(err: &RotaError) -> String {
    match err {
        RotaError::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[derive(Default)]
struct BotState {
    book: RotaBook,
    dialogs: Dialogs,
}

/// The assignment bot, generic over the outbound messenger.
pub struct Bot<M: Messenger> {
    messenger: M,
    allowlist: Allowlist,
    defaults: Vec<Participant>,
    max_count: usize,
    state: Mutex<BotState>,
}

impl<M: Messenger> Bot<M> {
    pub fn new(messenger: M, allowlist: Allowlist, roster: &RosterConfig) -> Result<Self> {
        let defaults = roster.default_participants()?;
        if !defaults.is_empty() {
            Roster::new(defaults.clone())?;
        }
        Ok(Self {
            messenger,
            allowlist,
            defaults,
            max_count: roster.max_count,
            state: Mutex::new(BotState::default()),
        })
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Current roster of a chat.
    pub async fn roster(&self, chat_id: i64) -> Vec<Participant> {
        self.state.lock().await.book.roster(chat_id).to_vec()
    }

    /// Handle one update. Failures are logged, never propagated.
    pub async fn handle(&self, incoming: Incoming) {
        let chat_id = incoming.chat_id();
        let result = match incoming {
            Incoming::Message(msg) => self.on_message(msg).await,
            Incoming::Callback(cb) => self.on_callback(cb).await,
        };
        match result {
            Ok(()) => {}
            Err(e) if e.is_user_error() => tracing::warn!("Chat {chat_id}: {e}"),
            Err(e) => tracing::error!(
                "Chat {chat_id}: failed to handle update via {}: {e}",
                self.messenger.name()
            ),
        }
    }

    async fn reply(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i64> {
        self.messenger
            .send_text(&ChatTarget::Id(chat_id), text, keyboard)
            .await
    }

    async fn on_message(&self, msg: IncomingMessage) -> Result<()> {
        let text = msg.text.trim();
        let Some(command) = parse_command(text) else {
            return self.on_text(&msg, text).await;
        };
        tracing::debug!("Chat {}: command {command:?} from {}", msg.chat_id, msg.sender.id);

        if matches!(
            command,
            Command::Configure | Command::Assign | Command::Cancel | Command::Reset
        ) && !self.allowlist.is_allowed(&msg.sender)
        {
            self.reply(msg.chat_id, format::NOT_ADMIN, None).await?;
            return Ok(());
        }

        match command {
            Command::Start => {
                self.reply(msg.chat_id, format::GREETING, Some(&keyboard::main_menu()))
                    .await?;
            }
            Command::Configure => {
                self.state
                    .lock()
                    .await
                    .dialogs
                    .expect_config(msg.chat_id, msg.sender.id);
                self.reply(msg.chat_id, format::ASK_ROSTER, Some(&keyboard::main_menu()))
                    .await?;
            }
            Command::Assign => self.start_assign(&msg).await?,
            Command::Roster => {
                let roster = self.roster(msg.chat_id).await;
                let text = if roster.is_empty() {
                    format::NO_ROSTER.to_string()
                } else {
                    format::current_roster(&roster)
                };
                self.reply(msg.chat_id, &text, None).await?;
            }
            Command::Cancel => {
                let dropped = self.state.lock().await.dialogs.cancel(msg.chat_id);
                let text = if dropped { format::CANCELLED } else { format::NOTHING_TO_CANCEL };
                self.reply(msg.chat_id, text, Some(&keyboard::main_menu()))
                    .await?;
            }
            Command::Reset => {
                let reset = {
                    let mut state = self.state.lock().await;
                    state.dialogs.cancel(msg.chat_id);
                    state.book.reset(msg.chat_id)
                };
                let text = if reset { format::RESET_DONE } else { format::NO_ROSTER };
                self.reply(msg.chat_id, text, Some(&keyboard::main_menu()))
                    .await?;
            }
        }
        Ok(())
    }

    async fn start_assign(&self, msg: &IncomingMessage) -> Result<()> {
        let chat_id = msg.chat_id;
        let (seeded, roster) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let seeded = state.book.ensure_default(chat_id, &self.defaults)?;
            let roster = state.book.roster(chat_id).to_vec();
            if !roster.is_empty() {
                state.dialogs.start(chat_id, msg.sender.id);
            }
            (seeded, roster)
        };

        if roster.is_empty() {
            self.reply(chat_id, format::NO_ROSTER, None).await?;
            return Ok(());
        }
        if seeded {
            self.reply(chat_id, &format::default_roster_applied(&roster), None)
                .await?;
        }

        let message_id = self
            .reply(
                chat_id,
                format::SELECT_ACTIVE,
                Some(&keyboard::toggle_members(&roster, &[])),
            )
            .await?;
        if let Some(dialog) = self.state.lock().await.dialogs.get_mut(chat_id)
            && dialog.owner == msg.sender.id
        {
            dialog.keyboard_message = Some(message_id);
        }
        Ok(())
    }

    /// Free text: a pending roster, a description or a target channel.
    async fn on_text(&self, msg: &IncomingMessage, text: &str) -> Result<()> {
        let chat_id = msg.chat_id;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.dialogs.take_config(chat_id, msg.sender.id) {
            let reply = match parse_participants(text) {
                Ok(list) if list.is_empty() => format::UNRECOGNISED_ROSTER.to_string(),
                Ok(list) => match state.book.configure(chat_id, list) {
                    Ok(()) => format::roster_saved(state.book.roster(chat_id)),
                    Err(e) => format!("{}. Try again with /configure.", alert_text(&e)),
                },
                Err(e) => format!("{}. Try again with /configure.", alert_text(&e)),
            };
            drop(guard);
            self.reply(chat_id, &reply, Some(&keyboard::main_menu()))
                .await?;
            return Ok(());
        }

        let Some(dialog) = state.dialogs.get_mut(chat_id) else {
            return Ok(());
        };
        if dialog.owner != msg.sender.id {
            return Ok(());
        }

        let step = dialog.step;
        match step {
            Step::AwaitDescription => {
                dialog.set_description(text)?;
                drop(guard);
                self.reply(chat_id, format::ASK_CHANNEL, Some(&keyboard::main_menu()))
                    .await?;
            }
            Step::AwaitChannel if !is_channel_name(text) => {
                drop(guard);
                self.reply(chat_id, format::BAD_CHANNEL, None).await?;
            }
            Step::AwaitChannel => {
                let request = dialog.request();
                state.dialogs.finish(chat_id);
                let selected = request.and_then(|req| {
                    state
                        .book
                        .select(chat_id, &req.active, req.policy, req.count)
                        .map(|assignment| (assignment, req.description))
                });
                drop(guard);

                match selected {
                    Ok((assignment, description)) => {
                        self.post_assignment(chat_id, &assignment, &description, text)
                            .await?;
                    }
                    Err(e) => {
                        tracing::warn!("Chat {chat_id}: selection failed: {e}");
                        self.reply(chat_id, &format::selection_failed(&alert_text(&e)), None)
                            .await?;
                    }
                }
            }
            // Buttons drive the other steps.
            Step::SelectActive | Step::ChoosePolicy | Step::ChooseCount => {}
        }
        Ok(())
    }

    /// Post the assignment and its completion poll, then confirm to the requester.
    async fn post_assignment(
        &self,
        chat_id: i64,
        assignment: &Assignment,
        description: &str,
        channel: &str,
    ) -> Result<()> {
        let target = ChatTarget::Username(channel.to_string());
        let post = format::assignment_post(assignment, description);

        let post_id = match self.messenger.send_text(&target, &post, None).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to post assignment to {channel}: {e}");
                self.reply(chat_id, format::CHANNEL_POST_FAILED, None).await?;
                return Ok(());
            }
        };

        if let Err(e) = self
            .messenger
            .send_poll(&target, &format::completion_poll(post_id))
            .await
        {
            tracing::warn!("Failed to create completion poll in {channel}: {e}");
        }

        tracing::info!("Assignment posted to {channel}: {}", assignment.joined());
        self.reply(
            chat_id,
            &format::assignment_confirmed(assignment, channel),
            Some(&keyboard::main_menu()),
        )
        .await?;
        Ok(())
    }

    async fn on_callback(&self, cb: IncomingCallback) -> Result<()> {
        let Some(action) = CallbackAction::parse(&cb.data) else {
            return self
                .messenger
                .answer_callback(&cb.callback_id, Some(format::UNKNOWN_ACTION), true)
                .await;
        };
        if !self.allowlist.is_allowed(&cb.sender) {
            return self
                .messenger
                .answer_callback(&cb.callback_id, Some(format::NOT_ADMIN), true)
                .await;
        }

        let chat_id = cb.chat_id;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let roster = state.book.roster(chat_id).to_vec();

        let Some(dialog) = state.dialogs.get_mut(chat_id) else {
            drop(guard);
            return self
                .messenger
                .answer_callback(&cb.callback_id, Some(format::NO_DIALOG), true)
                .await;
        };
        if dialog.owner != cb.sender.id {
            drop(guard);
            return self
                .messenger
                .answer_callback(&cb.callback_id, Some(format::NOT_OWNER), true)
                .await;
        }

        let message_id = cb.message_id.or(dialog.keyboard_message);
        let outcome = apply(dialog, action, &roster, self.max_count);
        if matches!(outcome, Ok(Outcome::Cancelled)) {
            state.dialogs.finish(chat_id);
        }
        drop(guard);

        let chat = ChatTarget::Id(chat_id);
        let shown = match outcome {
            Ok(Outcome::Keyboard(kb)) => match message_id {
                Some(id) => self.messenger.edit_keyboard(&chat, id, &kb).await,
                None => self.reply(chat_id, format::SELECT_ACTIVE, Some(&kb)).await.map(|_| ()),
            },
            Ok(Outcome::Text(text, kb)) => self.show(chat_id, message_id, text, kb.as_ref()).await,
            Ok(Outcome::Cancelled) => self.show(chat_id, message_id, format::CANCELLED, None).await,
            Err(e) => {
                return self
                    .messenger
                    .answer_callback(&cb.callback_id, Some(&alert_text(&e)), true)
                    .await;
            }
        };
        if let Err(e) = shown {
            tracing::warn!("Chat {chat_id}: failed to update keyboard message: {e}");
        }
        self.messenger
            .answer_callback(&cb.callback_id, None, false)
            .await
    }

    /// Edit the keyboard message in place, or send a new one if it is unknown.
    async fn show(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        match message_id {
            Some(id) => {
                self.messenger
                    .edit_text(&ChatTarget::Id(chat_id), id, text, keyboard)
                    .await
            }
            None => self.reply(chat_id, text, keyboard).await.map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rotabot_core::config::SecurityConfig;
    use rotabot_core::types::{IncomingCallback, Poll, Sender};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    const CHAT: i64 = 100;
    const LEAD: i64 = 1;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Text { chat: ChatTarget, text: String, keyboard: Option<Keyboard> },
        Edit { message_id: i64, text: String },
        EditKeyboard { message_id: i64, keyboard: Keyboard },
        Answer { text: Option<String>, alert: bool },
        Poll { chat: ChatTarget, poll: Poll },
    }

    #[derive(Default)]
    struct FakeMessenger {
        calls: StdMutex<Vec<Call>>,
        next_id: AtomicI64,
        fail_channel_posts: bool,
    }

    impl FakeMessenger {
        fn take(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }

        fn push(&self, call: Call) -> i64 {
            self.calls.lock().unwrap().push(call);
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        }
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        fn name(&self) -> &str {
            "fake"
        }

        async fn send_text(
            &self,
            chat: &ChatTarget,
            text: &str,
            keyboard: Option<&Keyboard>,
        ) -> Result<i64> {
            if self.fail_channel_posts && matches!(chat, ChatTarget::Username(_)) {
                return Err(RotaError::Channel("chat not found".into()));
            }
            Ok(self.push(Call::Text {
                chat: chat.clone(),
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            }))
        }

        async fn edit_text(
            &self,
            _chat: &ChatTarget,
            message_id: i64,
            text: &str,
            _keyboard: Option<&Keyboard>,
        ) -> Result<()> {
            self.push(Call::Edit { message_id, text: text.to_string() });
            Ok(())
        }

        async fn edit_keyboard(
            &self,
            _chat: &ChatTarget,
            message_id: i64,
            keyboard: &Keyboard,
        ) -> Result<()> {
            self.push(Call::EditKeyboard { message_id, keyboard: keyboard.clone() });
            Ok(())
        }

        async fn answer_callback(
            &self,
            _callback_id: &str,
            text: Option<&str>,
            alert: bool,
        ) -> Result<()> {
            self.push(Call::Answer { text: text.map(String::from), alert });
            Ok(())
        }

        async fn send_poll(&self, chat: &ChatTarget, poll: &Poll) -> Result<i64> {
            Ok(self.push(Call::Poll { chat: chat.clone(), poll: poll.clone() }))
        }
    }

    fn sender(id: i64) -> Sender {
        Sender {
            id,
            username: Some(format!("user{id}")),
            display_name: format!("User {id}"),
        }
    }

    fn text(from: i64, body: &str) -> Incoming {
        Incoming::Message(IncomingMessage {
            chat_id: CHAT,
            message_id: 0,
            sender: sender(from),
            text: body.to_string(),
            timestamp: chrono::Utc::now(),
        })
    }

    fn press(from: i64, data: &str) -> Incoming {
        Incoming::Callback(IncomingCallback {
            callback_id: "cb".into(),
            chat_id: CHAT,
            message_id: Some(500),
            sender: sender(from),
            data: data.to_string(),
        })
    }

    fn bot_with(messenger: FakeMessenger, admins: &[&str], defaults: &[&str]) -> Bot<FakeMessenger> {
        let allowlist = Allowlist::new(&SecurityConfig {
            admins: admins.iter().map(|s| s.to_string()).collect(),
        });
        let roster = RosterConfig {
            default: defaults.iter().map(|s| s.to_string()).collect(),
            max_count: 3,
        };
        Bot::new(messenger, allowlist, &roster).unwrap()
    }

    fn bot() -> Bot<FakeMessenger> {
        bot_with(FakeMessenger::default(), &[], &[])
    }

    fn texts(calls: &[Call]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::Text { text, .. } | Call::Edit { text, .. } => Some(text.clone()),
                Call::Answer { text: Some(text), .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn configure(bot: &Bot<FakeMessenger>, roster: &str) {
        bot.handle(text(LEAD, "/configure")).await;
        bot.handle(text(LEAD, roster)).await;
        bot.messenger().take();
    }

    async fn run_assignment(bot: &Bot<FakeMessenger>, active: &[&str], policy: &str, count: usize) {
        bot.handle(text(LEAD, "/assign")).await;
        for member in active {
            bot.handle(press(LEAD, &format!("toggle::{member}"))).await;
        }
        bot.handle(press(LEAD, "next")).await;
        bot.handle(press(LEAD, &format!("policy::{policy}"))).await;
        bot.handle(press(LEAD, &format!("count::{count}"))).await;
        bot.handle(text(LEAD, "Weekly support duty")).await;
        bot.handle(text(LEAD, "@ops")).await;
    }

    fn channel_posts(calls: &[Call]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::Text { chat: ChatTarget::Username(_), text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/assign@RotaBot"), Some(Command::Assign));
        assert_eq!(parse_command("Configure Participants"), Some(Command::Configure));
        assert_eq!(parse_command("/reset"), Some(Command::Reset));
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command("@alice"), None);
    }

    #[tokio::test]
    async fn test_start_shows_menu() {
        let bot = bot();
        bot.handle(text(LEAD, "/start")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Text {
                chat: ChatTarget::Id(CHAT),
                text: format::GREETING.into(),
                keyboard: Some(keyboard::main_menu()),
            }]
        );
    }

    #[tokio::test]
    async fn test_configure_saves_roster() {
        let bot = bot();
        bot.handle(text(LEAD, "/configure")).await;
        bot.handle(text(LEAD, "@alice, bob\ncarol")).await;

        let roster: Vec<String> = bot.roster(CHAT).await.iter().map(|p| p.to_string()).collect();
        assert_eq!(roster, vec!["@alice", "@bob", "@carol"]);
        let calls = bot.messenger().take();
        assert!(texts(&calls).last().unwrap().starts_with("Participant list saved"));
    }

    #[tokio::test]
    async fn test_configure_rejects_duplicates() {
        let bot = bot();
        configure(&bot, "@x @y").await;
        bot.handle(text(LEAD, "/configure")).await;
        bot.handle(text(LEAD, "@a @a @b")).await;

        let calls = bot.messenger().take();
        assert!(texts(&calls).last().unwrap().contains("duplicate participant @a"));
        let roster: Vec<String> = bot.roster(CHAT).await.iter().map(|p| p.to_string()).collect();
        assert_eq!(roster, vec!["@x", "@y"]);
    }

    #[tokio::test]
    async fn test_configure_only_consumes_starters_message() {
        let bot = bot();
        bot.handle(text(LEAD, "/configure")).await;
        bot.handle(text(2, "@intruder")).await;
        assert!(bot.roster(CHAT).await.is_empty());
        bot.handle(text(LEAD, "@a")).await;
        assert_eq!(bot.roster(CHAT).await.len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected() {
        let bot = bot_with(FakeMessenger::default(), &["@user1"], &[]);
        bot.handle(text(2, "/assign")).await;
        bot.handle(text(2, "/configure")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::NOT_ADMIN, format::NOT_ADMIN]);

        bot.handle(text(LEAD, "/configure")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::ASK_ROSTER]);
    }

    #[tokio::test]
    async fn test_full_rotating_assignment() {
        let bot = bot();
        configure(&bot, "@a @b @c").await;

        run_assignment(&bot, &["@a", "@c"], "round", 1).await;
        let calls = bot.messenger().take();
        assert_eq!(channel_posts(&calls), vec!["Assigned: @a\nWeekly support duty"]);

        let poll = calls
            .iter()
            .find_map(|c| match c {
                Call::Poll { chat, poll } => Some((chat.clone(), poll.clone())),
                _ => None,
            })
            .expect("poll sent");
        assert_eq!(poll.0, ChatTarget::Username("@ops".into()));
        assert!(poll.1.reply_to.is_some());
        assert!(texts(&calls).last().unwrap().starts_with("Posted to @ops"));

        // Rotation resumes after @a; @b is inactive so @c is next.
        run_assignment(&bot, &["@a", "@c"], "round", 1).await;
        let calls = bot.messenger().take();
        assert_eq!(channel_posts(&calls), vec!["Assigned: @c\nWeekly support duty"]);
    }

    #[tokio::test]
    async fn test_random_assignment_picks_requested_count() {
        let bot = bot();
        configure(&bot, "@a @b @c").await;
        run_assignment(&bot, &["@a", "@b", "@c"], "random", 2).await;
        let calls = bot.messenger().take();
        let posts = channel_posts(&calls);
        assert_eq!(posts.len(), 1);
        let line = posts[0].lines().next().unwrap();
        assert_eq!(line.matches('@').count(), 2);
    }

    #[tokio::test]
    async fn test_toggle_edits_keyboard() {
        let bot = bot();
        configure(&bot, "@a @b").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.messenger().take();

        bot.handle(press(LEAD, "toggle::@b")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls[0],
            Call::EditKeyboard {
                message_id: 500,
                keyboard: keyboard::toggle_members(
                    &[Participant::parse("@a").unwrap(), Participant::parse("@b").unwrap()],
                    &[Participant::parse("@b").unwrap()],
                ),
            }
        );
        assert_eq!(calls[1], Call::Answer { text: None, alert: false });
    }

    #[tokio::test]
    async fn test_next_without_selection_alerts() {
        let bot = bot();
        configure(&bot, "@a @b").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.messenger().take();

        bot.handle(press(LEAD, "next")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer {
                text: Some("Select at least one participant".into()),
                alert: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_assign_without_roster() {
        let bot = bot();
        bot.handle(text(LEAD, "/assign")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::NO_ROSTER]);
    }

    #[tokio::test]
    async fn test_assign_seeds_default_roster() {
        let bot = bot_with(FakeMessenger::default(), &[], &["@d1", "d2"]);
        bot.handle(text(LEAD, "/assign")).await;
        let calls = bot.messenger().take();
        let all = texts(&calls);
        assert!(all[0].starts_with("No participant list was set"));
        assert_eq!(all[1], format::SELECT_ACTIVE);
        assert_eq!(bot.roster(CHAT).await.len(), 2);
    }

    #[tokio::test]
    async fn test_channel_post_failure_is_reported() {
        let messenger = FakeMessenger {
            fail_channel_posts: true,
            ..FakeMessenger::default()
        };
        let bot = bot_with(messenger, &[], &[]);
        configure(&bot, "@a @b").await;
        run_assignment(&bot, &["@a"], "round", 1).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls).last().unwrap(), format::CHANNEL_POST_FAILED);
        assert!(!calls.iter().any(|c| matches!(c, Call::Poll { .. })));
    }

    #[tokio::test]
    async fn test_bad_channel_reprompts_and_keeps_dialog() {
        let bot = bot();
        configure(&bot, "@a").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.handle(press(LEAD, "toggle::@a")).await;
        bot.handle(press(LEAD, "next")).await;
        bot.handle(press(LEAD, "policy::round")).await;
        bot.handle(press(LEAD, "count::1")).await;
        bot.handle(text(LEAD, "Deploy")).await;
        bot.handle(text(LEAD, "ops channel")).await;
        bot.messenger().take();

        bot.handle(text(LEAD, "@ops")).await;
        let calls = bot.messenger().take();
        assert_eq!(channel_posts(&calls), vec!["Assigned: @a\nDeploy"]);
    }

    #[tokio::test]
    async fn test_stale_and_foreign_callbacks() {
        let bot = bot();
        bot.handle(press(LEAD, "next")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer { text: Some(format::NO_DIALOG.into()), alert: true }]
        );

        configure(&bot, "@a").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.messenger().take();
        bot.handle(press(2, "toggle::@a")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer { text: Some(format::NOT_OWNER.into()), alert: true }]
        );
    }

    #[tokio::test]
    async fn test_cancel_button_drops_dialog() {
        let bot = bot();
        configure(&bot, "@a").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.handle(press(LEAD, "cancel")).await;
        let calls = bot.messenger().take();
        assert!(calls.contains(&Call::Edit { message_id: 500, text: format::CANCELLED.into() }));

        bot.handle(press(LEAD, "next")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer { text: Some(format::NO_DIALOG.into()), alert: true }]
        );
    }

    #[tokio::test]
    async fn test_assign_supersedes_pending_configure() {
        let bot = bot();
        configure(&bot, "@a @b @c").await;
        bot.handle(text(LEAD, "/configure")).await;

        run_assignment(&bot, &["@a"], "round", 1).await;
        let roster: Vec<String> = bot.roster(CHAT).await.iter().map(|p| p.to_string()).collect();
        assert_eq!(roster, vec!["@a", "@b", "@c"]);
        let calls = bot.messenger().take();
        assert_eq!(channel_posts(&calls), vec!["Assigned: @a\nWeekly support duty"]);
    }

    #[tokio::test]
    async fn test_configure_supersedes_pending_assign() {
        let bot = bot();
        configure(&bot, "@a @b").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.handle(press(LEAD, "toggle::@a")).await;

        configure(&bot, "@x @y").await;
        let roster: Vec<String> = bot.roster(CHAT).await.iter().map(|p| p.to_string()).collect();
        assert_eq!(roster, vec!["@x", "@y"]);

        bot.handle(press(LEAD, "next")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer { text: Some(format::NO_DIALOG.into()), alert: true }]
        );
    }

    #[tokio::test]
    async fn test_count_above_active_reports_shortage() {
        let bot = bot();
        configure(&bot, "@a @b @c").await;
        bot.handle(text(LEAD, "/assign")).await;
        bot.handle(press(LEAD, "toggle::@a")).await;
        bot.handle(press(LEAD, "next")).await;
        bot.handle(press(LEAD, "policy::random")).await;
        bot.messenger().take();

        bot.handle(press(LEAD, "count::2")).await;
        let calls = bot.messenger().take();
        assert_eq!(
            calls,
            vec![Call::Answer {
                text: Some("Not enough participants: requested 2, only 1 active".into()),
                alert: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_reset_forgets_roster_and_rotation() {
        let bot = bot();
        configure(&bot, "@a @b").await;
        run_assignment(&bot, &["@a", "@b"], "round", 1).await;
        bot.messenger().take();

        bot.handle(text(LEAD, "/reset")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::RESET_DONE]);
        assert!(bot.roster(CHAT).await.is_empty());

        bot.handle(text(LEAD, "/reset")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::NO_ROSTER]);

        // Rotation starts over with the new roster.
        configure(&bot, "@a @b").await;
        run_assignment(&bot, &["@a", "@b"], "round", 1).await;
        let calls = bot.messenger().take();
        assert_eq!(channel_posts(&calls), vec!["Assigned: @a\nWeekly support duty"]);
    }

    #[tokio::test]
    async fn test_reset_is_admin_only() {
        let bot = bot_with(FakeMessenger::default(), &["@user1"], &[]);
        configure(&bot, "@a").await;
        bot.handle(text(2, "/reset")).await;
        let calls = bot.messenger().take();
        assert_eq!(texts(&calls), vec![format::NOT_ADMIN]);
        assert_eq!(bot.roster(CHAT).await.len(), 1);
    }
}
