/// Renders the mention token Slack inserts when a user references `bot_user_id`.
pub fn bot_mention(bot_user_id: &str) -> String {
    format!("<@{bot_user_id}>")
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Inbound chat message as delivered by the chat platform.
///
/// Owned by the transport layer; routing code only reads it.
pub struct ChatEvent {
    pub user_id: String,
    pub channel_id: String,
    pub ts: String,
    pub text: String,
    pub thread_ts: Option<String>,
    pub subtype: Option<String>,
}

impl ChatEvent {
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        ts: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            ts: ts.into(),
            text: text.into(),
            thread_ts: None,
            subtype: None,
        }
    }

    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(self.ts.as_str())
    }

    pub fn mentions(&self, bot_user_id: &str) -> bool {
        self.text.contains(&bot_mention(bot_user_id))
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
