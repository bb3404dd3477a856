use std::sync::Arc;

use engine::{Notice, Notifier, NotifyResult};
use poise::serenity_prelude as serenity;

/// Sends sweep notices as direct messages.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
}

impl DiscordNotifier {
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(serenity::Http::new(token)),
        }
    }
}

/// Account ids are Discord snowflakes; anything else cannot be messaged.
fn recipient(user_id: &str) -> Option<serenity::UserId> {
    user_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::UserId::new)
}

impl Notifier for DiscordNotifier {
    async fn notify(&self, notice: &Notice) -> NotifyResult {
        let user = recipient(notice.user_id())
            .ok_or_else(|| format!("\"{}\" is not a discord user id", notice.user_id()))?;
        user.direct_message(
            &*self.http,
            serenity::CreateMessage::new().content(notice.message()),
        )
        .await?;
        tracing::debug!(user_id = notice.user_id(), "notice delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_snowflakes_are_recipients() {
        assert_eq!(
            recipient("80351110224678912"),
            Some(serenity::UserId::new(80351110224678912))
        );
        assert_eq!(recipient("0"), None);
        assert_eq!(recipient("alice"), None);
        assert_eq!(recipient(""), None);
    }
}
