//! Disclaimer and news acknowledgment gates.
//!
//! Flags are read once when the app starts and written back when the user
//! acknowledges a screen. The session never looks at them.

use tracing::info;

use crate::kvdb::{KvError, KvStore};

pub const DISCLAIMER_ACCEPTED_KEY: &str = "bg1.disclaimer.accepted";
pub const NEWS_VERSION_KEY: &str = "bg1.news.version";

/// Bumped whenever the news screen gets new content
pub const NEWS_VERSION: i64 = 1;

/// Which acknowledgment, if any, stands in front of the session screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Disclaimer,
    News,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcceptanceFlags {
    pub disclaimer_accepted: bool,
    pub news_version_seen: i64,
}

impl AcceptanceFlags {
    pub fn load(kv: &KvStore) -> Self {
        Self {
            disclaimer_accepted: kv.get::<i64>(DISCLAIMER_ACCEPTED_KEY).unwrap_or(0) >= 1,
            news_version_seen: kv.get::<i64>(NEWS_VERSION_KEY).unwrap_or(0),
        }
    }

    pub fn has_unseen_news(&self) -> bool {
        self.news_version_seen < NEWS_VERSION
    }

    /// The disclaimer comes first, then news
    pub fn gate(&self) -> Gate {
        if !self.disclaimer_accepted {
            Gate::Disclaimer
        } else if self.has_unseen_news() {
            Gate::News
        } else {
            Gate::Open
        }
    }

    pub fn accept_disclaimer(&mut self, kv: &KvStore) -> Result<(), KvError> {
        kv.set(DISCLAIMER_ACCEPTED_KEY, &1)?;
        self.disclaimer_accepted = true;
        info!("Disclaimer accepted");
        Ok(())
    }

    pub fn dismiss_news(&mut self, kv: &KvStore) -> Result<(), KvError> {
        kv.set(NEWS_VERSION_KEY, &NEWS_VERSION)?;
        self.news_version_seen = NEWS_VERSION;
        info!(version = NEWS_VERSION, "News dismissed");
        Ok(())
    }
}
