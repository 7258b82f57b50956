use std::time::Duration;

use serde::Serialize;

/// What raised a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SourceFallback,
    Quality,
    SecondaryAudio,
    Subtitles,
    Catalog,
}

/// A transient, dismissible message for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip)]
    pub raised_at: Duration,
}

/// Holds the single visible notice and expires it after `ttl`.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<Notice>,
    ttl: Duration,
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { current: None, ttl }
    }

    pub fn show(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        now: Duration,
    ) -> &Notice {
        self.current.insert(Notice {
            kind,
            message: message.into(),
            raised_at: now,
        })
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// Drop the notice once its ttl elapsed. Returns `true` if one expired.
    pub fn expire(&mut self, now: Duration) -> bool {
        if let Some(notice) = &self.current
            && now.saturating_sub(notice.raised_at) > self.ttl
        {
            self.current = None;
            return true;
        }
        false
    }

    pub fn dismiss(&mut self) -> Option<Notice> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_ttl() {
        let mut board = NoticeBoard::new(Duration::from_secs(2));
        board.show(NoticeKind::Quality, "Quality: 720p", Duration::from_secs(1));

        assert!(!board.expire(Duration::from_secs(3)));
        assert!(board.current().is_some());
        assert!(board.expire(Duration::from_millis(3_001)));
        assert!(board.current().is_none());
    }

    #[test]
    fn newer_notice_replaces_older() {
        let mut board = NoticeBoard::new(Duration::from_secs(2));
        board.show(NoticeKind::Quality, "a", Duration::ZERO);
        board.show(NoticeKind::Subtitles, "b", Duration::ZERO);
        assert_eq!(board.dismiss().map(|n| n.message), Some("b".to_string()));
        assert!(board.dismiss().is_none());
    }
}
