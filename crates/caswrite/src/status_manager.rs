use std::time::{Duration, Instant};

use chrono::Local;

pub const DEFAULT_HINT: &str = "F2 Save  F3 Open  F6 Next  Ctrl+W Close  F10 Menu  Alt+X Exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    pub created_at: Instant,
    pub auto_clear_duration: Option<Duration>,
}

impl StatusMessage {
    pub fn new(content: String, message_type: MessageType) -> Self {
        Self {
            content,
            message_type,
            created_at: Instant::now(),
            auto_clear_duration: Some(Self::default_duration_for_type(message_type)),
        }
    }

    pub fn with_duration(content: String, message_type: MessageType, duration: Duration) -> Self {
        Self {
            content,
            message_type,
            created_at: Instant::now(),
            auto_clear_duration: Some(duration),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.auto_clear_duration
            .is_some_and(|duration| self.created_at.elapsed() > duration)
    }

    fn default_duration_for_type(message_type: MessageType) -> Duration {
        match message_type {
            MessageType::Info => Duration::from_secs(3),
            MessageType::Success => Duration::from_secs(2),
            MessageType::Warning => Duration::from_secs(5),
            MessageType::Error => Duration::from_secs(7),
        }
    }
}

/// Bottom status line: a transient message over a key hint, plus the
/// active window's position readout.
#[derive(Debug, Clone)]
pub struct StatusManager {
    current_message: Option<StatusMessage>,
    hint: String,
    position: String,
}

impl StatusManager {
    pub fn new() -> Self {
        Self {
            current_message: None,
            hint: DEFAULT_HINT.to_string(),
            position: String::new(),
        }
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Info);
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Success);
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.set(message.into(), MessageType::Warning);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.set(message, MessageType::Error);
    }

    /// "Saved <name> at HH:MM:SS"
    pub fn set_saved(&mut self, name: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        self.set_success(format!("Saved {} at {}", name, stamp));
    }

    fn set(&mut self, content: String, message_type: MessageType) {
        self.current_message = Some(StatusMessage::new(content, message_type));
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = hint.into();
    }

    pub fn set_position(&mut self, position: impl Into<String>) {
        self.position = position.into();
    }

    pub fn clear(&mut self) {
        self.current_message = None;
    }

    /// Drops the message once it has outlived its duration.
    pub fn update(&mut self) {
        if self
            .current_message
            .as_ref()
            .is_some_and(StatusMessage::is_expired)
        {
            self.current_message = None;
        }
    }

    pub fn current_message(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    /// Text for the left side: the live message, else the key hint.
    pub fn left_text(&self) -> &str {
        self.current_message
            .as_ref()
            .map(|message| message.content.as_str())
            .unwrap_or(&self.hint)
    }

    pub fn position(&self) -> &str {
        &self.position
    }
}

impl Default for StatusManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_hint_shows_without_message() {
        let manager = StatusManager::new();
        assert!(manager.current_message().is_none());
        assert_eq!(manager.left_text(), DEFAULT_HINT);
    }

    #[test]
    fn test_message_types() {
        let mut manager = StatusManager::new();

        manager.set_info("Info message");
        let message = manager.current_message().unwrap();
        assert_eq!(message.message_type, MessageType::Info);
        assert_eq!(manager.left_text(), "Info message");

        manager.set_warning("Careful");
        assert_eq!(
            manager.current_message().unwrap().message_type,
            MessageType::Warning
        );

        manager.set_error("Broken");
        assert_eq!(
            manager.current_message().unwrap().message_type,
            MessageType::Error
        );
    }

    #[test]
    fn test_saved_message() {
        let mut manager = StatusManager::new();
        manager.set_saved("notes.txt");
        let message = manager.current_message().unwrap();
        assert_eq!(message.message_type, MessageType::Success);
        assert!(message.content.starts_with("Saved notes.txt at "));
        // HH:MM:SS
        assert_eq!(message.content.len(), "Saved notes.txt at ".len() + 8);
    }

    #[test]
    fn test_update_expired_message() {
        let mut manager = StatusManager::new();
        manager.current_message = Some(StatusMessage::with_duration(
            "Test".to_string(),
            MessageType::Info,
            Duration::from_millis(1),
        ));

        thread::sleep(Duration::from_millis(10));

        manager.update();
        assert!(manager.current_message().is_none());
        assert_eq!(manager.left_text(), DEFAULT_HINT);
    }

    #[test]
    fn test_fresh_message_survives_update() {
        let mut manager = StatusManager::new();
        manager.set_success("done");
        manager.update();
        assert!(manager.current_message().is_some());

        manager.clear();
        assert!(manager.current_message().is_none());
    }
}
