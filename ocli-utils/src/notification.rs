// ocli status lines
//
// One-line, styled results printed to the operator after each command
// (backup finished, restore failed, server stopped, ...).

const RESET: &str = "\x1b[0m";

/// Visual style determining color and icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStyle {
    /// Failure (red, ✗ icon)
    Error,
    /// Completed operation (green, ✓ icon)
    Success,
    /// Degraded but continuing (yellow, ⚠ icon)
    Warning,
    /// Progress message (cyan, › icon)
    Info,
}

impl NotificationStyle {
    /// Get ANSI color code for this style
    pub fn color_code(&self) -> &'static str {
        match self {
            NotificationStyle::Error => "\x1b[31m",   // Red
            NotificationStyle::Success => "\x1b[32m", // Green
            NotificationStyle::Warning => "\x1b[33m", // Yellow
            NotificationStyle::Info => "\x1b[36m",    // Cyan
        }
    }

    /// Get icon character for this style
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationStyle::Error => "✗",
            NotificationStyle::Success => "✓",
            NotificationStyle::Warning => "⚠",
            NotificationStyle::Info => "›",
        }
    }
}

/// A styled status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub style: NotificationStyle,
    pub message: String,
}

impl Notification {
    pub fn new(style: NotificationStyle, message: String) -> Self {
        Self { style, message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Error, message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Success, message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Warning, message.into())
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationStyle::Info, message.into())
    }

    /// Render as `<icon> <message>`, wrapped in ANSI color when `colored`.
    pub fn render(&self, colored: bool) -> String {
        if colored {
            format!(
                "{}{} {}{}",
                self.style.color_code(),
                self.style.icon(),
                self.message,
                RESET
            )
        } else {
            format!("{} {}", self.style.icon(), self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_creation() {
        let notif = Notification::error("Backup failed");
        assert_eq!(notif.style, NotificationStyle::Error);
        assert_eq!(notif.message, "Backup failed");
    }

    #[test]
    fn test_render_plain_and_colored() {
        let notif = Notification::success("Restore completed");
        assert_eq!(notif.render(false), "✓ Restore completed");
        assert_eq!(
            notif.render(true),
            "\x1b[32m✓ Restore completed\x1b[0m"
        );
    }
}
