use std::fmt;
use serde::{Serialize, Deserialize};
use crate::error::{SwitchError, SessionError};
use crate::Result;

const GNOME_DESKTOPS: &[&str] = &["gnome", "ubuntu:gnome", "unity"];
const KDE_DESKTOPS: &[&str] = &["kde", "plasma"];

/// Windowing-system family of the running graphical session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    X11,
    GnomeWayland,
    KdeWayland,
    Unsupported,
}

impl SessionKind {
    pub fn display_tool(self) -> Option<DisplayTool> {
        match self {
            SessionKind::X11 => Some(DisplayTool::Xrandr),
            SessionKind::GnomeWayland => Some(DisplayTool::GnomeRandr),
            SessionKind::KdeWayland => Some(DisplayTool::KscreenDoctor),
            SessionKind::Unsupported => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::X11 => write!(f, "X11"),
            SessionKind::GnomeWayland => write!(f, "GNOME Wayland"),
            SessionKind::KdeWayland => write!(f, "KDE Wayland"),
            SessionKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// External display-configuration tool used to enable/disable outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayTool {
    Xrandr,
    GnomeRandr,
    KscreenDoctor,
}

impl DisplayTool {
    pub fn command(self) -> &'static str {
        match self {
            DisplayTool::Xrandr => "xrandr",
            DisplayTool::GnomeRandr => "gnome-randr",
            DisplayTool::KscreenDoctor => "kscreen-doctor",
        }
    }
}

impl fmt::Display for DisplayTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Maps `XDG_SESSION_TYPE` / `XDG_CURRENT_DESKTOP` values to a session kind.
pub fn classify_session(session_type: &str, desktop: &str) -> SessionKind {
    let session_type = session_type.to_lowercase();
    let desktop = desktop.to_lowercase();

    match session_type.as_str() {
        "x11" => SessionKind::X11,
        "wayland" if GNOME_DESKTOPS.contains(&desktop.as_str()) => SessionKind::GnomeWayland,
        "wayland" if KDE_DESKTOPS.contains(&desktop.as_str()) => SessionKind::KdeWayland,
        _ => SessionKind::Unsupported,
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Reads the current process environment.
pub fn detect_session() -> SessionKind {
    classify_session(&env_or_empty("XDG_SESSION_TYPE"), &env_or_empty("XDG_CURRENT_DESKTOP"))
}

/// Detects the session and picks its display tool. Unsupported sessions are
/// an error: nothing can be switched without a known tool.
pub fn probe_display_tool() -> Result<(SessionKind, DisplayTool)> {
    let session = detect_session();
    match session.display_tool() {
        Some(tool) => {
            log::info!("Session type: {}. Using {}.", session, tool);
            Ok((session, tool))
        }
        None => {
            let session_type = env_or_empty("XDG_SESSION_TYPE");
            let desktop = env_or_empty("XDG_CURRENT_DESKTOP");
            log::error!("Unsupported session type: {:?} (desktop {:?})", session_type, desktop);
            Err(SwitchError::Session(SessionError::Unsupported { session_type, desktop }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x11_ignores_desktop() {
        assert_eq!(classify_session("x11", "KDE"), SessionKind::X11);
        assert_eq!(classify_session("X11", ""), SessionKind::X11);
    }

    #[test]
    fn test_gnome_family_on_wayland() {
        assert_eq!(classify_session("wayland", "GNOME"), SessionKind::GnomeWayland);
        assert_eq!(classify_session("wayland", "ubuntu:GNOME"), SessionKind::GnomeWayland);
        assert_eq!(classify_session("Wayland", "Unity"), SessionKind::GnomeWayland);
    }

    #[test]
    fn test_kde_family_on_wayland() {
        assert_eq!(classify_session("wayland", "KDE"), SessionKind::KdeWayland);
        assert_eq!(classify_session("wayland", "plasma"), SessionKind::KdeWayland);
    }

    #[test]
    fn test_unsupported_sessions() {
        assert_eq!(classify_session("wayland", "sway"), SessionKind::Unsupported);
        assert_eq!(classify_session("wayland", ""), SessionKind::Unsupported);
        assert_eq!(classify_session("tty", "GNOME"), SessionKind::Unsupported);
        assert_eq!(classify_session("", ""), SessionKind::Unsupported);
    }

    #[test]
    fn test_display_tool_per_session() {
        assert_eq!(SessionKind::X11.display_tool(), Some(DisplayTool::Xrandr));
        assert_eq!(SessionKind::GnomeWayland.display_tool(), Some(DisplayTool::GnomeRandr));
        assert_eq!(SessionKind::KdeWayland.display_tool(), Some(DisplayTool::KscreenDoctor));
        assert_eq!(SessionKind::Unsupported.display_tool(), None);
        assert_eq!(DisplayTool::KscreenDoctor.command(), "kscreen-doctor");
    }
}
