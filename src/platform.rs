use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux, where systemd or cron may be available.
    Linux,
    /// macOS.
    MacOs,
    /// Windows.
    Windows,
    /// Any other Unix-like system.
    OtherUnix,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::MacOs => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
            Self::OtherUnix => write!(f, "unix"),
        }
    }
}

/// Platform information for the current process.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// Effective user id; `0` is the privileged account.
    pub euid: u32,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            os: Self::detect_os(),
            euid: effective_uid(),
        }
    }

    /// Create a platform with explicit values (for testing).
    #[must_use]
    pub const fn new(os: Os, euid: u32) -> Self {
        Self { os, euid }
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::MacOs
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            Os::OtherUnix
        }
    }
}

/// Effective user id of the current process.
#[cfg(unix)]
#[must_use]
pub fn effective_uid() -> u32 {
    nix::unistd::geteuid().as_raw()
}

/// Effective user id of the current process.
///
/// Windows has no numeric user ids; the process is never treated as the
/// privileged account.
#[cfg(not(unix))]
#[must_use]
pub const fn effective_uid() -> u32 {
    u32::MAX
}
