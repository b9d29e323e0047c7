//! Execution permission requested for, and resolved by, a scheduled job.
use std::fmt;

/// Canonical configuration token for [`Permission::Auto`].
pub const TOKEN_AUTO: &str = "auto";
/// Canonical configuration token for [`Permission::System`].
pub const TOKEN_SYSTEM: &str = "system";
/// Canonical configuration token for [`Permission::UserBackground`].
pub const TOKEN_USER: &str = "user";
/// Canonical configuration token for [`Permission::UserLoggedOn`].
pub const TOKEN_USER_LOGGED_ON: &str = "user_logged_on";
/// Accepted alias of [`TOKEN_USER_LOGGED_ON`]; never emitted.
pub const TOKEN_USER_LOGGED_IN: &str = "user_logged_in";

/// Privilege level under which a scheduled job runs.
///
/// [`Permission::Auto`] is only ever a request: backends resolve it to one of
/// the three concrete levels before any job is installed.
///
/// # Examples
///
/// ```
/// use backup_scheduler::schedule::Permission;
///
/// assert_eq!(Permission::from_token("user"), Permission::UserBackground);
/// assert_eq!(Permission::from_token("nonsense"), Permission::Auto);
/// assert_eq!(Permission::System.to_string(), "system");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Permission {
    /// Let the backend pick a level for the current execution context.
    #[default]
    Auto,
    /// Machine-wide schedule, installable only by the privileged account.
    System,
    /// Runs as the invoking user whether or not they are logged on.
    UserBackground,
    /// Runs as the invoking user only while they are logged on.
    UserLoggedOn,
}

impl Permission {
    /// Resolve a configuration token. Unknown tokens degrade to [`Permission::Auto`].
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            TOKEN_SYSTEM => Self::System,
            TOKEN_USER => Self::UserBackground,
            TOKEN_USER_LOGGED_ON | TOKEN_USER_LOGGED_IN => Self::UserLoggedOn,
            _ => Self::Auto,
        }
    }

    /// Canonical token used in configuration files and messages.
    #[must_use]
    pub const fn as_token(self) -> &'static str {
        match self {
            Self::Auto => TOKEN_AUTO,
            Self::System => TOKEN_SYSTEM,
            Self::UserBackground => TOKEN_USER,
            Self::UserLoggedOn => TOKEN_USER_LOGGED_ON,
        }
    }

    /// Whether `token` is one of the tokens [`from_token`](Self::from_token) recognises.
    #[must_use]
    pub fn is_known_token(token: &str) -> bool {
        token == TOKEN_AUTO || Self::from_token(token) != Self::Auto
    }

    /// Whether this permission is attainable for the effective user id `euid`.
    ///
    /// Only the privileged account (`euid == 0`) may install [`Permission::System`]
    /// schedules; user-level schedules are always installable by the invoking user.
    #[must_use]
    pub const fn is_granted(self, euid: u32) -> bool {
        match self {
            Self::System => euid == 0,
            Self::Auto | Self::UserBackground | Self::UserLoggedOn => true,
        }
    }

    /// Whether the schedule belongs to the invoking user rather than the machine.
    #[must_use]
    pub const fn is_user(self) -> bool {
        matches!(self, Self::UserBackground | Self::UserLoggedOn)
    }
}

impl From<&str> for Permission {
    fn from(token: &str) -> Self {
        Self::from_token(token)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Permission; 4] = [
        Permission::Auto,
        Permission::System,
        Permission::UserBackground,
        Permission::UserLoggedOn,
    ];

    #[test]
    fn non_system_permissions_granted_for_any_euid() {
        for permission in [
            Permission::Auto,
            Permission::UserBackground,
            Permission::UserLoggedOn,
        ] {
            for euid in [0, 1, 1000, u32::MAX] {
                assert!(
                    permission.is_granted(euid),
                    "{permission} should be granted for euid {euid}"
                );
            }
        }
    }

    #[test]
    fn system_permission_granted_only_to_root() {
        assert!(Permission::System.is_granted(0));
        for euid in [1, 500, 1000, u32::MAX] {
            assert!(!Permission::System.is_granted(euid), "euid {euid}");
        }
    }

    #[test]
    fn canonical_tokens_round_trip() {
        for permission in ALL {
            let token = permission.as_token();
            assert_eq!(Permission::from_token(token).as_token(), token);
        }
    }

    #[test]
    fn logged_in_alias_resolves_to_logged_on() {
        assert_eq!(
            Permission::from_token(TOKEN_USER_LOGGED_IN),
            Permission::UserLoggedOn
        );
        assert_eq!(Permission::UserLoggedOn.as_token(), TOKEN_USER_LOGGED_ON);
    }

    #[test]
    fn unknown_tokens_resolve_to_auto() {
        for token in ["", "root", "System", "USER", "user-logged-on"] {
            assert_eq!(Permission::from_token(token), Permission::Auto, "{token:?}");
        }
    }

    #[test]
    fn known_token_detection() {
        assert!(Permission::is_known_token("auto"));
        assert!(Permission::is_known_token("user_logged_in"));
        assert!(!Permission::is_known_token("admin"));
    }

    #[test]
    fn from_str_conversion() {
        let permission: Permission = "system".into();
        assert_eq!(permission, Permission::System);
    }

    #[test]
    fn user_scopes() {
        assert!(Permission::UserBackground.is_user());
        assert!(Permission::UserLoggedOn.is_user());
        assert!(!Permission::System.is_user());
        assert!(!Permission::Auto.is_user());
    }
}
