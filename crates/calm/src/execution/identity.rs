//! Username to UID/GID resolution

use calm_core::{CalmError, Result};
use nix::unistd::User;

/// Numeric credential the child runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchIdentity {
    pub uid: u32,
    pub gid: u32,
}

/// Resolves a configured username into a [`LaunchIdentity`].
///
/// Failures are reported as [`CalmError::UserLookup`].
pub trait UserResolver {
    fn resolve(&self, username: &str) -> Result<LaunchIdentity>;
}

impl<T: UserResolver + ?Sized> UserResolver for &T {
    fn resolve(&self, username: &str) -> Result<LaunchIdentity> {
        (**self).resolve(username)
    }
}

/// Resolver backed by the system user database (NSS)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUsers;

impl UserResolver for SystemUsers {
    fn resolve(&self, username: &str) -> Result<LaunchIdentity> {
        if username.is_empty() {
            return Err(lookup_error(username, "username is empty".to_string()));
        }

        match User::from_name(username) {
            Ok(Some(user)) => Ok(LaunchIdentity {
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
            }),
            Ok(None) => Err(lookup_error(username, "no such user".to_string())),
            Err(e) => Err(lookup_error(username, e.to_string())),
        }
    }
}

fn lookup_error(username: &str, reason: String) -> CalmError {
    CalmError::UserLookup {
        user: username.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Uid;

    #[test]
    fn test_resolve_root() {
        let identity = SystemUsers.resolve("root").unwrap();
        assert_eq!(identity, LaunchIdentity { uid: 0, gid: 0 });
    }

    #[test]
    fn test_resolve_current_user() {
        let Some(user) = User::from_uid(Uid::current()).unwrap() else {
            return;
        };
        let identity = SystemUsers.resolve(&user.name).unwrap();
        assert_eq!(identity.uid, Uid::current().as_raw());
        assert_eq!(identity.gid, user.gid.as_raw());
    }

    #[test]
    fn test_resolve_unknown_user() {
        let err = SystemUsers
            .resolve("calm-no-such-user-0xdead")
            .unwrap_err();
        assert!(matches!(err, CalmError::UserLookup { .. }));
        assert!(err.to_string().contains("calm-no-such-user-0xdead"));
    }

    #[test]
    fn test_resolve_empty_username() {
        assert!(matches!(
            SystemUsers.resolve(""),
            Err(CalmError::UserLookup { .. })
        ));
    }
}
