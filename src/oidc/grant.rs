use std::fmt;

/// Grant used to obtain a brand new bundle.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthorizationGrant {
    #[default]
    ClientCredentials,
    /// Resource owner password credentials.
    Password { username: String, password: String },
}

impl AuthorizationGrant {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::Password { .. } => "password",
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("grant_type", self.grant_type())];
        if let Self::Password { username, password } = self {
            params.push(("username", username.as_str()));
            params.push(("password", password.as_str()));
        }
        params
    }
}

impl fmt::Debug for AuthorizationGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientCredentials => f.write_str("ClientCredentials"),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_params() {
        let grant = AuthorizationGrant::password("alice", "hunter2");
        assert_eq!(
            grant.params(),
            vec![
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "hunter2"),
            ]
        );
        assert!(!format!("{:?}", grant).contains("hunter2"));
    }

    #[test]
    fn client_credentials_by_default() {
        let grant = AuthorizationGrant::default();
        assert_eq!(grant.params(), vec![("grant_type", "client_credentials")]);
    }
}
