use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, Result};

/// back-office user operating the desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// authenticated session, handed to the desk rather than held globally
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Option<String>,
    operator: Option<Operator>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// session already signed in, mostly for tests and demos
    pub fn authenticated(token: impl Into<String>, operator: Operator) -> Self {
        let mut session = Self::new();
        session.sign_in(token, operator);
        session
    }

    pub fn sign_in(&mut self, token: impl Into<String>, operator: Operator) {
        tracing::debug!(operator = %operator.id, "session signed in");
        self.token = Some(token.into());
        self.operator = Some(operator);
    }

    pub fn sign_out(&mut self) {
        if let Some(operator) = self.operator.take() {
            tracing::debug!(operator = %operator.id, "session signed out");
        }
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.operator.is_some()
    }

    pub fn operator(&self) -> Option<&Operator> {
        self.operator.as_ref()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// operator and token, or `Unauthenticated`
    pub fn require(&self) -> Result<(&Operator, &str)> {
        match (&self.operator, &self.token) {
            (Some(operator), Some(token)) => Ok((operator, token)),
            _ => Err(DeskError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> Operator {
        Operator {
            id: "op-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    #[test]
    fn test_sign_in_and_out() {
        let mut session = SessionContext::new();
        assert!(!session.is_authenticated());
        assert!(matches!(session.require(), Err(DeskError::Unauthenticated)));

        session.sign_in("token-abc", operator());
        assert!(session.is_authenticated());
        assert_eq!(session.bearer_token(), Some("token-abc"));
        let (op, token) = session.require().unwrap();
        assert_eq!(op.id, "op-1");
        assert_eq!(token, "token-abc");

        session.sign_out();
        assert!(!session.is_authenticated());
        assert!(session.operator().is_none());
        assert!(session.bearer_token().is_none());
    }
}
