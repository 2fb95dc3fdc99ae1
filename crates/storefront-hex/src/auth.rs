use std::collections::HashMap;

use anyhow::Context;
use uuid::Uuid;

use storefront_types::ports::credentials::{CredentialVerifier, Identity, Role};

/// Token-table credential verifier. Stands in for a real credential
/// service; the rest of the system only sees the `CredentialVerifier` port.
#[derive(Debug, Default, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }

    /// Parses a comma-separated list of `token:user_id:role` triples, the
    /// format the app binary reads from `API_TOKENS`.
    pub fn parse_tokens(list: &str) -> anyhow::Result<Self> {
        let mut verifier = Self::new();
        for entry in list.split(',').filter(|e| !e.trim().is_empty()) {
            let mut parts = entry.trim().splitn(3, ':');
            let token = parts.next().context("missing token")?;
            let user_id = parts
                .next()
                .context("missing user id")?
                .parse::<Uuid>()
                .context("bad user id")?;
            let role = match parts.next().context("missing role")? {
                r if r.eq_ignore_ascii_case("admin") => Role::Admin,
                r if r.eq_ignore_ascii_case("customer") => Role::Customer,
                other => anyhow::bail!("unknown role: {other}"),
            };
            verifier.insert(token, Identity { user_id, role });
        }
        Ok(verifier)
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_list() {
        let user = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let list = format!("alice-token:{user}:customer, root-token:{admin}:Admin");
        let verifier = StaticTokenVerifier::parse_tokens(&list).unwrap();

        let id = verifier.verify("alice-token").unwrap();
        assert_eq!(id.user_id, user);
        assert_eq!(id.role, Role::Customer);

        let id = verifier.verify("root-token").unwrap();
        assert_eq!(id.role, Role::Admin);

        assert!(verifier.verify("unknown").is_none());
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(StaticTokenVerifier::parse_tokens("just-a-token").is_err());
        assert!(StaticTokenVerifier::parse_tokens("t:not-a-uuid:admin").is_err());
        let user = Uuid::new_v4();
        assert!(StaticTokenVerifier::parse_tokens(&format!("t:{user}:wizard")).is_err());
    }

    #[test]
    fn empty_list_verifies_nothing() {
        let verifier = StaticTokenVerifier::parse_tokens("").unwrap();
        assert!(verifier.verify("anything").is_none());
    }
}
