//! Service wiring: stores, resource services, token service and resolver.

use std::sync::Arc;

use orgadmin_auth::{Argon2Verifier, IdentityResolver, TokenConfig, TokenService};
use orgadmin_infra::{Company, CompanyService, InMemoryStore, User, UserService, WriteLock};

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub companies: Arc<CompanyService>,
    pub tokens: Arc<TokenService>,
    pub resolver: IdentityResolver,
}

impl AppServices {
    /// Wire everything over in-memory stores.
    pub fn in_memory(config: TokenConfig) -> Self {
        let user_store = Arc::new(InMemoryStore::<User>::new());
        let company_store = Arc::new(InMemoryStore::<Company>::new());

        let write = WriteLock::new();

        let companies = Arc::new(CompanyService::new(company_store, user_store.clone(), write.clone()));
        let users = Arc::new(UserService::new(
            user_store,
            companies.clone(),
            Arc::new(Argon2Verifier::new()),
            write,
        ));
        let tokens = Arc::new(TokenService::new(config));
        let resolver = IdentityResolver::new(tokens.clone(), users.clone());

        Self {
            users,
            companies,
            tokens,
            resolver,
        }
    }
}
