//! Infrastructure layer: record storage and the users/companies services
//! that back the directory lookups used by authorization.

pub mod companies;
pub mod model;
pub mod store;
pub mod users;

pub use companies::{CompanyService, CompanyUpdate, NewCompany};
pub use model::{Company, CompanyRef, User, UserView};
pub use store::{EntityStore, InMemoryStore, WriteLock};
pub use users::{NewUser, ProfileUpdate, Reassignment, Registration, UserPage, UserSearch, UserService};
