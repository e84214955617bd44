//! `stockroom-auth`: authentication/authorization boundary.
//!
//! This crate has no HTTP or storage dependencies. It knows how
//! to validate account input, hash and verify passwords, sign and verify
//! bearer tokens, and decide whether a role may reach a route.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{authorize, AuthzError};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use principal::Principal;
pub use roles::Role;
pub use token::{Hs256Jwt, JwtValidator, TokenError, TokenIssuer};
pub use user::{CreateUser, NewUser, PublicUser, User, UserDraft, UserPatch};
