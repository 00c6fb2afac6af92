//! # campusboard-auth
//!
//! Verifies bearer tokens issued by the campus auth service and turns
//! them into a verified [`Identity`](campusboard_entity::Identity).
//! Token issuing exists for tooling and tests; the board itself never
//! issues credentials.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
