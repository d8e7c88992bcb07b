//! Referral Store - Storage Layer
//!
//! Provides storage integration for the referral program: row entities
//! for the four tables (`referral_users`, `referral_activities`,
//! `referral_discounts`, `referral_purchases`), repository traits, and
//! two concrete backends.
//!
//! # Architecture
//!
//! - [`repos`] - `async` repository traits, one per table
//! - [`rest`] - REST row-store client (the hosted relational store is
//!   spoken to over HTTP, one request per row operation)
//! - [`memory`] - in-memory store enforcing the same constraints; the
//!   backend for tests and local development
//! - [`schema`] - SQL DDL, including the unique indexes that back the
//!   duplicate-referral and code-uniqueness invariants
//!
//! The store, not the application, is the authority on uniqueness: a
//! second activity for a referee email or a second user with the same
//! referral code fails with [`StoreError::UniqueViolation`] from either
//! backend.

pub mod entities;
pub mod error;
pub mod memory;
pub mod repos;
pub mod rest;
pub mod schema;

pub use entities::{
    ReferralActivityEntity, ReferralDiscountEntity, ReferralPurchaseEntity, ReferralUserEntity,
};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repos::{ActivityRepository, DiscountRepository, PurchaseRepository, UserRepository};
pub use rest::{RestConfig, RestRowStore, RetryConfig};
pub use schema::REFERRAL_SCHEMA;
