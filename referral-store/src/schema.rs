//! Table Schema
//!
//! DDL for the four referral tables. Applied out of band by the
//! deployment, not by this crate; the constant exists so the schema
//! ships with the code that depends on it.
//!
//! The two unique indexes are load-bearing: code allocation retries on
//! `referral_users.referral_code`, and the duplicate-referral gate
//! rests on `referral_activities.referee_email` rather than on the
//! application-level pre-check.

/// Referral schema
pub const REFERRAL_SCHEMA: &str = r#"
-- One row per authenticated principal
CREATE TABLE IF NOT EXISTS referral_users (
    id               text PRIMARY KEY,
    uid              text NOT NULL UNIQUE,
    email            text NOT NULL,
    display_name     text,
    referral_code    text NOT NULL,
    total_referrals  bigint NOT NULL DEFAULT 0,
    total_earnings   numeric(12,2) NOT NULL DEFAULT 0,
    tier             text NOT NULL DEFAULT 'bronze',
    total_purchases  bigint NOT NULL DEFAULT 0,
    conversion_rate  numeric(5,2) NOT NULL DEFAULT 0,
    referred_by      text,
    is_referrer      boolean NOT NULL DEFAULT false,
    created_at       timestamptz NOT NULL,
    updated_at       timestamptz NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS referral_users_code_idx
    ON referral_users (referral_code);

-- One row per referrer x referee pair, ever
CREATE TABLE IF NOT EXISTS referral_activities (
    id                 text PRIMARY KEY,
    referrer_uid       text NOT NULL,
    referee_uid        text,
    referee_email      text NOT NULL,
    status             text NOT NULL,
    reward_amount      numeric(12,2) NOT NULL,
    joined_at          timestamptz NOT NULL,
    first_purchase_at  timestamptz,
    purchase_count     bigint NOT NULL DEFAULT 0,
    total_spend        numeric(12,2) NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS referral_activities_referee_email_idx
    ON referral_activities (referee_email);

CREATE INDEX IF NOT EXISTS referral_activities_referrer_idx
    ON referral_activities (referrer_uid);

-- One row per granted percentage-off reward
CREATE TABLE IF NOT EXISTS referral_discounts (
    id                   text PRIMARY KEY,
    user_uid             text NOT NULL,
    discount_percentage  smallint NOT NULL CHECK (discount_percentage BETWEEN 0 AND 100),
    is_active            boolean NOT NULL DEFAULT true,
    expires_at           timestamptz,
    applied_at           timestamptz,
    referrer_uid         text,
    created_at           timestamptz NOT NULL
);

CREATE INDEX IF NOT EXISTS referral_discounts_user_idx
    ON referral_discounts (user_uid);

-- One row per tracked purchase event
CREATE TABLE IF NOT EXISTS referral_purchases (
    id               text PRIMARY KEY,
    purchaser_uid    text NOT NULL,
    referrer_uid     text,
    product_id       text NOT NULL,
    product_name     text NOT NULL,
    amount           numeric(12,2) NOT NULL,
    discount_amount  numeric(12,2) NOT NULL DEFAULT 0,
    activity_id      text,
    purchased_at     timestamptz NOT NULL
);

CREATE INDEX IF NOT EXISTS referral_purchases_referrer_idx
    ON referral_purchases (referrer_uid);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_valid() {
        assert!(!REFERRAL_SCHEMA.is_empty());
        assert!(REFERRAL_SCHEMA.contains("CREATE TABLE"));
        assert!(REFERRAL_SCHEMA.contains("referral_users"));
        assert!(REFERRAL_SCHEMA.contains("referral_activities"));
        assert!(REFERRAL_SCHEMA.contains("referral_discounts"));
        assert!(REFERRAL_SCHEMA.contains("referral_purchases"));
    }

    #[test]
    fn test_schema_carries_the_uniqueness_backstops() {
        assert!(REFERRAL_SCHEMA.contains("referral_activities_referee_email_idx"));
        assert!(REFERRAL_SCHEMA.contains("referral_users_code_idx"));
    }
}
