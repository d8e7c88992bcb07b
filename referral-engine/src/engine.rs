//! Referral Engine
//!
//! Orchestrates referral completion: code resolution, the self- and
//! duplicate-referral gates, activity creation, best-effort discount
//! minting for both parties, and the retried referrer-stat update.
//!
//! Multi-row outcomes here are a sequence of independent writes with no
//! cross-row atomicity: an activity can exist whose discounts failed to
//! mint, and that partial completion is logged rather than rolled back.
//! The one hard guarantee is the duplicate gate - the store's unique
//! index on the referee email decides, so two racing sign-ins for the
//! same referee cannot both insert.

use std::sync::Arc;

use chrono::Utc;
use referral_core::{referral_link, validate_percentage, Principal, ReferralCode, ReferralError,
    ReferralResult, UserId};
use referral_store::{
    ActivityRepository, DiscountRepository, PurchaseRepository, ReferralActivityEntity,
    ReferralDiscountEntity, ReferralPurchaseEntity, ReferralUserEntity, StoreError,
    UserRepository,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::capture::SessionStore;
use crate::config::EngineConfig;

/// Everything recorded by one successful referral completion.
#[derive(Debug, Clone)]
pub struct CompletedReferral {
    /// The activity row that was inserted
    pub activity: ReferralActivityEntity,
    /// The referrer with confirmed post-referral stats
    pub referrer: ReferralUserEntity,
    /// How many of the two discounts actually minted
    pub discounts_minted: usize,
}

/// Referral outcome attached to a sign-in.
#[derive(Debug, Clone)]
pub enum SignInReferral {
    /// No pending code was staged
    None,
    /// The staged code completed into a referral
    Completed(CompletedReferral),
    /// The staged code was rejected; the pending code is cleared
    Rejected(ReferralError),
}

/// Result of initializing a session on sign-in.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: ReferralUserEntity,
    pub referral: SignInReferral,
}

/// A purchase event to track.
#[derive(Debug, Clone)]
pub struct TrackPurchase {
    pub product_id: String,
    pub product_name: String,
    pub amount: Decimal,
    /// Discount the checkout applied, to be redeemed with the purchase
    pub discount_id: Option<String>,
    /// Money the applied discount took off
    pub discount_amount: Decimal,
}

/// Stateless referral service over injected repositories.
pub struct ReferralEngine {
    users: Arc<dyn UserRepository>,
    activities: Arc<dyn ActivityRepository>,
    discounts: Arc<dyn DiscountRepository>,
    purchases: Arc<dyn PurchaseRepository>,
    sessions: Arc<dyn SessionStore>,
    config: EngineConfig,
}

impl ReferralEngine {
    pub fn new(
        users: Arc<dyn UserRepository>,
        activities: Arc<dyn ActivityRepository>,
        discounts: Arc<dyn DiscountRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        sessions: Arc<dyn SessionStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            users,
            activities,
            discounts,
            purchases,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load or create the user row for a principal and process any
    /// pending referral code staged for the session.
    ///
    /// Dependent reads (the referee's discount list) may lag the writes
    /// made here; dashboards re-query after a settle delay instead of
    /// trusting immediately-returned state.
    pub async fn initialize_on_sign_in(
        &self,
        principal: &Principal,
        session_id: &str,
    ) -> ReferralResult<SignInOutcome> {
        let mut user = match self.users.get_by_uid(principal.uid.as_str()).await {
            Ok(Some(user)) => user,
            Ok(None) => self.create_user(principal).await?,
            Err(err) => return Err(err.into()),
        };

        // is_referrer is derived; resync it when the stored flag drifted
        let referred_any = match self.activities.list_for_referrer(&user.uid).await {
            Ok(rows) => !rows.is_empty(),
            Err(err) => {
                warn!(uid = %user.uid, %err, "activity read failed, keeping stored referrer flag");
                user.is_referrer
            }
        };
        if referred_any != user.is_referrer {
            if let Err(err) = self.users.set_is_referrer(&user.uid, referred_any).await {
                warn!(uid = %user.uid, %err, "failed to resync referrer flag");
            } else {
                user.is_referrer = referred_any;
            }
        }

        let referral = match self.sessions.pending_code(session_id).await {
            None => SignInReferral::None,
            Some(code) => {
                // the staged code is consumed either way
                self.sessions.clear(session_id).await;
                match self.complete_referral(principal, &code).await {
                    Ok(completed) => SignInReferral::Completed(completed),
                    Err(err) => {
                        info!(uid = %principal.uid, %err, "staged referral code rejected");
                        SignInReferral::Rejected(err)
                    }
                }
            }
        };

        // pick up rows the referral just touched (referred_by stamp)
        if let Ok(Some(fresh)) = self.users.get_by_uid(principal.uid.as_str()).await {
            user = fresh;
        }

        Ok(SignInOutcome { user, referral })
    }

    /// Complete a referral for the authenticated referee.
    ///
    /// The duplicate gate runs twice: a pre-check re-read at call time
    /// for a friendly early rejection, then the store's unique index at
    /// insert time, which is the one that actually decides.
    pub async fn complete_referral(
        &self,
        principal: &Principal,
        code: &ReferralCode,
    ) -> ReferralResult<CompletedReferral> {
        let referrer = self
            .users
            .get_by_code(code.as_str())
            .await
            .map_err(ReferralError::from)?
            .ok_or_else(|| ReferralError::InvalidCode {
                code: code.as_str().to_string(),
            })?;

        if referrer.uid == principal.uid.as_str() || referrer.email == principal.email.as_str() {
            return Err(ReferralError::SelfReferral);
        }

        if self
            .activities
            .get_by_referee_email(principal.email.as_str())
            .await
            .map_err(ReferralError::from)?
            .is_some()
        {
            return Err(ReferralError::AlreadyReferred {
                email: principal.email.as_str().to_string(),
            });
        }

        let activity = ReferralActivityEntity::new(
            referrer.uid.clone(),
            principal.email.as_str(),
            self.config.reward_per_referral,
        )
        .with_referee_uid(principal.uid.as_str());

        let activity = match self.activities.insert(activity).await {
            Ok(activity) => activity,
            Err(err) if err.is_unique_violation() => {
                // someone else inserted between the pre-check and here
                return Err(ReferralError::AlreadyReferred {
                    email: principal.email.as_str().to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            referrer = %referrer.uid,
            referee = %principal.uid,
            activity = %activity.id,
            "referral tracked"
        );

        let discounts_minted = self.mint_discount_pair(&referrer, principal).await;

        let referrer = self.update_referrer_stats(&referrer).await?;

        // one-time back-reference; a repeat stamp changes nothing
        if let Err(err) = self
            .users
            .set_referred_by(principal.uid.as_str(), &referrer.uid)
            .await
        {
            warn!(referee = %principal.uid, %err, "failed to stamp referred_by");
        }

        Ok(CompletedReferral {
            activity,
            referrer,
            discounts_minted,
        })
    }

    /// Redeem a discount for the calling user.
    ///
    /// Silent on every failure path: an unknown id, a discount owned by
    /// someone else, or one already redeemed is logged and swallowed,
    /// so redeeming twice is harmless from the caller's perspective.
    pub async fn redeem(&self, caller: &UserId, discount_id: &str) {
        let discount = match self.discounts.get(discount_id).await {
            Ok(Some(discount)) => discount,
            Ok(None) => {
                warn!(%discount_id, "redeem requested for unknown discount");
                return;
            }
            Err(err) => {
                warn!(%discount_id, %err, "discount lookup failed during redeem");
                return;
            }
        };

        if discount.user_uid != caller.as_str() {
            warn!(
                %discount_id,
                caller = %caller,
                owner = %discount.user_uid,
                "redeem refused: discount belongs to another user"
            );
            return;
        }
        if !discount.is_active {
            debug!(%discount_id, "discount already redeemed");
            return;
        }

        if let Err(err) = self.discounts.deactivate(discount_id, Utc::now()).await {
            warn!(%discount_id, %err, "failed to deactivate discount");
        }
    }

    /// Record a completed purchase and roll it up into referral state.
    pub async fn track_purchase(
        &self,
        principal: &Principal,
        request: TrackPurchase,
    ) -> ReferralResult<ReferralPurchaseEntity> {
        // was this buyer referred? tolerate a failed read as "no"
        let activity = match self
            .activities
            .get_by_referee_email(principal.email.as_str())
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!(uid = %principal.uid, %err, "activity lookup failed, recording unattributed purchase");
                None
            }
        };

        let mut purchase = ReferralPurchaseEntity::new(
            principal.uid.as_str(),
            request.product_id,
            request.product_name,
            request.amount,
        )
        .with_discount_amount(request.discount_amount);
        if let Some(activity) = &activity {
            purchase = purchase
                .with_referrer(activity.referrer_uid.clone())
                .with_activity(activity.id.clone());
        }

        let purchase = self
            .purchases
            .insert(purchase)
            .await
            .map_err(ReferralError::from)?;

        if let Some(discount_id) = &request.discount_id {
            self.redeem(&principal.uid, discount_id).await;
        }

        if let Some(mut activity) = activity {
            activity.record_purchase(request.amount, purchase.purchased_at);
            if let Err(err) = self.activities.update(&activity).await {
                warn!(activity = %activity.id, %err, "failed to roll purchase into activity");
            } else {
                self.refresh_referrer_conversion(&activity.referrer_uid).await;
            }
        }

        self.bump_purchaser_stats(principal.uid.as_str()).await;

        Ok(purchase)
    }

    /// Shareable referral link for a user.
    pub fn generate_referral_link(&self, user: &ReferralUserEntity) -> String {
        referral_link(
            &self.config.base_url,
            &ReferralCode::new(user.referral_code.clone()),
        )
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    /// Create the user row, regenerating the code on collisions.
    async fn create_user(&self, principal: &Principal) -> ReferralResult<ReferralUserEntity> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = referral_core::generate_code(&principal.uid, Utc::now());
            let entity = ReferralUserEntity::new(principal, &code);
            match self.users.create(entity).await {
                Ok(user) => {
                    info!(uid = %user.uid, code = %user.referral_code, "referral user created");
                    return Ok(user);
                }
                Err(StoreError::UniqueViolation { constraint }) if constraint.contains("uid") => {
                    // a concurrent sign-in won the insert; use its row
                    return self
                        .users
                        .get_by_uid(principal.uid.as_str())
                        .await
                        .map_err(ReferralError::from)?
                        .ok_or_else(|| ReferralError::UserNotFound {
                            uid: principal.uid.as_str().to_string(),
                        });
                }
                Err(err) if err.is_unique_violation() => {
                    warn!(uid = %principal.uid, attempt, "referral code collision, regenerating");
                    if attempt >= self.config.code_collision_attempts {
                        return Err(ReferralError::CodeCollision { attempts: attempt });
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Mint the discount pair, best effort relative to the activity.
    async fn mint_discount_pair(
        &self,
        referrer: &ReferralUserEntity,
        referee: &Principal,
    ) -> usize {
        if let Err(err) = validate_percentage(self.config.discount_percentage) {
            error!(%err, "configured discount percentage is invalid, minting nothing");
            return 0;
        }

        let mut minted = 0;
        for (owner, party) in [
            (referee.uid.as_str(), "referee"),
            (referrer.uid.as_str(), "referrer"),
        ] {
            let discount = ReferralDiscountEntity::new(
                owner,
                self.config.discount_percentage,
                self.config.discount_validity_days,
            )
            .with_referrer(referrer.uid.clone());

            match self.discounts.insert(discount).await {
                Ok(discount) => {
                    debug!(owner, party, discount = %discount.id, "discount minted");
                    minted += 1;
                }
                Err(err) => {
                    // the referral stands even when the reward plumbing fails
                    warn!(owner, party, %err, "discount mint failed");
                }
            }
        }
        minted
    }

    /// Persist the referrer's post-referral stats with linear-backoff
    /// retries. On exhaustion the returned state is NOT advanced - the
    /// caller sees [`ReferralError::PersistenceFailure`] and the stale
    /// totals stand until the next refresh.
    async fn update_referrer_stats(
        &self,
        referrer: &ReferralUserEntity,
    ) -> ReferralResult<ReferralUserEntity> {
        let mut updated = referrer.clone();
        updated.record_referral(self.config.reward_per_referral);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .users
                .update_stats(
                    &updated.uid,
                    updated.total_referrals,
                    updated.total_earnings,
                    updated.tier,
                )
                .await
            {
                Ok(()) => break,
                Err(err) if attempt < self.config.stat_update_attempts => {
                    warn!(uid = %updated.uid, attempt, %err, "stat update failed, retrying");
                    tokio::time::sleep(self.config.stat_retry_base_delay * attempt).await;
                }
                Err(err) => {
                    error!(uid = %updated.uid, attempt, %err, "stat update exhausted retries");
                    return Err(ReferralError::PersistenceFailure { attempts: attempt });
                }
            }
        }

        if let Err(err) = self.users.set_is_referrer(&updated.uid, true).await {
            warn!(uid = %updated.uid, %err, "failed to set referrer flag");
        }

        Ok(updated)
    }

    /// Recompute the referrer's conversion rate from their activities.
    async fn refresh_referrer_conversion(&self, referrer_uid: &str) {
        let activities = match self.activities.list_for_referrer(referrer_uid).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(uid = %referrer_uid, %err, "skipping conversion refresh");
                return;
            }
        };
        if activities.is_empty() {
            return;
        }
        let conversions = activities.iter().filter(|a| a.is_converted()).count();
        let rate = (Decimal::from(conversions as u64) * Decimal::ONE_HUNDRED
            / Decimal::from(activities.len() as u64))
        .round_dp(2);

        let total_purchases = match self.users.get_by_uid(referrer_uid).await {
            Ok(Some(user)) => user.total_purchases,
            _ => 0,
        };
        if let Err(err) = self
            .users
            .update_purchase_stats(referrer_uid, total_purchases, rate)
            .await
        {
            warn!(uid = %referrer_uid, %err, "failed to persist conversion rate");
        }
    }

    /// Bump the buyer's own purchase count.
    async fn bump_purchaser_stats(&self, uid: &str) {
        let user = match self.users.get_by_uid(uid).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(err) => {
                warn!(%uid, %err, "skipping purchaser stat bump");
                return;
            }
        };
        if let Err(err) = self
            .users
            .update_purchase_stats(uid, user.total_purchases + 1, user.conversion_rate)
            .await
        {
            warn!(%uid, %err, "failed to bump purchase count");
        }
    }
}
