//! Leaderboard Service

use std::sync::Arc;

use referral_core::{rank_referrers, LeaderboardEntry, Tier, UserId};
use referral_store::UserRepository;
use tracing::warn;

/// Ranks the top referrers by total referral count.
pub struct LeaderboardService {
    users: Arc<dyn UserRepository>,
}

impl LeaderboardService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The top `limit` referrers, descending by referral count.
    ///
    /// Users with zero referrals never appear. A failed read yields an
    /// empty board rather than an error.
    pub async fn top_referrers(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let rows = match self.users.top_referrers(limit).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(%err, "leaderboard read failed, defaulting to empty");
                return Vec::new();
            }
        };

        let entries = rows
            .into_iter()
            .map(|user| LeaderboardEntry {
                uid: UserId::new(user.uid),
                display_name: user.display_name,
                total_referrals: user.total_referrals.max(0) as u64,
                tier: Tier::for_referrals(user.total_referrals.max(0) as u64),
            })
            .collect();

        // re-apply the ranking rule so backend ordering quirks cannot leak
        rank_referrers(entries, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_core::{Principal, ReferralCode};
    use referral_store::{MemoryStore, ReferralUserEntity};

    #[tokio::test]
    async fn test_top_referrers_ordering_and_exclusion() {
        let store = Arc::new(MemoryStore::new());
        for (uid, code, count) in [
            ("user_a", "AAAA1111", 12_i64),
            ("user_b", "BBBB2222", 40),
            ("user_c", "CCCC3333", 0),
            ("user_d", "DDDD4444", 7),
        ] {
            let mut entity = ReferralUserEntity::new(
                &Principal::new(uid, format!("{}@example.com", uid)),
                &ReferralCode::new(code),
            );
            entity.total_referrals = count;
            store.create(entity).await.unwrap();
        }

        let board = LeaderboardService::new(store).top_referrers(2).await;
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].uid.as_str(), "user_b");
        assert_eq!(board[0].tier, Tier::Platinum);
        assert_eq!(board[1].uid.as_str(), "user_a");
    }
}
