use super::Store;
use crate::error::Result;

impl Store {
    /// Base58 secret key for a follower wallet. Wallet provisioning and
    /// encryption-at-rest are out of scope (§1 Non-goals); this is a plain
    /// lookup the Executor uses to build a signer.
    pub async fn get_signing_key(&self, follower_wallet: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT private_key_b58 FROM user_keys WHERE follower_wallet = $1",
        )
        .bind(follower_wallet)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(key,)| key))
    }

    pub async fn put_signing_key(&self, follower_wallet: &str, private_key_b58: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_keys (follower_wallet, private_key_b58)
            VALUES ($1, $2)
            ON CONFLICT (follower_wallet) DO UPDATE SET private_key_b58 = EXCLUDED.private_key_b58
            "#,
        )
        .bind(follower_wallet)
        .bind(private_key_b58)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
