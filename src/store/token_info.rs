use super::models::TokenInfo;
use super::Store;
use crate::error::Result;

impl Store {
    pub async fn get_token_info(&self, mint: &str) -> Result<Option<TokenInfo>> {
        let row = sqlx::query_as::<_, TokenInfo>("SELECT * FROM token_info WHERE mint = $1")
            .bind(mint)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Upsert on refetch — the Token Info Cache's DB-backed tier falls back
    /// here on a miss and writes back whatever the metadata collaborator
    /// returned (§6).
    pub async fn upsert_token_info(&self, info: &TokenInfo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO token_info (mint, name, symbol, decimals, token_program, fetched_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (mint) DO UPDATE SET
                name = EXCLUDED.name,
                symbol = EXCLUDED.symbol,
                decimals = EXCLUDED.decimals,
                token_program = EXCLUDED.token_program,
                fetched_at = EXCLUDED.fetched_at
            "#,
        )
        .bind(&info.mint)
        .bind(&info.name)
        .bind(&info.symbol)
        .bind(info.decimals)
        .bind(&info.token_program)
        .bind(info.fetched_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
