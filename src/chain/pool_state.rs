//! Raydium CPMM pool account layout, grounded on a sibling example's
//! `RaydiumCpmmPoolState` — the same "parse fixed offsets off raw account
//! bytes" approach already used for the bonding-curve account.

use crate::error::{AppError, Result};
use solana_sdk::pubkey::Pubkey;

const MIN_LEN: usize = 193;

#[derive(Debug, Clone, Copy)]
pub struct CpmmPoolState {
    pub pool_id: Pubkey,
    pub token_0_mint: Pubkey,
    pub token_1_mint: Pubkey,
    pub token_0_vault: Pubkey,
    pub token_1_vault: Pubkey,
    pub authority: Pubkey,
}

impl CpmmPoolState {
    pub fn parse(pool_id: &Pubkey, data: &[u8]) -> Result<Self> {
        if data.len() < MIN_LEN {
            return Err(AppError::Parse(format!(
                "cpmm pool account too short: {} bytes, expected at least {}",
                data.len(),
                MIN_LEN
            )));
        }
        Ok(Self {
            pool_id: *pool_id,
            authority: parse_pubkey(data, 1)?,
            token_0_mint: parse_pubkey(data, 33)?,
            token_1_mint: parse_pubkey(data, 65)?,
            token_0_vault: parse_pubkey(data, 97)?,
            token_1_vault: parse_pubkey(data, 129)?,
        })
    }

    /// Which vault/mint side the given mint sits on, if either.
    pub fn side_for(&self, mint: &Pubkey) -> Option<PoolSide> {
        if *mint == self.token_0_mint {
            Some(PoolSide::Zero)
        } else if *mint == self.token_1_mint {
            Some(PoolSide::One)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSide {
    Zero,
    One,
}

fn parse_pubkey(data: &[u8], offset: usize) -> Result<Pubkey> {
    if data.len() < offset + 32 {
        return Err(AppError::Parse(format!(
            "not enough data to parse pubkey at offset {offset}"
        )));
    }
    let bytes: [u8; 32] = data[offset..offset + 32].try_into().unwrap();
    Ok(Pubkey::new_from_array(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vault_and_mint_offsets() {
        let pool_id = Pubkey::new_unique();
        let token_0_mint = Pubkey::new_unique();
        let token_1_mint = Pubkey::new_unique();
        let mut data = vec![0u8; MIN_LEN];
        data[33..65].copy_from_slice(token_0_mint.as_ref());
        data[65..97].copy_from_slice(token_1_mint.as_ref());

        let state = CpmmPoolState::parse(&pool_id, &data).unwrap();
        assert_eq!(state.token_0_mint, token_0_mint);
        assert_eq!(state.side_for(&token_0_mint), Some(PoolSide::Zero));
        assert_eq!(state.side_for(&token_1_mint), Some(PoolSide::One));
    }

    #[test]
    fn rejects_truncated_account() {
        let pool_id = Pubkey::new_unique();
        let data = vec![0u8; 100];
        assert!(CpmmPoolState::parse(&pool_id, &data).is_err());
    }
}
