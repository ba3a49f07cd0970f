//! Bonding-curve account layout + PDA derivation, grounded on the
//! reference implementation's `get_bonding_curve_account` helper (pump.fun
//! program account layout: 8-byte discriminator followed by five `u64`
//! reserve/supply fields and a `bool` completion flag).

use crate::error::{AppError, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;

const DISCRIMINATOR_LEN: usize = 8;
const ACCOUNT_LEN: usize = DISCRIMINATOR_LEN + 8 * 5 + 1;

#[derive(Debug, Clone, Copy)]
pub struct BondingCurveAccount {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
}

pub fn derive_bonding_curve_address(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"bonding-curve", mint.as_ref()], program_id)
}

pub async fn fetch(
    client: &RpcClient,
    mint: &Pubkey,
    program_id: &Pubkey,
) -> Result<BondingCurveAccount> {
    let (address, _bump) = derive_bonding_curve_address(mint, program_id);
    let account = client
        .get_account(&address)
        .await
        .map_err(|e| AppError::BuildFailed(format!("bonding curve account not found: {e}")))?;

    parse(&account.data)
}

fn parse(data: &[u8]) -> Result<BondingCurveAccount> {
    if data.len() < ACCOUNT_LEN {
        return Err(AppError::Parse("bonding curve account too short".into()));
    }
    let mut cursor = DISCRIMINATOR_LEN;
    let mut read_u64 = || {
        let bytes: [u8; 8] = data[cursor..cursor + 8].try_into().unwrap();
        cursor += 8;
        u64::from_le_bytes(bytes)
    };

    let virtual_token_reserves = read_u64();
    let virtual_sol_reserves = read_u64();
    let real_token_reserves = read_u64();
    let real_sol_reserves = read_u64();
    let token_total_supply = read_u64();
    let complete = data[cursor] != 0;

    Ok(BondingCurveAccount {
        virtual_token_reserves,
        virtual_sol_reserves,
        real_token_reserves,
        real_sol_reserves,
        token_total_supply,
        complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_layout() {
        let mut data = vec![0u8; ACCOUNT_LEN];
        data[8..16].copy_from_slice(&1_000_000_000u64.to_le_bytes());
        data[16..24].copy_from_slice(&30_000_000_000u64.to_le_bytes());
        data[ACCOUNT_LEN - 1] = 1;

        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.virtual_token_reserves, 1_000_000_000);
        assert_eq!(parsed.virtual_sol_reserves, 30_000_000_000);
        assert!(parsed.complete);
    }
}
