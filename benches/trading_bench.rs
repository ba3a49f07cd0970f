use base64::{engine::general_purpose::STANDARD, Engine as _};
use copytrade_engine::routes::sign_base64_transaction;
use copytrade_engine::store::models::Subscription;
use criterion::{criterion_group, criterion_main, Criterion};
use solana_sdk::instruction::Instruction;
use solana_sdk::message::{v0::Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::hint::black_box;

fn sample_subscription() -> Subscription {
    Subscription {
        id: 1,
        follower_wallet: "Follower1111111111111111111111111111111111".into(),
        follower_chat: 42,
        leader_wallet: "Leader11111111111111111111111111111111111".into(),
        leader_alias: None,
        active: true,
        filter_min_buy: 100_000_000,
        max_buy_times: 3,
        max_position: 2_000_000_000,
        auto_buy: true,
        auto_sell: true,
        auto_buy_ratio: 0.1,
        min_buy_sol: 100_000_000,
        max_buy_sol: 500_000_000,
        min_sell_ratio: 0.02,
        anti_fast_trade: true,
        fast_trade_threshold: 10,
        fast_trade_duration: 60,
        fast_trade_sleep_threshold: 5,
        fast_trade_sleep_time: 3_600,
        fast_trade_window_start: 0,
        fast_trade_count: 0,
        priority_fee: 5_000,
        anti_sandwich: false,
        auto_slippage: true,
        custom_slippage: 0.1,
        current_position: 0,
        sol_sold: 0,
        sol_earned: 0,
        token_number: 0,
        failed_times: 0,
        filtered_times: 0,
    }
}

fn bench_buy_amount_sizing(c: &mut Criterion) {
    let sub = sample_subscription();
    c.bench_function("buy_amount_lamports", |b| {
        b.iter(|| copytrade_engine::shaper::buy_amount_lamports(black_box(&sub), black_box(1_000_000_000)))
    });
}

fn bench_sign_base64_transaction(c: &mut Criterion) {
    let keypair = Keypair::new();

    let instructions = vec![Instruction::new_with_bytes(Pubkey::new_unique(), &[], vec![])];
    let message = VersionedMessage::V0(
        Message::try_compile(&keypair.pubkey(), &instructions, &[], solana_sdk::hash::Hash::default())
            .unwrap(),
    );
    let tx = VersionedTransaction {
        signatures: vec![solana_sdk::signature::Signature::default()],
        message,
    };
    let tx_bytes = bincode::serialize(&tx).unwrap();
    let tx_base64 = STANDARD.encode(tx_bytes);

    c.bench_function("sign_base64_transaction", |b| {
        b.iter(|| sign_base64_transaction(black_box(&keypair), black_box(&tx_base64)))
    });
}

criterion_group!(benches, bench_buy_amount_sizing, bench_sign_base64_transaction);
criterion_main!(benches);
