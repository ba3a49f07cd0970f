use copytrade_engine::processor::transaction::parse_transaction;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;

fn bench_parse_transaction(c: &mut Criterion) {
    let tx_json = json!({
        "transaction": {
            "message": {
                "accountKeys": [
                    "User111111111111111111111111111111111111111",
                    "Pool111111111111111111111111111111111111111",
                    "MintUSDC11111111111111111111111111111111111",
                    "SystemProgram111111111111111111111111111111",
                    "TokenProgram1111111111111111111111111111111"
                ]
            }
        },
        "meta": {
            "preBalances": [1000000000u64, 5000000000u64, 0, 0, 0],
            "postBalances": [ 900000000u64, 5100000000u64, 0, 0, 0],
            "preTokenBalances": [
                {
                    "accountIndex": 0,
                    "mint": "MintUSDC11111111111111111111111111111111111",
                    "uiTokenAmount": { "amount": "0", "decimals": 6 }
                }
            ],
            "postTokenBalances": [
                {
                    "accountIndex": 0,
                    "mint": "MintUSDC11111111111111111111111111111111111",
                    "uiTokenAmount": { "amount": "1000000", "decimals": 6 }
                }
            ],
            "loadedAddresses": {
                "writable": [],
                "readonly": []
            }
        }
    });

    c.bench_function("parse_transaction", |b| {
        b.iter(|| parse_transaction(black_box("sig1"), black_box(&tx_json)))
    });
}

criterion_group!(benches, bench_parse_transaction);
criterion_main!(benches);
