//! End-to-end pipeline tests: raw event -> ingestor -> bus -> tracker ->
//! joiner -> derived message.

use chainpulse_bus::{Bus, LatestValueCache};
use chainpulse_core::topic::{
    TOPIC_ETH_BLOCK_HEADER, TOPIC_ETH_GAS_PRICE, TOPIC_ETH_GAS_TICK, TOPIC_ETH_MINER_REVENUE,
    TOPIC_ETH_PRICE,
};
use chainpulse_core::types::{BlockHeader, EthPrice, Payload};
use chainpulse_core::units::TRANSFER_GAS_LIMIT;
use chainpulse_core::Message;
use chainpulse_feed::{parse_eth_price_tick, parse_gas_tick, FeedIngestor};
use chainpulse_join::{
    track_latest, GasUsdJoin, JoinContext, MinerRevenueJoin, StreamJoiner,
};
use chainpulse_lookup::{BlockReward, LookupError, LookupResult, RewardFetcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

async fn recv_result(rx: &mut broadcast::Receiver<Message>) -> Message {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for derived message")
        .unwrap()
}

#[tokio::test]
async fn test_gas_pipeline_from_raw_events() {
    let bus = Arc::new(Bus::default());
    let cache = Arc::new(LatestValueCache::new());
    let mut result_rx = bus.subscribe(TOPIC_ETH_GAS_PRICE);

    // ETH price feed -> bus -> cache.
    let (price_tx, price_inbound) = mpsc::channel(8);
    let price_ingestor = FeedIngestor::new(TOPIC_ETH_PRICE, parse_eth_price_tick, bus.clone());
    tokio::spawn(async move { price_ingestor.run(price_inbound).await });
    tokio::spawn(track_latest(bus.clone(), cache.clone(), TOPIC_ETH_PRICE));

    // Gas feed -> bus -> joiner.
    let (gas_tx, gas_inbound) = mpsc::channel(8);
    let gas_ingestor = FeedIngestor::new(TOPIC_ETH_GAS_TICK, parse_gas_tick, bus.clone());
    tokio::spawn(async move { gas_ingestor.run(gas_inbound).await });

    let joiner = StreamJoiner::new(
        JoinContext {
            primary: TOPIC_ETH_GAS_TICK,
            auxiliaries: vec![TOPIC_ETH_PRICE],
            result: TOPIC_ETH_GAS_PRICE,
        },
        GasUsdJoin::new(TRANSFER_GAS_LIMIT),
        bus.clone(),
        cache.clone(),
    );
    tokio::spawn(async move { joiner.run().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // A gas tick arrives before any price: held, not dropped.
    gas_tx
        .send(
            r#"{"type":"gasprice","data":{"gasPrices":{"rapid":50000000000,"fast":40000000000,"standard":30000000000,"slow":20000000000},"timestamp":1620000000000}}"#
                .to_string(),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(result_rx.try_recv().is_err());

    // The first price warms the joiner up and releases the held tick.
    price_tx
        .send(r#"{"e":"markPriceUpdate","s":"ETHUSDT","p":"2000.0"}"#.to_string())
        .await
        .unwrap();

    let msg = recv_result(&mut result_rx).await;
    match msg.payload {
        Payload::GasPrice(gp) => {
            assert!((gp.rapid - 2.1).abs() < 1e-9);
            assert_eq!(gp.timestamp, 1_620_000_000_000);
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert_eq!(msg.topic, TOPIC_ETH_GAS_PRICE);
}

/// Fails every lookup below `good_from`, succeeds at or above it.
struct FlakyFetcher {
    good_from: u64,
}

impl RewardFetcher for FlakyFetcher {
    async fn fetch_block_reward(&self, number: u64) -> LookupResult<BlockReward> {
        if number < self.good_from {
            Err(LookupError::Exhausted { attempts: 3 })
        } else {
            Ok(BlockReward {
                block_number: number,
                time_stamp: 1_620_000_000,
                block_miner: "0xminer".to_string(),
                block_reward: 2_000_000_000_000_000_000,
            })
        }
    }
}

#[tokio::test]
async fn test_exhausted_lookup_skips_block_and_continues() {
    let bus = Arc::new(Bus::default());
    let cache = Arc::new(LatestValueCache::new());
    let mut result_rx = bus.subscribe(TOPIC_ETH_MINER_REVENUE);

    cache.update(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 1800.0 }));

    let joiner = StreamJoiner::new(
        JoinContext {
            primary: TOPIC_ETH_BLOCK_HEADER,
            auxiliaries: vec![TOPIC_ETH_PRICE],
            result: TOPIC_ETH_MINER_REVENUE,
        },
        MinerRevenueJoin::new(FlakyFetcher { good_from: 2 }),
        bus.clone(),
        cache.clone(),
    );
    tokio::spawn(async move { joiner.run().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let header = |number: u64| {
        Payload::BlockHeader(BlockHeader {
            number,
            hash: format!("0x{number:x}"),
            timestamp: 1_620_000_000,
            miner: "0xminer".to_string(),
            gas_used: 12_000_000,
            gas_limit: 15_000_000,
        })
    };

    // Block 1 exhausts its lookup: skipped. Block 2 succeeds.
    bus.publish(TOPIC_ETH_BLOCK_HEADER, header(1));
    bus.publish(TOPIC_ETH_BLOCK_HEADER, header(2));

    let msg = recv_result(&mut result_rx).await;
    match msg.payload {
        Payload::MinerReward(r) => {
            assert_eq!(r.number, 2);
            assert!((r.reward_usd - 3600.0).abs() < 1e-9);
        }
        other => panic!("unexpected payload {other:?}"),
    }

    // Nothing was ever published for block 1.
    assert!(result_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_join_tracks_price_updates_between_primaries() {
    let bus = Arc::new(Bus::default());
    let cache = Arc::new(LatestValueCache::new());
    let mut result_rx = bus.subscribe(TOPIC_ETH_MINER_REVENUE);

    tokio::spawn(track_latest(bus.clone(), cache.clone(), TOPIC_ETH_PRICE));

    let joiner = StreamJoiner::new(
        JoinContext {
            primary: TOPIC_ETH_BLOCK_HEADER,
            auxiliaries: vec![TOPIC_ETH_PRICE],
            result: TOPIC_ETH_MINER_REVENUE,
        },
        MinerRevenueJoin::new(FlakyFetcher { good_from: 0 }),
        bus.clone(),
        cache.clone(),
    );
    tokio::spawn(async move { joiner.run().await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let header = |number: u64| {
        Payload::BlockHeader(BlockHeader {
            number,
            hash: format!("0x{number:x}"),
            timestamp: 1_620_000_000,
            miner: "0xminer".to_string(),
            gas_used: 12_000_000,
            gas_limit: 15_000_000,
        })
    };

    // Two price updates land before the primary: the join must use the
    // second one.
    bus.publish(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 100.0 }));
    bus.publish(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 110.0 }));
    tokio::time::sleep(Duration::from_millis(20)).await;

    bus.publish(TOPIC_ETH_BLOCK_HEADER, header(1));

    let msg = recv_result(&mut result_rx).await;
    match msg.payload {
        // 2 ETH * 110 USD/ETH
        Payload::MinerReward(r) => assert!((r.reward_usd - 220.0).abs() < 1e-9),
        other => panic!("unexpected payload {other:?}"),
    }
}
