//! Stream joiner runner.
//!
//! State machine: `Warming up -> Ready`. The primary subscription is
//! taken before the warm-up wait, so primary messages arriving early are
//! held in the subscription buffer, not dropped. The warm-up wait itself
//! is unbounded: until its dependencies exist the joiner has no other
//! useful work.

use crate::error::{JoinError, JoinResult};
use chainpulse_bus::{Bus, LatestValueCache};
use chainpulse_core::{Message, Payload, Topic};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Per-joiner configuration. Created at startup, never mutated.
#[derive(Debug, Clone)]
pub struct JoinContext {
    /// Topic whose every message triggers a join.
    pub primary: Topic,
    /// Topics whose latest values feed the join.
    pub auxiliaries: Vec<Topic>,
    /// Topic the derived message is published to.
    pub result: Topic,
}

/// Latest auxiliary values, read once per primary message.
///
/// There is no snapshot isolation across topics: each value is simply
/// the latest at the moment it was read.
pub struct AuxValues {
    values: Vec<(Topic, Payload)>,
}

impl AuxValues {
    pub fn get(&self, topic: Topic) -> Option<&Payload> {
        self.values
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, payload)| payload)
    }

    /// The latest ETH/USD price, if that topic is among the auxiliaries.
    pub fn eth_price(&self) -> Option<f64> {
        self.get(chainpulse_core::topic::TOPIC_ETH_PRICE)
            .and_then(|p| p.as_eth_price())
            .map(|p| p.price)
    }
}

#[cfg(test)]
impl AuxValues {
    pub(crate) fn for_tests(values: Vec<(Topic, Payload)>) -> Self {
        Self { values }
    }
}

/// The join function seam.
///
/// `apply` may suspend (external lookups); a per-message failure is an
/// error the runner reports and skips, never a crash.
pub trait Join: Send + Sync {
    fn apply(
        &self,
        primary: &Message,
        aux: &AuxValues,
    ) -> impl Future<Output = JoinResult<Payload>> + Send;
}

/// Subscribes to a primary topic and derives one result message per
/// primary message from the latest auxiliary values.
pub struct StreamJoiner<J: Join> {
    ctx: JoinContext,
    join: J,
    bus: Arc<Bus>,
    cache: Arc<LatestValueCache>,
}

impl<J: Join> StreamJoiner<J> {
    pub fn new(ctx: JoinContext, join: J, bus: Arc<Bus>, cache: Arc<LatestValueCache>) -> Self {
        Self {
            ctx,
            join,
            bus,
            cache,
        }
    }

    /// Warm up, then process primary messages until the bus goes away.
    pub async fn run(&self) {
        // Subscribe before warming up so early primary messages are held.
        let mut primary_rx = self.bus.subscribe(self.ctx.primary);

        info!(
            primary = %self.ctx.primary,
            auxiliaries = ?self.ctx.auxiliaries.iter().map(Topic::as_str).collect::<Vec<_>>(),
            "Warming up"
        );
        for aux in &self.ctx.auxiliaries {
            self.cache.wait_present(*aux).await;
        }
        info!(primary = %self.ctx.primary, result = %self.ctx.result, "Ready");

        loop {
            match primary_rx.recv().await {
                Ok(msg) => self.process(msg).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(primary = %self.ctx.primary, skipped, "Joiner lagged, messages lost");
                }
                Err(RecvError::Closed) => {
                    info!(primary = %self.ctx.primary, "Primary topic closed, joiner exiting");
                    return;
                }
            }
        }
    }

    async fn process(&self, msg: Message) {
        let mut values = Vec::with_capacity(self.ctx.auxiliaries.len());
        for aux in &self.ctx.auxiliaries {
            match self.cache.read(*aux) {
                Some((payload, _seq)) => values.push((*aux, payload)),
                None => {
                    // Unreachable after warm-up; report rather than trust that.
                    warn!(primary = %self.ctx.primary, auxiliary = %aux, "Auxiliary value missing, skipping message");
                    return;
                }
            }
        }
        let aux = AuxValues { values };

        match self.join.apply(&msg, &aux).await {
            Ok(payload) => {
                debug!(result = %self.ctx.result, kind = payload.kind(), "Join produced result");
                self.bus.publish(self.ctx.result, payload);
            }
            Err(e) => {
                warn!(primary = %self.ctx.primary, error = %e, "Join skipped message");
            }
        }
    }
}

/// Reject a payload that does not match the joiner's primary schema.
pub(crate) fn unexpected(topic: Topic, payload: &Payload) -> JoinError {
    JoinError::UnexpectedPayload {
        topic,
        kind: payload.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainpulse_core::topic::{TOPIC_ETH_GAS_PRICE, TOPIC_ETH_GAS_TICK, TOPIC_ETH_PRICE};
    use chainpulse_core::types::{EthPrice, GasPrice, GasTick};
    use std::time::Duration;

    /// Multiplies the primary gas tick's rapid tier by the latest price.
    struct RapidTimesPrice;

    impl Join for RapidTimesPrice {
        async fn apply(&self, primary: &Message, aux: &AuxValues) -> JoinResult<Payload> {
            let tick = primary
                .payload
                .as_gas_tick()
                .ok_or_else(|| unexpected(primary.topic, &primary.payload))?;
            let price = aux
                .eth_price()
                .ok_or(JoinError::MissingAux(TOPIC_ETH_PRICE))?;
            Ok(Payload::GasPrice(GasPrice {
                rapid: tick.rapid * price,
                fast: 0.0,
                standard: 0.0,
                slow: 0.0,
                timestamp: tick.timestamp,
            }))
        }
    }

    fn gas_tick(rapid: f64) -> Payload {
        Payload::GasTick(GasTick {
            rapid,
            fast: 0.0,
            standard: 0.0,
            slow: 0.0,
            timestamp: 1,
        })
    }

    fn ctx() -> JoinContext {
        JoinContext {
            primary: TOPIC_ETH_GAS_TICK,
            auxiliaries: vec![TOPIC_ETH_PRICE],
            result: TOPIC_ETH_GAS_PRICE,
        }
    }

    fn spawn_joiner(
        bus: &Arc<Bus>,
        cache: &Arc<LatestValueCache>,
    ) -> tokio::task::JoinHandle<()> {
        let joiner = StreamJoiner::new(ctx(), RapidTimesPrice, bus.clone(), cache.clone());
        tokio::spawn(async move { joiner.run().await })
    }

    async fn recv_result(
        rx: &mut tokio::sync::broadcast::Receiver<Message>,
    ) -> Message {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for derived message")
            .unwrap()
    }

    #[tokio::test]
    async fn test_join_uses_latest_not_earliest() {
        let bus = Arc::new(Bus::default());
        let cache = Arc::new(LatestValueCache::new());
        let mut result_rx = bus.subscribe(TOPIC_ETH_GAS_PRICE);

        cache.update(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 100.0 }));
        cache.update(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 110.0 }));

        let _joiner = spawn_joiner(&bus, &cache);
        // Let the joiner pass warm-up before publishing the primary.
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.publish(TOPIC_ETH_GAS_TICK, gas_tick(1.0));

        let msg = recv_result(&mut result_rx).await;
        match msg.payload {
            Payload::GasPrice(gp) => assert_eq!(gp.rapid, 110.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_warm_up_holds_primary_messages() {
        let bus = Arc::new(Bus::default());
        let cache = Arc::new(LatestValueCache::new());
        let mut result_rx = bus.subscribe(TOPIC_ETH_GAS_PRICE);

        let _joiner = spawn_joiner(&bus, &cache);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Primary arrives before any auxiliary value exists.
        bus.publish(TOPIC_ETH_GAS_TICK, gas_tick(2.0));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(result_rx.try_recv().is_err(), "no output before warm-up");

        // First auxiliary value ends the warm-up; the held message joins.
        cache.update(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 50.0 }));

        let msg = recv_result(&mut result_rx).await;
        match msg.payload {
            Payload::GasPrice(gp) => assert_eq!(gp.rapid, 100.0),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_primary_payload_is_skipped() {
        let bus = Arc::new(Bus::default());
        let cache = Arc::new(LatestValueCache::new());
        let mut result_rx = bus.subscribe(TOPIC_ETH_GAS_PRICE);

        cache.update(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 100.0 }));
        let _joiner = spawn_joiner(&bus, &cache);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Wrong schema on the primary topic: dropped, joiner keeps going.
        bus.publish(TOPIC_ETH_GAS_TICK, Payload::EthPrice(EthPrice { price: 1.0 }));
        bus.publish(TOPIC_ETH_GAS_TICK, gas_tick(3.0));

        let msg = recv_result(&mut result_rx).await;
        match msg.payload {
            Payload::GasPrice(gp) => assert_eq!(gp.rapid, 300.0),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(result_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_aux_values_lookup() {
        let aux = AuxValues {
            values: vec![(TOPIC_ETH_PRICE, Payload::EthPrice(EthPrice { price: 7.0 }))],
        };
        assert_eq!(aux.eth_price(), Some(7.0));
        assert!(aux.get(TOPIC_ETH_GAS_TICK).is_none());
    }
}
