//! Decoding of audit events from a deployment block

use alloy::primitives::Address;
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::amount::FixedPointAmount;
use crate::chain::{ChainReader, LogQuery};
use crate::error::{Error, Result};
use crate::types::MotherlodeBreakdown;

sol! {
    /// One-time mint splitting the fixed issuance into three tranches
    #[derive(Debug, PartialEq, Eq)]
    event MotherlodeMinted(
        address indexed vault,
        uint256 total,
        uint256 gold,
        uint256 silver,
        uint256 copper
    );
}

impl From<MotherlodeMinted> for MotherlodeBreakdown {
    fn from(event: MotherlodeMinted) -> Self {
        Self {
            vault: event.vault,
            total: FixedPointAmount::from_base_units(event.total),
            gold: FixedPointAmount::from_base_units(event.gold),
            silver: FixedPointAmount::from_base_units(event.silver),
            copper: FixedPointAmount::from_base_units(event.copper),
        }
    }
}

/// Reads events emitted in a known block
pub struct EventDecoder<'a> {
    chain: &'a dyn ChainReader,
}

impl<'a> EventDecoder<'a> {
    pub fn new(chain: &'a dyn ChainReader) -> Self {
        Self { chain }
    }

    /// First `E` emitted by `address` in `block_number`, in emission order.
    ///
    /// No match is `Ok(None)`. A log carrying the event's signature that
    /// does not decode is an error.
    pub async fn first_event<E: SolEvent>(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<Option<E>> {
        let query = LogQuery::single_block(address, E::SIGNATURE_HASH, block_number);
        let logs = self.chain.logs(&query).await?;

        if logs.len() > 1 {
            tracing::warn!(
                event = E::SIGNATURE,
                block = block_number,
                count = logs.len(),
                "Multiple matching events, using the first"
            );
        }

        let Some(log) = logs.into_iter().next() else {
            return Ok(None);
        };

        E::decode_log_data(&log.data)
            .map(Some)
            .map_err(|e| Error::EventDecode {
                event: E::SIGNATURE,
                reason: e.to_string(),
            })
    }

    /// Motherlode breakdown from the token's deployment block, if emitted
    pub async fn decode_motherlode(
        &self,
        address: Address,
        block_number: u64,
    ) -> Result<Option<MotherlodeBreakdown>> {
        let event = self
            .first_event::<MotherlodeMinted>(address, block_number)
            .await?;
        Ok(event.map(MotherlodeBreakdown::from))
    }
}
