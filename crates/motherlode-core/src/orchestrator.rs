//! Sequential deployment of a plan

use std::collections::HashSet;

use alloy::primitives::Address;

use crate::chain::Deployer;
use crate::confirm::ConfirmationWaiter;
use crate::error::{Error, Result};
use crate::types::{ConstructorArg, DeployedContractReceipt, DeploymentParams, DeploymentTarget};

/// Deploys targets one at a time, confirming each before the next.
///
/// The first failure aborts the run. Contracts already deployed stay on
/// chain; nothing is rolled back.
pub struct DeploymentOrchestrator<'a> {
    deployer: &'a dyn Deployer,
    waiter: ConfirmationWaiter<'a>,
    params: &'a DeploymentParams,
}

impl<'a> DeploymentOrchestrator<'a> {
    pub fn new(
        deployer: &'a dyn Deployer,
        waiter: ConfirmationWaiter<'a>,
        params: &'a DeploymentParams,
    ) -> Self {
        Self {
            deployer,
            waiter,
            params,
        }
    }

    /// Deploy `targets` in order, returning one receipt per target
    pub async fn deploy(&self, targets: &[DeploymentTarget]) -> Result<Vec<DeployedContractReceipt>> {
        validate_targets(targets, self.params)?;
        for target in targets {
            let args = preview_args(target, self.params)?;
            self.deployer.prepare(&target.name, &args)?;
        }

        let mut receipts: Vec<DeployedContractReceipt> = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            let args = resolve_args(target, self.params, &receipts)?;

            tracing::info!(
                step = index + 1,
                of = targets.len(),
                contract = %target.name,
                "Submitting deployment"
            );
            let pending = self.deployer.submit(&target.name, &args).await?;

            tracing::info!(
                contract = %target.name,
                tx = %pending.tx_hash,
                address = %pending.address,
                "Waiting for confirmation"
            );
            let confirmed = self.waiter.confirm(pending.tx_hash).await?;

            if let Some(reported) = confirmed.contract_address {
                if reported != pending.address {
                    return Err(Error::deployment(
                        &target.name,
                        format!(
                            "receipt reports contract at {} but {} was expected",
                            reported, pending.address
                        ),
                    ));
                }
            }

            let receipt =
                DeployedContractReceipt::confirmed(target, pending, confirmed.confirmation);
            check_sequence(&receipts, &receipt)?;

            tracing::info!(
                contract = %receipt.name,
                address = %receipt.address,
                block = receipt.block_number,
                "Deployment confirmed"
            );
            receipts.push(receipt);
        }

        Ok(receipts)
    }
}

/// Reject plans that could only fail midway: duplicate names, unknown
/// parameters and references to targets that are not deployed earlier.
pub fn validate_targets(targets: &[DeploymentTarget], params: &DeploymentParams) -> Result<()> {
    let mut seen = HashSet::new();

    for target in targets {
        for arg in &target.args {
            match arg {
                ConstructorArg::AddressOf { address_of } if !seen.contains(address_of.as_str()) => {
                    return Err(Error::config(format!(
                        "{} references {}, which is not deployed before it",
                        target.name, address_of
                    )));
                }
                ConstructorArg::Param { param } if params.get(param).is_none() => {
                    return Err(Error::config(format!(
                        "{} references unknown parameter '{}'",
                        target.name, param
                    )));
                }
                _ => {}
            }
        }

        if !seen.insert(target.name.as_str()) {
            return Err(Error::config(format!(
                "{} appears more than once in the deployment plan",
                target.name
            )));
        }
    }

    Ok(())
}

fn resolve_args(
    target: &DeploymentTarget,
    params: &DeploymentParams,
    deployed: &[DeployedContractReceipt],
) -> Result<Vec<serde_json::Value>> {
    target
        .args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Literal(value) => Ok(value.clone()),
            ConstructorArg::Param { param } => params.get(param).ok_or_else(|| {
                Error::config(format!("Unknown parameter '{}' for {}", param, target.name))
            }),
            ConstructorArg::AddressOf { address_of } => deployed
                .iter()
                .find(|r| &r.name == address_of)
                .map(|r| serde_json::Value::String(r.address.to_checksum(None)))
                .ok_or_else(|| {
                    Error::config(format!(
                        "{} is not deployed yet, needed by {}",
                        address_of, target.name
                    ))
                }),
        })
        .collect()
}

/// Arguments as `resolve_args` will produce them, with the zero address
/// standing in for contracts not deployed yet
fn preview_args(target: &DeploymentTarget, params: &DeploymentParams) -> Result<Vec<serde_json::Value>> {
    target
        .args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::AddressOf { .. } => {
                Ok(serde_json::Value::String(Address::ZERO.to_checksum(None)))
            }
            ConstructorArg::Literal(value) => Ok(value.clone()),
            ConstructorArg::Param { param } => params.get(param).ok_or_else(|| {
                Error::config(format!("Unknown parameter '{}' for {}", param, target.name))
            }),
        })
        .collect()
}

fn check_sequence(
    previous: &[DeployedContractReceipt],
    next: &DeployedContractReceipt,
) -> Result<()> {
    if previous.iter().any(|r| r.address == next.address) {
        return Err(Error::deployment(
            &next.name,
            format!("address {} was already used in this run", next.address),
        ));
    }
    if let Some(last) = previous.last() {
        if next.block_number < last.block_number {
            return Err(Error::deployment(
                &next.name,
                format!(
                    "confirmed in block {} before {} (block {})",
                    next.block_number, last.name, last.block_number
                ),
            ));
        }
    }
    Ok(())
}
