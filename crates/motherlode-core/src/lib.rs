pub mod abi;
pub mod amount;
pub mod bytecode;
pub mod chain;
pub mod config;
pub mod confirm;
pub mod decode;
pub mod dir;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod receipt;
pub mod token;
pub mod types;

#[cfg(test)]
mod testing;

pub use abi::{encode_constructor_args, Abi, ConstructorInfo, ParamInfo};
pub use amount::{group_thousands, FixedPointAmount};
pub use bytecode::Bytecode;
pub use chain::{ChainReader, Clock, Deployer, Inclusion, LogQuery, TokioClock};
pub use config::{parse_address, DeploymentPlan, RunConfig, DEFAULT_PROTOCOL};
pub use confirm::{ConfirmationPolicy, ConfirmationWaiter, Confirmed};
pub use decode::{EventDecoder, MotherlodeMinted};
pub use dir::DeploymentsDir;
pub use error::{Error, Result};
pub use orchestrator::DeploymentOrchestrator;
pub use pipeline::Pipeline;
pub use receipt::{ArtifactStem, Artifacts, ReceiptWriter, WrittenArtifacts};
pub use token::{read_token_summary, IERC20};
pub use types::*;
