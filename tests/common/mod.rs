// tests/common/mod.rs
// Shared stubs: a canned-reply JSON-RPC node and a canned-output compiler.
#![allow(dead_code)]

use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcClient, JsonRpcError, MockError, Provider},
    solc::artifacts::{CompilerInput, CompilerOutput},
    types::{Address, TransactionReceipt, TxHash, U64},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use social_deployer::{DeployError, SolidityCompiler};
use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    sync::{Arc, Mutex},
};

pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const DEV_CHAIN_ID: u64 = 31337;

pub const SOCIAL_SOURCE: &str = include_str!("../fixtures/Social.sol");

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
enum Reply {
    Value(Value),
    Error { code: i64, message: String },
}

#[derive(Debug, Default)]
struct StubState {
    replies: HashMap<String, VecDeque<Reply>>,
    calls: Vec<(String, Value)>,
}

/// JSON-RPC node keyed by method name. Queued replies are served in order;
/// the last one for a method keeps being served for any further calls.
#[derive(Debug, Clone, Default)]
pub struct StubNode {
    state: Arc<Mutex<StubState>>,
}

impl StubNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(&self) -> Arc<Provider<StubNode>> {
        Arc::new(Provider::new(self.clone()))
    }

    pub fn reply<T: Serialize>(&self, method: &str, value: T) -> &Self {
        let value = serde_json::to_value(value).expect("stub reply must serialize");
        self.push(method, Reply::Value(value))
    }

    pub fn reply_error(&self, method: &str, code: i64, message: &str) -> &Self {
        self.push(method, Reply::Error { code, message: message.to_string() })
    }

    fn push(&self, method: &str, reply: Reply) -> &Self {
        self.state.lock().unwrap().replies.entry(method.to_string()).or_default().push_back(reply);
        self
    }

    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls(method).len()
    }

    /// A dev node with one chain id and a client version, nothing else.
    pub fn dev_node() -> Self {
        let node = Self::new();
        node.reply("web3_clientVersion", "anvil/v0.2.0");
        node.reply("eth_chainId", U64::from(DEV_CHAIN_ID));
        node
    }
}

#[async_trait]
impl JsonRpcClient for StubNode {
    type Error = MockError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, MockError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params)?;
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((method.to_string(), params));
            let queue = state.replies.get_mut(method).ok_or(MockError::EmptyResponses)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };
        match reply.ok_or(MockError::EmptyResponses)? {
            Reply::Value(value) => Ok(serde_json::from_value(value)?),
            Reply::Error { code, message } => Err(MockError::JsonRpcError(JsonRpcError { code, message, data: None })),
        }
    }
}

pub fn mined_receipt(tx_hash: TxHash, contract_address: Address) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: tx_hash,
        contract_address: Some(contract_address),
        status: Some(U64::from(1u64)),
        block_number: Some(U64::from(1u64)),
        ..Default::default()
    }
}

pub fn social_abi() -> Value {
    json!([
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "address", "name": "author", "type": "address"},
                {"indexed": false, "internalType": "uint256", "name": "id", "type": "uint256"}
            ],
            "name": "Posted",
            "type": "event"
        },
        {
            "inputs": [{"internalType": "string", "name": "content", "type": "string"}],
            "name": "post",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "postCount",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ])
}

pub const SOCIAL_BYTECODE: &str = "6080604052348015600f57600080fd5b50603f80601d6000396000f3fe6080604052600080fdfea164736f6c6343000814000a";

/// Compiler stand-in returning a fixed standard-JSON output and recording its input.
#[derive(Debug)]
pub struct StubCompiler {
    output: Value,
    pub seen: Mutex<Option<CompilerInput>>,
}

impl StubCompiler {
    pub fn with_output(output: Value) -> Self {
        Self { output, seen: Mutex::new(None) }
    }

    /// Emits `Social` in `Social.sol`, plus a warning.
    pub fn social() -> Self {
        Self::with_output(json!({
            "errors": [{
                "component": "general",
                "formattedMessage": "Warning: SPDX license identifier not provided in source file.",
                "message": "SPDX license identifier not provided in source file.",
                "severity": "warning",
                "type": "Warning"
            }],
            "contracts": {
                "Social.sol": {
                    "Social": {
                        "abi": social_abi(),
                        "evm": {"bytecode": {"object": SOCIAL_BYTECODE}}
                    }
                }
            }
        }))
    }
}

impl SolidityCompiler for StubCompiler {
    fn compile(&self, input: &CompilerInput) -> Result<CompilerOutput, DeployError> {
        *self.seen.lock().unwrap() = Some(input.clone());
        serde_json::from_value(self.output.clone()).map_err(|e| DeployError::Compilation(e.to_string()))
    }
}
