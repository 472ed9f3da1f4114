pub mod abi;
pub mod contract;
pub mod rpc;

pub use contract::EscrowContract;
pub use rpc::RpcClient;
