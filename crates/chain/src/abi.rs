use alloy_primitives::B256;
use alloy_sol_types::{sol, SolCall};

use common::{
    DigestKind, Error, EscrowCall, Result, SignedAction, Trade, TradeAction, TradeId,
};

// Must stay bit-compatible with the deployed escrow contract.
sol! {
    interface IEscrow {
        // Reads
        function trades(bytes32) external view returns (
            address seller,
            address buyer,
            uint256 amount,
            uint64 lockDeadline,
            uint64 fiatDeadline,
            uint8 state
        );
        function releaseDigest(bytes32 tradeId, uint64 expiresAt, bytes32 nonce) external view returns (bytes32);
        function refundDigest(bytes32 tradeId, uint64 expiresAt, bytes32 nonce) external view returns (bytes32);

        // Writes (createTrade, release and the dispute resolutions are backend-signer only)
        function createTrade(
            bytes32 tradeId,
            address seller,
            address buyer,
            uint256 amount,
            uint64 lockDeadline,
            uint64 fiatDeadline
        ) external;
        function deposit(bytes32 tradeId) external;
        function refund(bytes32 tradeId) external;
        function openDispute(bytes32 tradeId) external;
        function release(bytes32 tradeId, uint64 expiresAt, bytes32 nonce, bytes backendSig) external;
        function resolveDisputeRelease(bytes32 tradeId, uint64 expiresAt, bytes32 nonce, bytes backendSig) external;
        function resolveDisputeRefund(bytes32 tradeId, uint64 expiresAt, bytes32 nonce, bytes backendSig) external;
    }
}

fn abi_error(e: alloy_sol_types::Error) -> Error {
    Error::Abi(e.to_string())
}

pub fn encode_trade_query(trade_id: TradeId) -> Vec<u8> {
    IEscrow::tradesCall { _0: trade_id }.abi_encode()
}

pub fn decode_trade(data: &[u8]) -> Result<Trade> {
    let ret = IEscrow::tradesCall::abi_decode_returns(data, true).map_err(abi_error)?;
    Ok(Trade {
        seller: ret.seller,
        buyer: ret.buyer,
        amount: ret.amount,
        lock_deadline: ret.lockDeadline,
        fiat_deadline: ret.fiatDeadline,
        state: ret.state,
    })
}

pub fn encode_digest_query(
    kind: DigestKind,
    trade_id: TradeId,
    expires_at: u64,
    nonce: B256,
) -> Vec<u8> {
    match kind {
        DigestKind::Release => IEscrow::releaseDigestCall {
            tradeId: trade_id,
            expiresAt: expires_at,
            nonce,
        }
        .abi_encode(),
        DigestKind::Refund => IEscrow::refundDigestCall {
            tradeId: trade_id,
            expiresAt: expires_at,
            nonce,
        }
        .abi_encode(),
    }
}

pub fn decode_digest(kind: DigestKind, data: &[u8]) -> Result<B256> {
    let digest = match kind {
        DigestKind::Release => {
            IEscrow::releaseDigestCall::abi_decode_returns(data, true).map_err(abi_error)?._0
        }
        DigestKind::Refund => {
            IEscrow::refundDigestCall::abi_decode_returns(data, true).map_err(abi_error)?._0
        }
    };
    Ok(digest)
}

/// Calldata for a state-changing call.
pub fn encode_call(call: &EscrowCall) -> Vec<u8> {
    match call {
        EscrowCall::CreateTrade(req) => IEscrow::createTradeCall {
            tradeId: req.trade_id,
            seller: req.seller,
            buyer: req.buyer,
            amount: req.amount,
            lockDeadline: req.lock_deadline,
            fiatDeadline: req.fiat_deadline,
        }
        .abi_encode(),

        EscrowCall::Action(action, trade_id) => {
            let trade_id = *trade_id;
            match action {
                TradeAction::Deposit => IEscrow::depositCall { tradeId: trade_id }.abi_encode(),
                TradeAction::Refund => IEscrow::refundCall { tradeId: trade_id }.abi_encode(),
                TradeAction::OpenDispute => {
                    IEscrow::openDisputeCall { tradeId: trade_id }.abi_encode()
                }
            }
        }

        EscrowCall::Signed(action, auth) => {
            let (trade_id, expires_at, nonce, sig) = (
                auth.trade_id,
                auth.expires_at,
                auth.nonce,
                auth.backend_sig.clone(),
            );
            match action {
                SignedAction::Release => IEscrow::releaseCall {
                    tradeId: trade_id,
                    expiresAt: expires_at,
                    nonce,
                    backendSig: sig,
                }
                .abi_encode(),
                SignedAction::ResolveDisputeRelease => IEscrow::resolveDisputeReleaseCall {
                    tradeId: trade_id,
                    expiresAt: expires_at,
                    nonce,
                    backendSig: sig,
                }
                .abi_encode(),
                SignedAction::ResolveDisputeRefund => IEscrow::resolveDisputeRefundCall {
                    tradeId: trade_id,
                    expiresAt: expires_at,
                    nonce,
                    backendSig: sig,
                }
                .abi_encode(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{keccak256, Address, Bytes, U256};
    use common::{CreateTradeRequest, SignedAuthorization};

    use super::*;

    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    fn word(tail: &[u8]) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[32 - tail.len()..].copy_from_slice(tail);
        w
    }

    #[test]
    fn selectors_match_contract_signatures() {
        assert_eq!(IEscrow::tradesCall::SELECTOR, selector("trades(bytes32)"));
        assert_eq!(
            IEscrow::createTradeCall::SELECTOR,
            selector("createTrade(bytes32,address,address,uint256,uint64,uint64)")
        );
        assert_eq!(
            IEscrow::resolveDisputeReleaseCall::SELECTOR,
            selector("resolveDisputeRelease(bytes32,uint64,bytes32,bytes)")
        );
        assert_eq!(
            IEscrow::refundDigestCall::SELECTOR,
            selector("refundDigest(bytes32,uint64,bytes32)")
        );
    }

    #[test]
    fn deposit_calldata_is_selector_then_trade_id() {
        let id = B256::repeat_byte(0xab);
        let data = encode_call(&EscrowCall::Action(TradeAction::Deposit, id));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &selector("deposit(bytes32)"));
        assert_eq!(&data[4..], id.as_slice());
    }

    #[test]
    fn create_trade_encodes_six_static_words() {
        let req = CreateTradeRequest {
            trade_id: B256::repeat_byte(1),
            seller: Address::repeat_byte(2),
            buyer: Address::repeat_byte(3),
            amount: U256::from(10_000_000u64),
            lock_deadline: 1600,
            fiat_deadline: 87_400,
        };
        let data = encode_call(&EscrowCall::CreateTrade(req));
        assert_eq!(data.len(), 4 + 6 * 32);
        assert_eq!(&data[4 + 3 * 32..4 + 4 * 32], &word(&10_000_000u64.to_be_bytes()));
        assert_eq!(&data[4 + 4 * 32..4 + 5 * 32], &word(&1600u64.to_be_bytes()));
    }

    #[test]
    fn signed_call_appends_dynamic_signature() {
        let auth = SignedAuthorization {
            trade_id: B256::repeat_byte(1),
            expires_at: 1_771_763_088,
            nonce: B256::repeat_byte(9),
            backend_sig: Bytes::from(vec![0x11; 65]),
        };
        let data = encode_call(&EscrowCall::Signed(SignedAction::ResolveDisputeRelease, auth));
        // head (4 words) + length word + 65 bytes padded to 96
        assert_eq!(data.len(), 4 + 4 * 32 + 32 + 96);
        assert_eq!(&data[4 + 3 * 32..4 + 4 * 32], &word(&[0x80]));
        assert_eq!(&data[4 + 4 * 32..4 + 5 * 32], &word(&[65]));
    }

    #[test]
    fn trade_record_decodes_all_six_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&word(&[0x22; 20]));
        data.extend_from_slice(&word(&[0x33; 20]));
        data.extend_from_slice(&word(&10_000_000u64.to_be_bytes()));
        data.extend_from_slice(&word(&1600u64.to_be_bytes()));
        data.extend_from_slice(&word(&87_400u64.to_be_bytes()));
        data.extend_from_slice(&word(&[5]));

        let trade = decode_trade(&data).unwrap();
        assert_eq!(trade.seller, Address::repeat_byte(0x22));
        assert_eq!(trade.buyer, Address::repeat_byte(0x33));
        assert_eq!(trade.amount, U256::from(10_000_000u64));
        assert_eq!(trade.lock_deadline, 1600);
        assert_eq!(trade.fiat_deadline, 87_400);
        assert_eq!(trade.state, 5);
    }

    #[test]
    fn short_return_data_is_an_abi_error() {
        let err = decode_trade(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, Error::Abi(_)));
    }

    #[test]
    fn digest_round_trips_through_return_word() {
        let digest = B256::repeat_byte(0x5a);
        assert_eq!(decode_digest(DigestKind::Refund, digest.as_slice()).unwrap(), digest);
    }
}
