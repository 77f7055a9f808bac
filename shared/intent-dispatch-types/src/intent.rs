use alloy_primitives::{Address, Bytes, FixedBytes, U256};

use crate::abi::PackedUserOperation;

/// Gas-style limits carried by an intent.
///
/// The dispatcher never interprets these; they only matter because they are part of the
/// fingerprint, so changing them after signing invalidates the signature.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResourceLimits {
    pub verification_gas_limit: u128,
    pub call_gas_limit: u128,
    pub pre_verification_gas: U256,
}

impl ResourceLimits {
    /// `accountGasLimits` word: verification limit in the high 16 bytes, call limit in the low 16.
    pub fn account_gas_limits(&self) -> FixedBytes<32> {
        pack_u128_pair(self.verification_gas_limit, self.call_gas_limit)
    }

    pub fn from_packed(account_gas_limits: FixedBytes<32>, pre_verification_gas: U256) -> Self {
        let (verification_gas_limit, call_gas_limit) = unpack_u128_pair(account_gas_limits);
        Self {
            verification_gas_limit,
            call_gas_limit,
            pre_verification_gas,
        }
    }
}

/// Fee bid carried by an intent. Fingerprinted, not interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeeParameters {
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
}

impl FeeParameters {
    /// `gasFees` word: priority fee in the high 16 bytes, max fee in the low 16.
    pub fn gas_fees(&self) -> FixedBytes<32> {
        pack_u128_pair(self.max_priority_fee_per_gas, self.max_fee_per_gas)
    }

    pub fn from_packed(gas_fees: FixedBytes<32>) -> Self {
        let (max_priority_fee_per_gas, max_fee_per_gas) = unpack_u128_pair(gas_fees);
        Self {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        }
    }
}

/// A signed request to act on behalf of a delegated account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Intent {
    /// Delegated account the intent acts for.
    pub sender: Address,
    /// Per-sender replay sequence.
    pub sequence: U256,
    /// Account bootstrap data (`initCode`). Carried, never interpreted.
    pub deployment_payload: Bytes,
    /// Calldata handed to the account's guarded dispatch entry point (`callData`).
    pub action_payload: Bytes,
    pub resource_limits: ResourceLimits,
    pub fee_parameters: FeeParameters,
    /// Opaque sponsor metadata (`paymasterAndData`).
    pub authorization_data: Bytes,
    /// ECDSA signature (r||s||v) over the fingerprint.
    pub signature: Bytes,
}

impl Intent {
    pub fn new(sender: Address, sequence: U256, action_payload: impl Into<Bytes>) -> Self {
        Self {
            sender,
            sequence,
            action_payload: action_payload.into(),
            ..Default::default()
        }
    }

    /// Wire form for ABI calls.
    pub fn to_packed(&self) -> PackedUserOperation {
        PackedUserOperation {
            sender: self.sender,
            nonce: self.sequence,
            initCode: self.deployment_payload.clone(),
            callData: self.action_payload.clone(),
            accountGasLimits: self.resource_limits.account_gas_limits(),
            preVerificationGas: self.resource_limits.pre_verification_gas,
            gasFees: self.fee_parameters.gas_fees(),
            paymasterAndData: self.authorization_data.clone(),
            signature: self.signature.clone(),
        }
    }
}

impl From<&Intent> for PackedUserOperation {
    fn from(intent: &Intent) -> Self {
        intent.to_packed()
    }
}

impl From<PackedUserOperation> for Intent {
    fn from(op: PackedUserOperation) -> Self {
        Self {
            sender: op.sender,
            sequence: op.nonce,
            deployment_payload: op.initCode,
            action_payload: op.callData,
            resource_limits: ResourceLimits::from_packed(op.accountGasLimits, op.preVerificationGas),
            fee_parameters: FeeParameters::from_packed(op.gasFees),
            authorization_data: op.paymasterAndData,
            signature: op.signature,
        }
    }
}

fn pack_u128_pair(high: u128, low: u128) -> FixedBytes<32> {
    let mut buf = [0u8; 32];
    buf[0..16].copy_from_slice(&high.to_be_bytes());
    buf[16..32].copy_from_slice(&low.to_be_bytes());
    FixedBytes(buf)
}

fn unpack_u128_pair(word: FixedBytes<32>) -> (u128, u128) {
    let mut high = [0u8; 16];
    let mut low = [0u8; 16];
    high.copy_from_slice(&word[0..16]);
    low.copy_from_slice(&word[16..32]);
    (u128::from_be_bytes(high), u128::from_be_bytes(low))
}
