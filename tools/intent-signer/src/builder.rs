use alloy_primitives::{Address, Bytes, U256};
use intent_dispatch_types::{
    DigestScheme, FeeParameters, FingerprintDomain, Intent, ResourceLimits,
};
use k256::ecdsa::SigningKey;

use crate::sign::sign_intent;

/// Builder for an [`Intent`], finished either unsigned or signed by a controller key.
#[derive(Clone, Debug, Default)]
pub struct IntentBuilder {
    intent: Intent,
    domain: Option<FingerprintDomain>,
    scheme: DigestScheme,
}

impl IntentBuilder {
    pub fn new(sender: Address, sequence: U256) -> Self {
        Self {
            intent: Intent {
                sender,
                sequence,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn action(mut self, payload: impl Into<Bytes>) -> Self {
        self.intent.action_payload = payload.into();
        self
    }

    pub fn deployment(mut self, payload: impl Into<Bytes>) -> Self {
        self.intent.deployment_payload = payload.into();
        self
    }

    pub fn authorization(mut self, data: impl Into<Bytes>) -> Self {
        self.intent.authorization_data = data.into();
        self
    }

    pub fn resource_limits(mut self, limits: ResourceLimits) -> Self {
        self.intent.resource_limits = limits;
        self
    }

    pub fn fee_parameters(mut self, fees: FeeParameters) -> Self {
        self.intent.fee_parameters = fees;
        self
    }

    /// Bind the fingerprint to a dispatcher and chain.
    pub fn domain(mut self, domain: Option<FingerprintDomain>) -> Self {
        self.domain = domain;
        self
    }

    pub fn scheme(mut self, scheme: DigestScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn build(self) -> Intent {
        self.intent
    }

    pub fn sign(self, key: &SigningKey) -> Result<Intent, k256::ecdsa::Error> {
        let mut intent = self.intent;
        sign_intent(&mut intent, key, self.domain.as_ref(), self.scheme)?;
        Ok(intent)
    }
}
