//! Online payment providers.
//!
//! A provider turns an order into a checkout session: a URL the customer is
//! redirected to and the provider-side transaction reference. Settlement
//! callbacks are handled elsewhere.

use async_trait::async_trait;
use pos_core::error::DomainError;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::domain::model::{OrderSnapshot, PaymentMethod};

/// Default VNPAY sandbox checkout.
pub const DEFAULT_VNPAY_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";

/// Default MoMo test checkout.
pub const DEFAULT_MOMO_URL: &str = "https://test-payment.momo.vn/v2/gateway/pay";

/// Default ZaloPay sandbox checkout.
pub const DEFAULT_ZALOPAY_URL: &str = "https://sb-openapi.zalopay.vn/v2/pay";

/// A started online payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    /// Where to redirect the customer.
    pub payment_url: String,
    /// Provider-side transaction reference.
    pub transaction_id: String,
}

/// Starts online payments.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a checkout session for `order` with `method`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for methods the provider does not
    /// handle, and `DomainError::Infrastructure` when the provider fails.
    async fn create_payment(
        &self,
        order: &OrderSnapshot,
        method: PaymentMethod,
    ) -> Result<PaymentSession, DomainError>;
}

/// Provider that redirects to a per-method checkout page.
#[derive(Debug, Clone)]
pub struct RedirectPaymentProvider {
    vnpay: Url,
    momo: Url,
    zalopay: Url,
}

impl RedirectPaymentProvider {
    /// Creates a provider with explicit checkout bases.
    #[must_use]
    pub fn new(vnpay: Url, momo: Url, zalopay: Url) -> Self {
        Self {
            vnpay,
            momo,
            zalopay,
        }
    }

    /// Creates a provider pointed at the providers' sandboxes.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if a default base fails to parse.
    pub fn sandbox() -> Result<Self, url::ParseError> {
        Ok(Self::new(
            Url::parse(DEFAULT_VNPAY_URL)?,
            Url::parse(DEFAULT_MOMO_URL)?,
            Url::parse(DEFAULT_ZALOPAY_URL)?,
        ))
    }

    fn base_for(&self, method: PaymentMethod) -> Option<&Url> {
        match method {
            PaymentMethod::Vnpay => Some(&self.vnpay),
            PaymentMethod::Momo => Some(&self.momo),
            PaymentMethod::Zalopay => Some(&self.zalopay),
            PaymentMethod::Cash | PaymentMethod::Card => None,
        }
    }
}

#[async_trait]
impl PaymentProvider for RedirectPaymentProvider {
    async fn create_payment(
        &self,
        order: &OrderSnapshot,
        method: PaymentMethod,
    ) -> Result<PaymentSession, DomainError> {
        let Some(base) = self.base_for(method) else {
            return Err(DomainError::Validation(format!(
                "{} is not an online payment method",
                method.as_str()
            )));
        };

        let transaction_id = format!("{}-{}", method.as_str(), Uuid::new_v4().simple());
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("orderId", order.id.as_str())
            .append_pair("amount", &order.total.to_string())
            .append_pair("transactionId", &transaction_id);

        Ok(PaymentSession {
            payment_url: url.into(),
            transaction_id,
        })
    }
}
