//! Order status and payment option enums.
//!
//! Both are mutated after checkout by payment handling that lives outside
//! this workspace; here they are only stored and displayed.

use serde::{Deserialize, Serialize};

/// Error returned when a raw value does not name an [`OrderStatus`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order status: {0}")]
pub struct OrderStatusError(pub String);

/// Error returned when a string does not name a [`PaymentOption`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid payment option: {0}")]
pub struct PaymentOptionError(pub String);

/// Lifecycle status of an order.
///
/// Persisted as its integer discriminant (see [`OrderStatus::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum OrderStatus {
    /// Created at checkout, waiting for the customer to pay.
    #[default]
    AwaitingPayment = 0,
    /// Paid and done.
    Completed = 1,
    /// Abandoned or refused.
    Cancelled = 2,
}

impl OrderStatus {
    /// All statuses in discriminant order.
    pub const ALL: [Self; 3] = [Self::AwaitingPayment, Self::Completed, Self::Cancelled];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AwaitingPayment => "Awaiting payment",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Stable machine name (matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// The persisted discriminant.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i32> for OrderStatus {
    type Error = OrderStatusError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::AwaitingPayment),
            1 => Ok(Self::Completed),
            2 => Ok(Self::Cancelled),
            other => Err(OrderStatusError(other.to_string())),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderStatusError(s.to_owned()))
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    /// Bank deposit, reconciled by hand.
    #[default]
    Deposit,
    /// First hosted payment gateway.
    GatewayA,
    /// Second hosted payment gateway.
    GatewayB,
}

impl PaymentOption {
    /// All payment options.
    pub const ALL: [Self; 3] = [Self::Deposit, Self::GatewayA, Self::GatewayB];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::GatewayA => "Gateway A",
            Self::GatewayB => "Gateway B",
        }
    }

    /// Stable machine name (matches the database enum value).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::GatewayA => "gateway_a",
            Self::GatewayB => "gateway_b",
        }
    }
}

impl std::fmt::Display for PaymentOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PaymentOption {
    type Err = PaymentOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| PaymentOptionError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_awaiting_payment() {
        assert_eq!(OrderStatus::default(), OrderStatus::AwaitingPayment);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(OrderStatus::AwaitingPayment.code(), 0);
        assert_eq!(OrderStatus::Completed.code(), 1);
        assert_eq!(OrderStatus::Cancelled.code(), 2);
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::try_from(status.code()).unwrap(), status);
        }
        assert!(OrderStatus::try_from(3).is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "completed".parse::<OrderStatus>().unwrap(),
            OrderStatus::Completed
        );
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_option_defaults_to_deposit() {
        assert_eq!(PaymentOption::default(), PaymentOption::Deposit);
    }

    #[test]
    fn test_payment_option_serde_matches_as_str() {
        for option in PaymentOption::ALL {
            let json = serde_json::to_string(&option).unwrap();
            assert_eq!(json, format!("\"{}\"", option.as_str()));
            assert_eq!(option.as_str().parse::<PaymentOption>().unwrap(), option);
        }
    }

    #[test]
    fn test_display_uses_labels() {
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
        assert_eq!(PaymentOption::GatewayB.to_string(), "Gateway B");
    }
}
