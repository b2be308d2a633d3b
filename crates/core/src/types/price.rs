//! Non-negative product price.
//!
//! WooCommerce exchanges prices as decimal strings (`"regular_price": "9.99"`),
//! while API callers send either JSON numbers or numeric strings. `Price`
//! holds the decimal value and renders the remote string form.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a value could not be turned into a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    #[error("price must be a number")]
    NotNumeric,
    #[error("price must be at least 0")]
    Negative,
}

/// A price in the store's currency. Always `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a numeric string such as `"9.99"`, `"10"` or `"1e2"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotNumeric`] if the text is not a number and
    /// [`PriceError::Negative`] if it is below zero.
    pub fn parse(text: &str) -> Result<Self, PriceError> {
        let text = text.trim();
        let amount = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| PriceError::NotNumeric)?;
        Self::new(amount)
    }

    /// Accept a JSON number or a numeric string.
    ///
    /// # Errors
    ///
    /// Booleans, arrays, objects and null are [`PriceError::NotNumeric`].
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::Number(n) => Self::parse(&n.to_string()),
            Value::String(s) => Self::parse(s),
            _ => Err(PriceError::NotNumeric),
        }
    }

    /// Parse the price of a remote product, treating blanks and garbage as zero.
    ///
    /// WooCommerce reports `""` for products without a price.
    #[must_use]
    pub fn from_remote_lossy(text: &str) -> Self {
        Self::parse(text).unwrap_or(Self::ZERO)
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The string WooCommerce expects in `regular_price`.
    ///
    /// Trailing zeros are dropped, so `10.0` becomes `"10"` and `9.90` becomes `"9.9"`.
    #[must_use]
    pub fn to_remote_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
