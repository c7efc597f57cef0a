//! Fixed-width field widths and helpers
//!
//! Every numeric-looking field on the wire is a zero-padded decimal ASCII
//! string, not a binary integer. Comparisons and sums parse base-10 and
//! re-pad to the declared width when serialized back.

use crate::error::{AxeError, AxeResult};

/// Width of the leading type tag
pub const MSG_TYPE_WIDTH: usize = 1;
/// Width of the server-assigned order number
pub const ORDER_NO_WIDTH: usize = 5;
/// Width of the ticker symbol
pub const TICKER_WIDTH: usize = 6;
/// Width of the price field
pub const PRICE_WIDTH: usize = 5;
/// Width of the quantity field
pub const QTY_WIDTH: usize = 5;
/// Width of the ack response code
pub const RESPONSE_CODE_WIDTH: usize = 1;

/// Order number placeholder before the server assigns one
pub const ORDER_NO_UNASSIGNED: &str = "00000";
/// A fully consumed quantity, as it appears on the wire
pub const QTY_ZERO: &str = "00000";

/// Check that a field is exactly `width` ASCII decimal digits
pub fn validate(field: &'static str, value: &str, width: usize) -> AxeResult<()> {
    if value.len() != width {
        return Err(AxeError::encoding(
            field,
            format!("expected {} bytes, got {} ({:?})", width, value.len(), value),
        ));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AxeError::encoding(
            field,
            format!("expected decimal digits, got {:?}", value),
        ));
    }
    Ok(())
}

/// Parse a zero-padded decimal field as an integer
pub fn parse_numeric(field: &'static str, value: &str) -> AxeResult<u32> {
    value
        .parse::<u32>()
        .map_err(|e| AxeError::encoding(field, format!("{:?}: {}", value, e)))
}

/// Re-pad a quantity to its wire width
pub fn pad_qty(qty: u32) -> String {
    format!("{:0width$}", qty, width = QTY_WIDTH)
}

/// Re-pad a price to its wire width
pub fn pad_price(price: u32) -> String {
    format!("{:0width$}", price, width = PRICE_WIDTH)
}

/// True if the order number is still the client-side placeholder
pub fn is_unassigned(order_no: &str) -> bool {
    order_no.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_exact_width_digits() {
        assert!(validate("ticker", "000660", TICKER_WIDTH).is_ok());
        assert!(validate("qty", "00020", QTY_WIDTH).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_width() {
        let err = validate("qty", "020", QTY_WIDTH).unwrap_err();
        assert!(matches!(err, AxeError::Encoding { field: "qty", .. }));
    }

    #[test]
    fn test_validate_rejects_non_digits() {
        assert!(validate("ticker", "00066x", TICKER_WIDTH).is_err());
        assert!(validate("price", "6000 ", PRICE_WIDTH).is_err());
    }

    #[test]
    fn test_parse_and_repad() {
        assert_eq!(parse_numeric("qty", "00020").unwrap(), 20);
        assert_eq!(pad_qty(20), "00020");
        assert_eq!(pad_price(60000), "60000");
        assert_eq!(pad_qty(0), QTY_ZERO);
    }

    #[test]
    fn test_unassigned_order_no() {
        assert!(is_unassigned(ORDER_NO_UNASSIGNED));
        assert!(!is_unassigned("00001"));
    }
}
