use mongodb::bson::DateTime;

use crate::models::pricing::{ChargeBreakdown, FlashSale, RateQuote};
use crate::models::voucher::UserVoucher;

/// Hotel bookings carry 10% tax; attraction tickets are tax exempt.
pub const HOTEL_TAX_BASIS_POINTS: i64 = 1_000;
pub const ATTRACTION_TAX_BASIS_POINTS: i64 = 0;

const PERCENT_SCALE: i64 = 100;
const BASIS_POINT_SCALE: i64 = 10_000;

#[derive(Debug, PartialEq, Eq)]
pub enum PricingError {
    InvalidQuantity(i64),
    InvalidDiscount(i64),
    VoucherAlreadyUsed,
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::InvalidQuantity(qty) => {
                write!(f, "Quantity must be at least 1, got {}", qty)
            }
            PricingError::InvalidDiscount(pct) => {
                write!(f, "Discount percent must be between 0 and 100, got {}", pct)
            }
            PricingError::VoucherAlreadyUsed => write!(f, "Voucher has already been used"),
        }
    }
}

impl std::error::Error for PricingError {}

pub struct PricingService;

impl PricingService {
    /// Assemble the quote for a product as priced right now. The flash-sale
    /// percent only makes it onto the quote while its window is open.
    pub fn rate_quote(
        base_unit_price: i64,
        flash_sale: Option<&FlashSale>,
        quantity: i64,
        tax_basis_points: i64,
    ) -> RateQuote {
        let discount_percent = flash_sale
            .filter(|sale| sale.is_active_at(DateTime::now()))
            .map(|sale| sale.discount_percent);

        RateQuote {
            base_unit_price,
            discount_percent,
            quantity,
            tax_basis_points,
        }
    }

    /// Price of one unit (room-night or ticket) after any flash-sale
    /// percent, rounded half-up to the rupiah. The percent discounts the
    /// unit rate, not the subtotal.
    pub fn effective_unit_price(
        base_unit_price: i64,
        discount_percent: Option<i64>,
    ) -> Result<i64, PricingError> {
        debug_assert!(base_unit_price >= 0);

        let pct = discount_percent.unwrap_or(0);
        if !(0..=PERCENT_SCALE).contains(&pct) {
            return Err(PricingError::InvalidDiscount(pct));
        }

        Ok(div_half_up(
            base_unit_price * (PERCENT_SCALE - pct),
            PERCENT_SCALE,
        ))
    }

    /// Turn a rate quote and an optional voucher into the final charge.
    /// Pure computation: marking the voucher used happens at the booking
    /// submission boundary, after the charge is accepted.
    pub fn charge_breakdown(
        quote: &RateQuote,
        voucher: Option<&UserVoucher>,
    ) -> Result<ChargeBreakdown, PricingError> {
        if quote.quantity < 1 {
            return Err(PricingError::InvalidQuantity(quote.quantity));
        }
        if let Some(voucher) = voucher {
            debug_assert!(voucher.discount_amount >= 0);
            if voucher.is_used {
                return Err(PricingError::VoucherAlreadyUsed);
            }
        }

        let unit_price = Self::effective_unit_price(quote.base_unit_price, quote.discount_percent)?;
        let subtotal = unit_price * quote.quantity;
        let tax = div_half_up(subtotal * quote.tax_basis_points, BASIS_POINT_SCALE);
        let discount = voucher.map(|v| v.discount_amount).unwrap_or(0);

        // An oversized voucher clamps to a free booking, never a refund.
        let total = (subtotal + tax - discount).max(0);

        Ok(ChargeBreakdown {
            subtotal,
            tax,
            discount,
            total,
        })
    }
}

// Round-half-up division; operands are non-negative on every money path.
fn div_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn quote(base: i64, pct: Option<i64>, qty: i64, tax_bps: i64) -> RateQuote {
        RateQuote {
            base_unit_price: base,
            discount_percent: pct,
            quantity: qty,
            tax_basis_points: tax_bps,
        }
    }

    fn voucher(discount_amount: i64, is_used: bool) -> UserVoucher {
        UserVoucher {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            catalog_id: ObjectId::new(),
            code: "WSTEST".to_string(),
            discount_amount,
            points_cost: 100,
            is_used,
            claimed_at: None,
            used_at: None,
        }
    }

    #[test]
    fn test_hotel_charge_without_discount() {
        let breakdown = PricingService::charge_breakdown(
            &quote(1_000_000, None, 2, HOTEL_TAX_BASIS_POINTS),
            None,
        )
        .unwrap();

        assert_eq!(breakdown.subtotal, 2_000_000);
        assert_eq!(breakdown.tax, 200_000);
        assert_eq!(breakdown.discount, 0);
        assert_eq!(breakdown.total, 2_200_000);
    }

    #[test]
    fn test_flash_sale_discounts_the_unit_rate() {
        let breakdown = PricingService::charge_breakdown(
            &quote(1_000_000, Some(50), 2, HOTEL_TAX_BASIS_POINTS),
            None,
        )
        .unwrap();

        assert_eq!(breakdown.subtotal, 1_000_000);
        assert_eq!(breakdown.tax, 100_000);
        assert_eq!(breakdown.total, 1_100_000);
    }

    #[test]
    fn test_voucher_reduces_the_total() {
        let breakdown = PricingService::charge_breakdown(
            &quote(1_000_000, None, 2, HOTEL_TAX_BASIS_POINTS),
            Some(&voucher(300_000, false)),
        )
        .unwrap();

        assert_eq!(breakdown.discount, 300_000);
        assert_eq!(breakdown.total, 1_900_000);
    }

    #[test]
    fn test_oversized_voucher_clamps_to_zero() {
        let breakdown = PricingService::charge_breakdown(
            &quote(1_000_000, None, 2, HOTEL_TAX_BASIS_POINTS),
            Some(&voucher(5_000_000, false)),
        )
        .unwrap();

        assert_eq!(breakdown.total, 0);
    }

    #[test]
    fn test_attraction_tickets_are_tax_exempt() {
        let breakdown = PricingService::charge_breakdown(
            &quote(150_000, None, 4, ATTRACTION_TAX_BASIS_POINTS),
            None,
        )
        .unwrap();

        assert_eq!(breakdown.subtotal, 600_000);
        assert_eq!(breakdown.tax, 0);
        assert_eq!(breakdown.total, 600_000);
    }

    #[test]
    fn test_unit_price_rounds_half_up() {
        // 99_999 * 0.75 = 74_999.25 -> 74_999
        assert_eq!(
            PricingService::effective_unit_price(99_999, Some(25)).unwrap(),
            74_999
        );
        // 5 * 0.5 = 2.5 -> 3
        assert_eq!(PricingService::effective_unit_price(5, Some(50)).unwrap(), 3);
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let err = PricingService::charge_breakdown(
            &quote(1_000_000, None, 0, HOTEL_TAX_BASIS_POINTS),
            None,
        )
        .unwrap_err();
        assert_eq!(err, PricingError::InvalidQuantity(0));
    }

    #[test]
    fn test_rejects_out_of_range_discount() {
        for pct in [-1, 101] {
            let err = PricingService::charge_breakdown(
                &quote(1_000_000, Some(pct), 1, HOTEL_TAX_BASIS_POINTS),
                None,
            )
            .unwrap_err();
            assert_eq!(err, PricingError::InvalidDiscount(pct));
        }
    }

    #[test]
    fn test_rejects_used_voucher() {
        let err = PricingService::charge_breakdown(
            &quote(1_000_000, None, 1, HOTEL_TAX_BASIS_POINTS),
            Some(&voucher(100_000, true)),
        )
        .unwrap_err();
        assert_eq!(err, PricingError::VoucherAlreadyUsed);
    }

    #[test]
    fn test_total_never_negative() {
        for discount in [0, 1, 500_000, 2_200_000, 10_000_000] {
            let breakdown = PricingService::charge_breakdown(
                &quote(1_000_000, Some(10), 2, HOTEL_TAX_BASIS_POINTS),
                Some(&voucher(discount, false)),
            )
            .unwrap();
            assert!(breakdown.total >= 0);
        }
    }

    #[test]
    fn test_flash_sale_percent_only_applies_inside_the_window() {
        let now = DateTime::now().timestamp_millis();
        let open = FlashSale {
            discount_percent: 30,
            starts_at: DateTime::from_millis(now - 60_000),
            ends_at: DateTime::from_millis(now + 60_000),
        };
        let expired = FlashSale {
            discount_percent: 30,
            starts_at: DateTime::from_millis(now - 120_000),
            ends_at: DateTime::from_millis(now - 60_000),
        };

        let quoted = PricingService::rate_quote(500_000, Some(&open), 1, HOTEL_TAX_BASIS_POINTS);
        assert_eq!(quoted.discount_percent, Some(30));

        let quoted = PricingService::rate_quote(500_000, Some(&expired), 1, HOTEL_TAX_BASIS_POINTS);
        assert_eq!(quoted.discount_percent, None);

        let quoted = PricingService::rate_quote(500_000, None, 1, HOTEL_TAX_BASIS_POINTS);
        assert_eq!(quoted.discount_percent, None);
    }

    #[test]
    fn test_deeper_discount_never_raises_the_total() {
        let mut last_total = i64::MAX;
        for pct in 0..=100 {
            let breakdown = PricingService::charge_breakdown(
                &quote(1_234_567, Some(pct), 3, HOTEL_TAX_BASIS_POINTS),
                None,
            )
            .unwrap();
            assert!(breakdown.total <= last_total);
            last_total = breakdown.total;
        }
    }
}
