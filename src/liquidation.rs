//! Liquidation price and required wallet balance.
//!
//! Both directions of the same linear equation: given a wallet balance, where
//! does the position get liquidated; given a target liquidation price, how much
//! balance has to sit in the position. The maintenance bracket is chosen from
//! the absolute notional at entry, so the two functions are exact inverses.

use crate::error::{checked, LadderError, LadderResult};
use crate::margin::{MarginBracket, MarginTable};
use crate::types::PositionSnapshot;
use rust_decimal::Decimal;

/// Direction-signed notional: positive for longs, negative for shorts.
pub fn signed_notional(snapshot: &PositionSnapshot) -> LadderResult<Decimal> {
    let gross = checked(snapshot.quantity().checked_mul(snapshot.entry_price()), "signed notional")?;
    let notional = checked(gross.checked_div(snapshot.leverage()), "signed notional")?;
    Ok(snapshot.direction().sign() * notional)
}

struct LiquidationTerms {
    notional: Decimal,
    bracket: MarginBracket,
    denominator: Decimal,
}

fn liquidation_terms(snapshot: &PositionSnapshot, table: &MarginTable) -> LadderResult<LiquidationTerms> {
    let notional = signed_notional(snapshot)?;
    let bracket = table.lookup(notional.abs())?;
    let denominator = checked(
        snapshot.quantity().checked_mul(bracket.rate - snapshot.direction().sign()),
        "liquidation denominator",
    )?;
    if denominator.is_zero() {
        return Err(LadderError::invalid(
            "quantity",
            "liquidation denominator is zero",
        ));
    }
    Ok(LiquidationTerms {
        notional,
        bracket,
        denominator,
    })
}

/// Price at which `balance` (plus `pnl`) no longer covers maintenance margin.
pub fn liquidation_price(
    balance: Decimal,
    snapshot: &PositionSnapshot,
    pnl: Decimal,
    table: &MarginTable,
) -> LadderResult<Decimal> {
    let terms = liquidation_terms(snapshot, table)?;
    let maintenance = terms.bracket.maintenance_margin(terms.notional);
    let numerator = balance
        .checked_sub(maintenance)
        .and_then(|v| v.checked_add(pnl))
        .and_then(|v| v.checked_add(terms.bracket.rate - terms.notional));
    let numerator = checked(numerator, "liquidation price")?;
    checked(numerator.checked_div(terms.denominator), "liquidation price")
}

/// Balance that puts the liquidation price exactly at `liquidation_price`.
pub fn wallet_balance_required(
    liquidation_price: Decimal,
    snapshot: &PositionSnapshot,
    pnl: Decimal,
    table: &MarginTable,
) -> LadderResult<Decimal> {
    let terms = liquidation_terms(snapshot, table)?;
    let maintenance = terms.bracket.maintenance_margin(terms.notional);
    let balance = liquidation_price
        .checked_mul(terms.denominator)
        .and_then(|v| v.checked_sub(pnl))
        .and_then(|v| v.checked_sub(terms.bracket.rate - terms.notional))
        .and_then(|v| v.checked_add(maintenance));
    checked(balance, "wallet balance")
}

/// Liquidation price of an open isolated position as the exchange reports it:
/// the isolated margin net of unrealized pnl, priced on the unlevered notional.
pub fn isolated_liquidation_price(
    snapshot: &PositionSnapshot,
    isolated_margin: Decimal,
    unrealized_pnl: Decimal,
    table: &MarginTable,
) -> LadderResult<Decimal> {
    let balance = isolated_margin - unrealized_pnl.abs();
    let unlevered = snapshot.with_leverage(Decimal::ONE)?;
    liquidation_price(balance, &unlevered, -unrealized_pnl, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use rust_decimal_macros::dec;

    fn snapshot(direction: Direction) -> PositionSnapshot {
        PositionSnapshot::new(dec!(30000), dec!(1), dec!(1), direction).unwrap()
    }

    #[test]
    fn long_liquidates_below_entry() {
        let table = MarginTable::default();
        let liq = liquidation_price(dec!(3000), &snapshot(Direction::Long), Decimal::ZERO, &table).unwrap();
        assert!(liq < dec!(30000));
        assert!(liq > dec!(26000));
    }

    #[test]
    fn short_liquidates_above_entry() {
        let table = MarginTable::default();
        let liq = liquidation_price(dec!(3000), &snapshot(Direction::Short), Decimal::ZERO, &table).unwrap();
        assert!(liq > dec!(30000));
        assert!(liq < dec!(34000));
    }

    #[test]
    fn more_balance_moves_liquidation_away() {
        let table = MarginTable::default();
        let long = snapshot(Direction::Long);
        let thin = liquidation_price(dec!(1000), &long, Decimal::ZERO, &table).unwrap();
        let thick = liquidation_price(dec!(5000), &long, Decimal::ZERO, &table).unwrap();
        assert!(thick < thin);
    }

    #[test]
    fn balance_round_trip() {
        let table = MarginTable::default();
        for direction in [Direction::Long, Direction::Short] {
            let snap = snapshot(direction);
            let liq = liquidation_price(dec!(2500), &snap, dec!(40), &table).unwrap();
            let balance = wallet_balance_required(liq, &snap, dec!(40), &table).unwrap();
            assert!((balance - dec!(2500)).abs() < dec!(0.000001));
        }
    }

    #[test]
    fn zero_quantity_rejected() {
        let table = MarginTable::default();
        let flat = PositionSnapshot::new(dec!(30000), dec!(10), Decimal::ZERO, Direction::Long).unwrap();
        assert!(matches!(
            liquidation_price(dec!(100), &flat, Decimal::ZERO, &table),
            Err(LadderError::InvalidParameter { .. })
        ));
        assert!(wallet_balance_required(dec!(100), &flat, Decimal::ZERO, &table).is_err());
    }

    #[test]
    fn huge_notional_out_of_range() {
        let table = MarginTable::default();
        let whale = PositionSnapshot::new(dec!(30000), dec!(1), dec!(200), Direction::Long).unwrap();
        assert!(matches!(
            liquidation_price(dec!(100000), &whale, Decimal::ZERO, &table),
            Err(LadderError::OutOfRange { .. })
        ));
    }

    #[test]
    fn huge_inputs_overflow() {
        let table = MarginTable::default();
        let long = snapshot(Direction::Long);
        assert_eq!(
            liquidation_price(Decimal::MAX, &long, Decimal::MAX, &table),
            Err(LadderError::Overflow { operation: "liquidation price" })
        );
        assert_eq!(
            wallet_balance_required(Decimal::MAX, &snapshot(Direction::Short), Decimal::ZERO, &table),
            Err(LadderError::Overflow { operation: "wallet balance" })
        );
        let whale = PositionSnapshot::new(Decimal::MAX, dec!(1), dec!(2), Direction::Short).unwrap();
        assert_eq!(
            signed_notional(&whale),
            Err(LadderError::Overflow { operation: "signed notional" })
        );
    }

    #[test]
    fn isolated_position_reads_unlevered() {
        let table = MarginTable::default();
        let snap = PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Long).unwrap();
        let from_isolated = isolated_liquidation_price(&snap, dec!(3100), dec!(100), &table).unwrap();
        let direct = liquidation_price(dec!(3000), &snapshot(Direction::Long), dec!(-100), &table).unwrap();
        assert_eq!(from_isolated, direct);
    }
}
