//! Property-based tests for the ladder math.
//!
//! These tests verify invariants hold under random inputs.

use perps_ladder::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (100_000i64..10_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $1,000 to $100,000
}

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=200i64).prop_map(|x| Decimal::new(x, 2)) // 0.01 to 2.0
}

fn leverage_strategy() -> impl Strategy<Value = Decimal> {
    (1u32..=50u32).prop_map(Decimal::from) // 1x to 50x
}

fn percent_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=5_000i64).prop_map(|x| Decimal::new(x, 4)) // 0.01% to 50%
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

fn notional_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..500_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0 to just under $5M
}

proptest! {
    /// Bear price below entry, bull price above, same distance either side
    #[test]
    fn valuation_brackets_entry(
        percent in percent_strategy(),
        entry in price_strategy(),
        leverage in leverage_strategy(),
        quantity in quantity_strategy(),
    ) {
        let v = valuate(percent, entry, leverage, quantity).unwrap();
        prop_assert!(v.bear_price > Decimal::ZERO);
        prop_assert!(v.bear_price < entry);
        prop_assert!(v.bull_price > entry);

        let up = v.bull_price - entry;
        let down = entry - v.bear_price;
        prop_assert!((up - down).abs() < dec!(0.000001));
        prop_assert_eq!(v.target_pnl, v.notional * percent);
    }

    /// Every notional under the top ceiling lands in exactly the bracket that contains it
    #[test]
    fn bracket_lookup_covers_range(notional in notional_strategy()) {
        let table = MarginTable::default();
        let bracket = table.lookup(notional).unwrap();
        prop_assert!(bracket.contains(notional));
        prop_assert!(bracket.floor <= notional && notional < bracket.ceiling);
        prop_assert_eq!(table.brackets.iter().filter(|b| b.contains(notional)).count(), 1);
    }

    /// Maintenance rate never drops as notional grows
    #[test]
    fn bracket_rate_monotone(a in notional_strategy(), b in notional_strategy()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_rate = lookup_bracket(low).unwrap().rate;
        let high_rate = lookup_bracket(high).unwrap().rate;
        prop_assert!(low_rate <= high_rate);
    }

    /// Notional at or past the last ceiling is out of range
    #[test]
    fn bracket_lookup_rejects_huge(extra in 0i64..1_000_000_000i64) {
        let notional = dec!(5_000_000) + Decimal::from(extra);
        prop_assert_eq!(
            lookup_bracket(notional),
            Err(LadderError::OutOfRange { notional })
        );
    }

    /// Required balance at the computed liquidation price gives back the balance
    #[test]
    fn liquidation_round_trip(
        entry in price_strategy(),
        quantity in quantity_strategy(),
        leverage in leverage_strategy(),
        direction in direction_strategy(),
        balance in (0i64..2_000_000i64).prop_map(|x| Decimal::new(x, 2)),
        pnl in (-100_000i64..100_000i64).prop_map(|x| Decimal::new(x, 2)),
    ) {
        let table = MarginTable::default();
        let snapshot = PositionSnapshot::new(entry, leverage, quantity, direction).unwrap();

        let liq = liquidation_price(balance, &snapshot, pnl, &table).unwrap();
        let back = wallet_balance_required(liq, &snapshot, pnl, &table).unwrap();
        prop_assert!((back - balance).abs() < dec!(0.0001), "balance {} came back as {}", balance, back);
    }

    /// More balance pushes a long's liquidation down and a short's up
    #[test]
    fn liquidation_moves_away_with_balance(
        entry in price_strategy(),
        quantity in quantity_strategy(),
        direction in direction_strategy(),
        balance in (0i64..1_000_000i64).prop_map(|x| Decimal::new(x, 2)),
    ) {
        let table = MarginTable::default();
        let snapshot = PositionSnapshot::new(entry, Decimal::ONE, quantity, direction).unwrap();

        let near = liquidation_price(balance, &snapshot, Decimal::ZERO, &table).unwrap();
        let far = liquidation_price(balance + dec!(100), &snapshot, Decimal::ZERO, &table).unwrap();
        match direction {
            Direction::Long => prop_assert!(far < near),
            Direction::Short => prop_assert!(far > near),
        }
    }

    /// A sequence stops on the first step that reaches the cap, and never emits a non-positive price
    #[test]
    fn sequence_stops_at_cap(
        anchor in (1i64..=1_000_000i64).prop_map(|x| Decimal::new(x, 2)),
        step in (1i64..=10_000i64).prop_map(|x| Decimal::new(x, 2)),
        step_quantity in (1i64..=100i64).prop_map(|x| Decimal::new(x, 2)),
        cap in (1i64..=100i64).prop_map(|x| Decimal::new(x, 2)),
        ascending in any::<bool>(),
    ) {
        let direction = if ascending { StepDirection::Ascending } else { StepDirection::Descending };
        let seq = LadderSequence::new(&SequenceParams {
            anchor_price: anchor,
            step_size: step,
            spread_multiplier: Decimal::ONE,
            direction,
            multiplier: Decimal::ONE,
            step_quantity,
            leverage: dec!(10),
            quantity_cap: cap,
            starting_quantity: Decimal::ZERO,
        }).unwrap();

        let mut total = Decimal::ZERO;
        let mut steps = 0usize;
        for item in seq {
            match item {
                Ok(s) => {
                    prop_assert!(s.price > Decimal::ZERO);
                    prop_assert!(total < cap);
                    total += s.quantity;
                    steps += 1;
                }
                Err(e) => {
                    let rejected = matches!(e, LadderError::InvalidParameter { .. });
                    prop_assert!(rejected, "unexpected error {}", e);
                    return Ok(());
                }
            }
        }
        prop_assert!(total >= cap);
        prop_assert!(total - step_quantity < cap);
        prop_assert!(steps <= 100);
    }

    /// The position plus the adding side never exceeds the configured maximum
    #[test]
    fn allocation_respects_max_quantity(
        entry in price_strategy(),
        leverage in leverage_strategy(),
        quantity in (10i64..=200i64).prop_map(|x| Decimal::new(x, 2)),
        max_quantity in (1i64..=100i64).prop_map(|x| Decimal::new(x, 1)),
        direction in direction_strategy(),
    ) {
        let snapshot = PositionSnapshot::new(entry, leverage, quantity, direction).unwrap();
        let params = AllocationParams { max_quantity, ..AllocationParams::default() };
        let ladder = allocate(&snapshot, &params).unwrap();

        let (adding, closing) = match direction {
            Direction::Long => (&ladder.buys, &ladder.sells),
            Direction::Short => (&ladder.sells, &ladder.buys),
        };
        let added: Decimal = adding.iter().map(|s| s.quantity).sum();
        if !adding.is_empty() {
            prop_assert!(quantity + added <= max_quantity);
        }
        prop_assert!(!closing.is_empty());
        prop_assert!(ladder.buys.iter().all(|s| s.price < entry));
        prop_assert!(ladder.sells.iter().all(|s| s.price > entry));
    }

    /// Re-pairing reports quantities last-to-first on unchanged prices
    #[test]
    fn reverse_pair_reverses_quantities(
        quantities in prop::collection::vec(quantity_strategy(), 0..12),
        leverage in leverage_strategy(),
    ) {
        let steps: Vec<LadderStep> = quantities
            .iter()
            .enumerate()
            .map(|(i, q)| LadderStep::new(dec!(1000) + Decimal::from(i as u64), *q, leverage).unwrap())
            .collect();

        let once = reverse_pair_quantities(steps.clone(), leverage).unwrap();
        let n = quantities.len();
        prop_assert_eq!(once.len(), n);
        for (i, (a, b)) in once.iter().zip(steps.iter()).enumerate() {
            prop_assert_eq!(a.price, b.price);
            prop_assert_eq!(a.quantity, quantities[n - 1 - i]);
            prop_assert_eq!(a.notional, a.price * a.quantity / leverage);
        }
        prop_assert_eq!(reverse_pair_quantities(once, leverage).unwrap(), steps);
    }
}
