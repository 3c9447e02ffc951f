//! Ladder simulation.
//!
//! Walks through the planning scenarios the core supports: risk figures for a
//! position, compounding allocation for both directions, re-anchoring on a
//! market move, margin top-ups, the range grid and its reduce fallback, and the
//! half/full take-profit plan.

use perps_ladder::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("Position Ladder Simulation");
    println!("Isolated margin, compounding take-profit, capped exposure\n");

    let scenarios: [(&str, fn() -> LadderResult<()>); 7] = [
        ("risk figures", scenario_1_risk_figures),
        ("long allocation", scenario_2_long_allocation),
        ("short allocation", scenario_3_short_allocation),
        ("market re-anchor", scenario_4_market_re_anchor),
        ("margin top-up", scenario_5_margin_top_up),
        ("range grid", scenario_6_range_grid),
        ("take-profit plan", scenario_7_take_profit_plan),
    ];

    for (name, scenario) in scenarios {
        if let Err(e) = scenario() {
            error!(scenario = name, error = %e, "scenario failed");
        }
    }

    info!("all simulations completed");
}

fn print_ladder(ladder: &Ladder) {
    for step in ladder.sells.iter().rev() {
        println!("    SELL {:>10.4} @ {:>12.2}", step.quantity, step.price);
    }
    println!("    ----");
    for step in &ladder.buys {
        println!("    BUY  {:>10.4} @ {:>12.2}", step.quantity, step.price);
    }
    println!(
        "    total buys {:.4}, total sells {:.4}\n",
        ladder.total_buy_quantity(),
        ladder.total_sell_quantity()
    );
}

/// Liquidation price and the balance needed to move it.
fn scenario_1_risk_figures() -> LadderResult<()> {
    println!("Scenario 1: Risk Figures\n");

    let table = MarginTable::default();
    let position = PositionSnapshot::new(dec!(30000), Decimal::ONE, dec!(1), Direction::Long)?;

    let bracket = table.lookup(signed_notional(&position)?.abs())?;
    println!("  1 BTC long @ $30,000, maintenance rate {}", bracket.rate);

    for balance in [dec!(1000), dec!(3000), dec!(6000)] {
        let liq = liquidation_price(balance, &position, Decimal::ZERO, &table)?;
        println!("  balance ${balance}: liquidation @ ${:.2}", liq);
    }

    let target = dec!(25000);
    let needed = wallet_balance_required(target, &position, Decimal::ZERO, &table)?;
    println!("  to liquidate no earlier than ${target}: balance ${:.2}\n", needed);
    Ok(())
}

/// Take-profit sells above, slow-market buys below, capped at 5.
fn scenario_2_long_allocation() -> LadderResult<()> {
    println!("Scenario 2: Long Allocation\n");

    let position = PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Long)?;
    let ladder = allocate(&position, &AllocationParams::default())?;
    println!("  1 BTC long @ $30,000, 10x, 4% exit over 4 intervals, max 5");
    print_ladder(&ladder);
    Ok(())
}

fn scenario_3_short_allocation() -> LadderResult<()> {
    println!("Scenario 3: Short Allocation\n");

    let position = PositionSnapshot::new(dec!(30000), dec!(20), dec!(2), Direction::Short)?;
    let params = AllocationParams {
        exit_percent: dec!(0.1),
        max_quantity: dec!(3),
        ..AllocationParams::default()
    };
    let ladder = allocate(&position, &params)?;
    println!("  2 BTC short @ $30,000, 20x, 10% exit, max 3");
    print_ladder(&ladder);
    Ok(())
}

/// Market trades below entry: the planner anchors at the market.
fn scenario_4_market_re_anchor() -> LadderResult<()> {
    println!("Scenario 4: Market Re-anchor\n");

    let planner = LadderPlanner::new(StrategyConfig::default()).map_err(|e| LadderError::invalid("config", e.to_string()))?;
    let position = PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Long)?;
    let market = MarketContext {
        current_price: Some(dec!(29800)),
        isolated_margin: dec!(3000),
        unrealized_pnl: dec!(-200),
    };

    let plan = planner.plan(&position, &market)?;
    println!("  entry $30,000, market $29,800: anchored @ ${}", plan.anchor_price);
    print_ladder(&plan.ladder);
    Ok(())
}

fn scenario_5_margin_top_up() -> LadderResult<()> {
    println!("Scenario 5: Margin Top-up\n");

    let planner = LadderPlanner::new(StrategyConfig::default()).map_err(|e| LadderError::invalid("config", e.to_string()))?;
    let position = PositionSnapshot::new(dec!(30000), dec!(10), dec!(1), Direction::Long)?;

    for isolated in [dec!(200), dec!(600), dec!(1500)] {
        let market = MarketContext {
            current_price: None,
            isolated_margin: isolated,
            unrealized_pnl: Decimal::ZERO,
        };
        let plan = planner.plan(&position, &market)?;
        match plan.margin_top_up {
            Some(top_up) => println!("  isolated ${isolated}: add ${:.2}", top_up),
            None => println!("  isolated ${isolated}: covered"),
        }
    }
    println!();
    Ok(())
}

/// Grid from entry; once the position is full it becomes a reduce ladder.
fn scenario_6_range_grid() -> LadderResult<()> {
    println!("Scenario 6: Range Grid\n");

    let params = GridParams::default();
    for held in [Decimal::ZERO, dec!(4), dec!(6)] {
        let position = PositionSnapshot::new(dec!(9000), dec!(125), held, Direction::Long)?;
        let ladder = build_grid(&position, Some(dec!(9100)), &params)?;
        println!("  holding {held} of {} @ $9,000, market $9,100", params.maximum_quantity);
        print_ladder(&ladder);
    }
    Ok(())
}

/// Half and full targets around a fresh entry, then a single interval take-profit.
fn scenario_7_take_profit_plan() -> LadderResult<()> {
    println!("Scenario 7: Take-profit Plan\n");

    let planner = LadderPlanner::new(StrategyConfig::btc()).map_err(|e| LadderError::invalid("config", e.to_string()))?;
    let flat = PositionSnapshot::new(dec!(9000), dec!(125), Decimal::ZERO, Direction::Long)?;
    println!("  fresh long entry @ $9,000, 125x");
    print_ladder(&planner.plan_take_profit(&flat)?);

    let held = flat.with_quantity(dec!(0.5))?;
    if let Some(ladder) = planner.plan_interval_take_profit(&held, dec!(9090), dec!(2))? {
        println!("  banking $2 @ $9,090 on 0.5 held");
        print_ladder(&ladder);
    }
    if let Some(ladder) = planner.plan_increase(&held, dec!(8910), dec!(2))? {
        println!("  adding from $2 of profit @ $8,910");
        print_ladder(&ladder);
    }
    Ok(())
}
