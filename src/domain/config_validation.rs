//! Configuration validation.
//!
//! Checks every `[backtest]` and `[signals]` key before a run. Missing keys
//! fall back to their defaults and are not errors; present keys must parse
//! and lie in range.

use crate::domain::error::SigtraderError;
use crate::domain::signal::detectors::DetectorKind;
use crate::domain::signal::MaKind;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_symbol(config)?;
    validate_initial_capital(config)?;
    validate_rate(config, "commission")?;
    validate_rate(config, "slippage")?;
    validate_position_size(config)?;
    validate_risk_per_trade(config)?;
    for key in [
        "stop_atr_multiple",
        "target_atr_multiple",
        "stop_loss_pct",
        "take_profit_pct",
        "trailing_atr_multiple",
    ] {
        validate_positive(config, "backtest", key)?;
    }
    validate_max_holding_bars(config)?;
    validate_atr_period(config)?;
    validate_flag(config, "backtest", "apply_risk_adjustment")?;
    Ok(())
}

pub fn validate_signal_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_weights(config)?;
    validate_ma_type(config)?;
    validate_thresholds(config)?;
    validate_dampening(config, "sideways_dampening")?;
    validate_dampening(config, "volatility_dampening")?;
    validate_positive(config, "signals", "high_volatility_ratio")?;
    Ok(())
}

/// Parse `key` as a number; `None` when absent.
pub(crate) fn number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, SigtraderError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| SigtraderError::invalid(section, key, format!("'{}' is not a number", raw))),
        _ => Ok(None),
    }
}

/// Parse `key` as a whole count; `None` when absent.
pub(crate) fn count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<usize>, SigtraderError> {
    match config.get_string(section, key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| SigtraderError::invalid(section, key, format!("'{}' is not a whole number", raw))),
        _ => Ok(None),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match config.get_string("backtest", "symbol") {
        Some(s) if s.trim().is_empty() => Err(SigtraderError::invalid(
            "backtest",
            "symbol",
            "symbol must not be blank",
        )),
        _ => Ok(()),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, "backtest", "initial_capital")? {
        if value <= 0.0 {
            return Err(SigtraderError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be positive",
            ));
        }
    }
    Ok(())
}

fn validate_rate(config: &dyn ConfigPort, key: &str) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, "backtest", key)? {
        if !(0.0..1.0).contains(&value) {
            return Err(SigtraderError::invalid(
                "backtest",
                key,
                format!("{} must be in [0, 1)", key),
            ));
        }
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, "backtest", "position_size_pct")? {
        if value <= 0.0 || value > 1.0 {
            return Err(SigtraderError::invalid(
                "backtest",
                "position_size_pct",
                "position_size_pct must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_risk_per_trade(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, "backtest", "risk_per_trade")? {
        if value <= 0.0 || value > 1.0 {
            return Err(SigtraderError::invalid(
                "backtest",
                "risk_per_trade",
                "risk_per_trade must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, section, key)? {
        if value <= 0.0 {
            return Err(SigtraderError::invalid(
                section,
                key,
                format!("{} must be positive", key),
            ));
        }
    }
    Ok(())
}

fn validate_max_holding_bars(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if count(config, "backtest", "max_holding_bars")? == Some(0) {
        return Err(SigtraderError::invalid(
            "backtest",
            "max_holding_bars",
            "max_holding_bars must be at least 1",
        ));
    }
    Ok(())
}

fn validate_atr_period(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if count(config, "backtest", "atr_period")? == Some(0) {
        return Err(SigtraderError::invalid(
            "backtest",
            "atr_period",
            "atr_period must be at least 1",
        ));
    }
    Ok(())
}

fn validate_flag(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), SigtraderError> {
    match config.get_string(section, key) {
        Some(raw)
            if !matches!(
                raw.trim().to_lowercase().as_str(),
                "true" | "yes" | "1" | "false" | "no" | "0"
            ) =>
        {
            Err(SigtraderError::invalid(
                section,
                key,
                format!("'{}' is not a boolean", raw),
            ))
        }
        _ => Ok(()),
    }
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let defaults = crate::domain::signal::SignalWeights::default();
    let mut total = 0.0;
    for kind in DetectorKind::ALL {
        let weight = number(config, "signals", kind.name())?.unwrap_or(defaults.weight(kind));
        if weight < 0.0 {
            return Err(SigtraderError::invalid(
                "signals",
                kind.name(),
                "weights must be non-negative",
            ));
        }
        total += weight;
    }
    if total <= 0.0 {
        return Err(SigtraderError::invalid(
            "signals",
            "weights",
            "at least one detector weight must be positive",
        ));
    }
    Ok(())
}

fn validate_ma_type(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if let Some(raw) = config.get_string("signals", "ma_type") {
        raw.parse::<MaKind>()
            .map_err(|reason| SigtraderError::invalid("signals", "ma_type", reason))?;
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let buy = number(config, "signals", "buy_threshold")?.unwrap_or(0.3);
    let strong = number(config, "signals", "strong_buy_threshold")?.unwrap_or(0.6);
    if buy <= 0.0 {
        return Err(SigtraderError::invalid(
            "signals",
            "buy_threshold",
            "buy_threshold must be positive",
        ));
    }
    if strong <= buy {
        return Err(SigtraderError::invalid(
            "signals",
            "strong_buy_threshold",
            "strong_buy_threshold must exceed buy_threshold",
        ));
    }
    Ok(())
}

fn validate_dampening(config: &dyn ConfigPort, key: &str) -> Result<(), SigtraderError> {
    if let Some(value) = number(config, "signals", key)? {
        if value <= 0.0 || value > 1.0 {
            return Err(SigtraderError::invalid(
                "signals",
                key,
                format!("{} must be in (0, 1]", key),
            ));
        }
    }
    Ok(())
}
