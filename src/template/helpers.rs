use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::decimal::Money;
use crate::records::parse_date;
use crate::template::format::{format_currency, format_date, format_number};

/// helper implementation: evaluated arguments in, value out
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// explicitly constructed table of template helpers
#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, HelperFn>,
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.helpers.keys().collect();
        names.sort();
        f.debug_struct("HelperRegistry").field("helpers", &names).finish()
    }
}

impl HelperRegistry {
    /// registry without any helpers
    pub fn empty() -> Self {
        Self::default()
    }

    /// formatCurrency, formatDate, formatNumber, eq, gt, lt, add
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("formatCurrency", helper_format_currency);
        registry.register("formatDate", helper_format_date);
        registry.register("formatNumber", helper_format_number);
        registry.register("eq", helper_eq);
        registry.register("gt", helper_gt);
        registry.register("lt", helper_lt);
        registry.register("add", helper_add);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&HelperFn> {
        self.helpers.get(name)
    }
}

/// numeric view of a context value; amounts may arrive as json strings
pub(crate) fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Money::parse_lenient(s).map(|m| m.as_decimal()),
        _ => None,
    }
}

fn from_decimal(value: Decimal) -> Value {
    if value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Value::Number(Number::from(i));
        }
    }
    value
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

static NULL: Value = Value::Null;

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

fn expect_args(name: &str, args: &[Value], min: usize) -> Result<(), String> {
    if args.len() < min {
        return Err(format!("{} expects {} argument(s), got {}", name, min, args.len()));
    }
    Ok(())
}

fn helper_format_currency(args: &[Value]) -> Result<Value, String> {
    expect_args("formatCurrency", args, 1)?;
    Ok(Value::String(
        to_decimal(arg(args, 0)).map(format_currency).unwrap_or_default(),
    ))
}

fn helper_format_number(args: &[Value]) -> Result<Value, String> {
    expect_args("formatNumber", args, 1)?;
    let decimals = match arg(args, 1) {
        Value::Null => 2,
        other => to_decimal(other)
            .and_then(|d| d.to_u32())
            .filter(|d| *d <= 10)
            .ok_or_else(|| format!("invalid decimal places: {}", other))?,
    };
    Ok(Value::String(
        to_decimal(arg(args, 0))
            .map(|d| format_number(d, decimals))
            .unwrap_or_default(),
    ))
}

fn helper_format_date(args: &[Value]) -> Result<Value, String> {
    expect_args("formatDate", args, 1)?;
    Ok(Value::String(match arg(args, 0) {
        Value::String(s) => parse_date(s).map(format_date).unwrap_or_else(|| s.clone()),
        _ => String::new(),
    }))
}

/// numeric equality when both sides are numbers, value equality otherwise
fn values_equal(a: &Value, b: &Value) -> bool {
    let numeric = matches!(a, Value::Number(_)) || matches!(b, Value::Number(_));
    if numeric {
        if let (Some(x), Some(y)) = (to_decimal(a), to_decimal(b)) {
            return x == y;
        }
    }
    a == b
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(x), Some(y)) = (to_decimal(a), to_decimal(b)) {
        return Some(x.cmp(&y));
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn helper_eq(args: &[Value]) -> Result<Value, String> {
    expect_args("eq", args, 2)?;
    Ok(Value::Bool(values_equal(arg(args, 0), arg(args, 1))))
}

fn helper_gt(args: &[Value]) -> Result<Value, String> {
    expect_args("gt", args, 2)?;
    Ok(Value::Bool(compare(arg(args, 0), arg(args, 1)) == Some(std::cmp::Ordering::Greater)))
}

fn helper_lt(args: &[Value]) -> Result<Value, String> {
    expect_args("lt", args, 2)?;
    Ok(Value::Bool(compare(arg(args, 0), arg(args, 1)) == Some(std::cmp::Ordering::Less)))
}

fn helper_add(args: &[Value]) -> Result<Value, String> {
    expect_args("add", args, 2)?;
    let sum = args.iter().try_fold(Decimal::ZERO, |acc, v| {
        let value = to_decimal(v).ok_or_else(|| "add expects numeric arguments".to_string())?;
        acc.checked_add(value).ok_or_else(|| "add overflowed".to_string())
    })?;
    Ok(from_decimal(sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let registry = HelperRegistry::standard();
        let helper = registry.get(name).unwrap();
        helper(args)
    }

    #[test]
    fn test_standard_table() {
        let registry = HelperRegistry::standard();
        for name in ["formatCurrency", "formatDate", "formatNumber", "eq", "gt", "lt", "add"] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert!(!registry.contains("uppercase"));
        assert!(!HelperRegistry::empty().contains("eq"));
    }

    #[test]
    fn test_format_currency_helper() {
        assert_eq!(call("formatCurrency", &[json!(1018.830136986)]).unwrap(), json!("1.018,83 €"));
        assert_eq!(call("formatCurrency", &[json!("1234.5")]).unwrap(), json!("1.234,50 €"));
        assert_eq!(call("formatCurrency", &[json!(null)]).unwrap(), json!(""));
        assert!(call("formatCurrency", &[]).is_err());
    }

    #[test]
    fn test_format_number_helper() {
        assert_eq!(call("formatNumber", &[json!(12.62)]).unwrap(), json!("12,62"));
        assert_eq!(call("formatNumber", &[json!(12.62), json!(1)]).unwrap(), json!("12,6"));
        assert_eq!(call("formatNumber", &[json!(1234), json!(0)]).unwrap(), json!("1.234"));
        assert!(call("formatNumber", &[json!(1), json!("many")]).is_err());
    }

    #[test]
    fn test_format_date_helper() {
        assert_eq!(call("formatDate", &[json!("2024-07-14")]).unwrap(), json!("14.07.2024"));
        assert_eq!(call("formatDate", &[json!("2024-07-14T08:00:00Z")]).unwrap(), json!("14.07.2024"));
        assert_eq!(call("formatDate", &[json!("bald")]).unwrap(), json!("bald"));
        assert_eq!(call("formatDate", &[json!(null)]).unwrap(), json!(""));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(call("eq", &[json!("dunning1"), json!("dunning1")]).unwrap(), json!(true));
        assert_eq!(call("eq", &[json!("dunning1"), json!("dunning2")]).unwrap(), json!(false));
        assert_eq!(call("eq", &[json!(5), json!(5.0)]).unwrap(), json!(true));
        assert_eq!(call("eq", &[json!(5), json!("5")]).unwrap(), json!(true));
        assert_eq!(call("eq", &[json!("5"), json!("5.0")]).unwrap(), json!(false));
        assert_eq!(call("gt", &[json!(10.5), json!(0)]).unwrap(), json!(true));
        assert_eq!(call("gt", &[json!(0), json!(0)]).unwrap(), json!(false));
        assert_eq!(call("lt", &[json!(3), json!(30)]).unwrap(), json!(true));
        assert_eq!(call("lt", &[json!(null), json!(30)]).unwrap(), json!(false));
    }

    #[test]
    fn test_add() {
        assert_eq!(call("add", &[json!(0), json!(1)]).unwrap(), json!(1));
        assert_eq!(call("add", &[json!(1.5), json!(2.25)]).unwrap(), json!(3.75));
        assert!(call("add", &[json!("x"), json!(1)]).is_err());
        assert_eq!(
            call("add", &[json!(5e28), json!(5e28)]),
            Err("add overflowed".to_string())
        );
    }

    #[test]
    fn test_custom_helper() {
        let mut registry = HelperRegistry::empty();
        registry.register("upper", |args: &[Value]| {
            Ok(Value::String(args.first().and_then(Value::as_str).unwrap_or("").to_uppercase()))
        });
        let helper = registry.get("upper").unwrap();
        assert_eq!(helper(&[json!("mahnung")]).unwrap(), json!("MAHNUNG"));
    }
}
