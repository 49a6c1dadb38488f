//! Arithmetic delegates and host resolvers installed on an engine.

use std::any::Any;
use std::sync::atomic::{AtomicI64, Ordering};

use ember::{
    Engine, HostValue, MapContext, OperatorTable, Overload, OverloadResult, Resolution, Resolver,
    Value,
};
use ember_ir::ast::BinaryOp;
use pretty_assertions::assert_eq;

/// Host gauge mutated in place.
#[derive(Debug, Default)]
struct Gauge(AtomicI64);

impl HostValue for Gauge {
    fn type_name(&self) -> &str {
        "Gauge"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn gauge(value: &Value) -> Option<&Gauge> {
    value.as_host()?.as_any().downcast_ref::<Gauge>()
}

fn level(value: &Value) -> i64 {
    gauge(value).unwrap().0.load(Ordering::SeqCst)
}

fn adjust(value: &Value, by: i64) -> OverloadResult {
    let Some(g) = gauge(value) else {
        return Ok(Overload::Unhandled);
    };
    g.0.fetch_add(by, Ordering::SeqCst);
    Ok(Overload::Assigned)
}

fn gauge_engine() -> Engine {
    let table = OperatorTable::new()
        .on_increment("Gauge", |v: &Value| -> OverloadResult { adjust(v, 1) })
        .on_decrement("Gauge", |v: &Value| -> OverloadResult { adjust(v, -1) })
        .on_self_assign(BinaryOp::Sub, "Gauge", |v: &Value, by: &Value| -> OverloadResult {
            adjust(v, -by.as_int().unwrap_or(0))
        });
    Engine::builder().arithmetic(table).build()
}

#[test]
fn increment_returns_mutated_operand() {
    let engine = gauge_engine();
    let g = Value::host(Gauge::default());
    let mut ctx = MapContext::new().with("g", g.clone());
    let result = engine.evaluate("++g", &mut ctx).unwrap();
    assert_eq!(result.address(), g.address());
    assert_eq!(level(&result), 1);
}

#[test]
fn self_assign_mutates_in_place() {
    let engine = gauge_engine();
    let g = Value::host(Gauge::default());
    let mut ctx = MapContext::new().with("g", g.clone());
    let result = engine.evaluate("++g; ++g; g -= 5; --g; g", &mut ctx).unwrap();
    assert_eq!(result.address(), g.address());
    assert_eq!(level(&g), -4);
}

#[test]
fn unhandled_types_use_builtin_arithmetic() {
    let engine = gauge_engine();
    assert_eq!(
        engine.evaluate("var n = 1; ++n; n -= 3; n", &mut MapContext::new()).unwrap(),
        Value::Int(-1)
    );
}

#[derive(Debug)]
struct Temperature {
    celsius: i64,
}

impl HostValue for Temperature {
    fn type_name(&self) -> &str {
        "Temperature"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct WeatherResolver;

impl WeatherResolver {
    fn temperature(value: &Value) -> Option<&Temperature> {
        value.as_host()?.as_any().downcast_ref::<Temperature>()
    }
}

impl Resolver for WeatherResolver {
    fn get_property(&self, target: &Value, key: &Value) -> Resolution {
        let t = Self::temperature(target)?;
        match key.as_str()? {
            "celsius" => Some(Ok(Value::Int(t.celsius))),
            "fahrenheit" => Some(Ok(Value::Int(t.celsius * 9 / 5 + 32))),
            _ => None,
        }
    }

    fn invoke(&self, target: &Value, method: &str, args: &[Value]) -> Resolution {
        let t = Self::temperature(target)?;
        match method {
            "above" => {
                let limit = args.first().and_then(Value::as_int).unwrap_or(0);
                Some(Ok(Value::Bool(t.celsius > limit)))
            }
            _ => None,
        }
    }

    fn construct(&self, type_name: &str, args: &[Value]) -> Resolution {
        (type_name == "Temperature").then(|| {
            let celsius = args.first().and_then(Value::as_int).unwrap_or(0);
            Ok(Value::host(Temperature { celsius }))
        })
    }
}

#[test]
fn resolver_serves_properties_methods_and_constructors() {
    let engine = Engine::builder().resolver(WeatherResolver).build();
    let source = "var t = new('Temperature', 100); t.above(50) ? t.fahrenheit : t.celsius";
    let result = engine.evaluate(source, &mut MapContext::new()).unwrap();
    assert_eq!(result, Value::Int(212));
}

#[test]
fn declined_lookups_follow_strictness() {
    let lenient = Engine::builder().resolver(WeatherResolver).build();
    let mut ctx = MapContext::new().with("t", Value::host(Temperature { celsius: 1 }));
    assert_eq!(lenient.evaluate("t.kelvin", &mut ctx).unwrap(), Value::Null);

    let strict = Engine::builder().resolver(WeatherResolver).strict(true).build();
    let err = strict.evaluate("t.kelvin", &mut ctx).unwrap_err();
    assert_eq!(err.category(), "runtime");

    let err = strict.evaluate("new('Unknown')", &mut ctx).unwrap_err();
    assert_eq!(err.category(), "runtime");
}
