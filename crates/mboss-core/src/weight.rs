// Symbolic weight expressions.
//
// A weight is an immutable expression tree over named parameters and
// numeric constants. Subtrees are reference counted, so transitions built
// from the same pieces share them instead of copying.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::CoreError;
use crate::params::Params;

/// Operator keys used in the JSON form of a weight.
const OP_ADD: &str = "+";
const OP_SUB: &str = "-";
const OP_MUL: &str = "*";
const OP_DIV: &str = "/";
const OP_LOG: &str = "log";
const OP_EXP: &str = "exp";
const OP_NOT: &str = "not";

/// A single node of a weight expression.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightNode {
    Const(f64),
    Param(String),
    Add(WeightExpr, WeightExpr),
    Sub(WeightExpr, WeightExpr),
    Mul(WeightExpr, WeightExpr),
    Div(WeightExpr, WeightExpr),
    Log(WeightExpr),
    Exp(WeightExpr),
    /// `1 - x`
    Not(WeightExpr),
}

/// Shared, immutable weight expression.
///
/// Cloning is cheap (one reference count increment). Equality is
/// structural. The constructors fold constants and arithmetic identities,
/// so `WeightExpr::mul(&WeightExpr::one(), &x)` is `x` itself.
#[derive(Clone, PartialEq)]
pub struct WeightExpr(Arc<WeightNode>);

impl WeightExpr {
    fn from_node(node: WeightNode) -> Self {
        Self(Arc::new(node))
    }

    pub fn constant(value: f64) -> Self {
        Self::from_node(WeightNode::Const(value))
    }

    pub fn one() -> Self {
        Self::constant(1.0)
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::from_node(WeightNode::Param(name.into()))
    }

    pub fn node(&self) -> &WeightNode {
        &self.0
    }

    /// The value of this expression if it is a constant leaf.
    pub fn as_const(&self) -> Option<f64> {
        match *self.0 {
            WeightNode::Const(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_one(&self) -> bool {
        self.as_const() == Some(1.0)
    }

    pub fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }

    pub fn add(a: &WeightExpr, b: &WeightExpr) -> Self {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Self::constant(x + y),
            (Some(x), _) if x == 0.0 => b.clone(),
            (_, Some(y)) if y == 0.0 => a.clone(),
            _ => Self::from_node(WeightNode::Add(a.clone(), b.clone())),
        }
    }

    pub fn sub(a: &WeightExpr, b: &WeightExpr) -> Self {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Self::constant(x - y),
            (_, Some(y)) if y == 0.0 => a.clone(),
            _ => Self::from_node(WeightNode::Sub(a.clone(), b.clone())),
        }
    }

    pub fn mul(a: &WeightExpr, b: &WeightExpr) -> Self {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) => Self::constant(x * y),
            (Some(x), _) | (_, Some(x)) if x == 0.0 => Self::zero(),
            (Some(x), _) if x == 1.0 => b.clone(),
            (_, Some(y)) if y == 1.0 => a.clone(),
            _ => Self::from_node(WeightNode::Mul(a.clone(), b.clone())),
        }
    }

    pub fn div(a: &WeightExpr, b: &WeightExpr) -> Self {
        match (a.as_const(), b.as_const()) {
            (Some(x), Some(y)) if y != 0.0 => Self::constant(x / y),
            (_, Some(y)) if y == 1.0 => a.clone(),
            _ => Self::from_node(WeightNode::Div(a.clone(), b.clone())),
        }
    }

    pub fn log(a: &WeightExpr) -> Self {
        match a.as_const() {
            Some(x) if x > 0.0 => Self::constant(x.ln()),
            _ => Self::from_node(WeightNode::Log(a.clone())),
        }
    }

    pub fn exp(a: &WeightExpr) -> Self {
        match a.as_const() {
            Some(x) => Self::constant(x.exp()),
            None => Self::from_node(WeightNode::Exp(a.clone())),
        }
    }

    /// `1 - a`, the complementary probability.
    pub fn complement(a: &WeightExpr) -> Self {
        match a.as_const() {
            Some(x) => Self::constant(1.0 - x),
            None => Self::from_node(WeightNode::Not(a.clone())),
        }
    }

    /// Evaluate the expression under a parameter assignment.
    ///
    /// Fails with [`CoreError::MissingParam`] if a referenced parameter is
    /// not defined in `params`.
    pub fn eval(&self, params: &Params) -> Result<f64, CoreError> {
        Ok(match self.node() {
            WeightNode::Const(c) => *c,
            WeightNode::Param(name) => params
                .get(name)
                .ok_or_else(|| CoreError::MissingParam(name.clone()))?,
            WeightNode::Add(a, b) => a.eval(params)? + b.eval(params)?,
            WeightNode::Sub(a, b) => a.eval(params)? - b.eval(params)?,
            WeightNode::Mul(a, b) => a.eval(params)? * b.eval(params)?,
            WeightNode::Div(a, b) => a.eval(params)? / b.eval(params)?,
            WeightNode::Log(a) => a.eval(params)?.ln(),
            WeightNode::Exp(a) => a.eval(params)?.exp(),
            WeightNode::Not(a) => 1.0 - a.eval(params)?,
        })
    }

    /// Names of all parameters referenced by the expression.
    pub fn params(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_params(&mut names);
        names
    }

    fn collect_params(&self, names: &mut BTreeSet<String>) {
        match self.node() {
            WeightNode::Const(_) => {}
            WeightNode::Param(name) => {
                names.insert(name.clone());
            }
            WeightNode::Add(a, b)
            | WeightNode::Sub(a, b)
            | WeightNode::Mul(a, b)
            | WeightNode::Div(a, b) => {
                a.collect_params(names);
                b.collect_params(names);
            }
            WeightNode::Log(a) | WeightNode::Exp(a) | WeightNode::Not(a) => {
                a.collect_params(names)
            }
        }
    }

    // -----------------------------------------------------------------------
    // JSON form
    // -----------------------------------------------------------------------

    /// Encode as a JSON document.
    ///
    /// Constants become numbers (non-finite constants are spelled as
    /// expressions, since JSON has no literal for them), parameters become
    /// strings and operators become single-key objects.
    pub fn to_json(&self) -> Value {
        match self.node() {
            WeightNode::Const(c) => const_to_json(*c),
            WeightNode::Param(name) => Value::String(name.clone()),
            WeightNode::Add(a, b) => binary_json(OP_ADD, a, b),
            WeightNode::Sub(a, b) => binary_json(OP_SUB, a, b),
            WeightNode::Mul(a, b) => binary_json(OP_MUL, a, b),
            WeightNode::Div(a, b) => binary_json(OP_DIV, a, b),
            WeightNode::Log(a) => unary_json(OP_LOG, a),
            WeightNode::Exp(a) => unary_json(OP_EXP, a),
            WeightNode::Not(a) => unary_json(OP_NOT, a),
        }
    }

    /// Decode from a JSON document.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Bool(b) => Ok(Self::constant(if *b { 1.0 } else { 0.0 })),
            Value::Number(n) => n
                .as_f64()
                .map(Self::constant)
                .ok_or_else(|| CoreError::MalformedWeight(format!("unrepresentable number {n}"))),
            Value::String(name) => Ok(Self::param(name.as_str())),
            Value::Object(map) => {
                let mut entries = map.iter();
                let (op, arg) = match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => {
                        return Err(CoreError::MalformedWeight(format!(
                            "operator object must have exactly one key, found {}",
                            map.len()
                        )));
                    }
                };
                match op.as_str() {
                    OP_ADD | OP_SUB | OP_MUL | OP_DIV => {
                        let (a, b) = binary_args(op, arg)?;
                        // Keep the tree exactly as written: no folding here,
                        // so that store-after-load reproduces the document.
                        let node = match op.as_str() {
                            OP_ADD => WeightNode::Add(a, b),
                            OP_SUB => WeightNode::Sub(a, b),
                            OP_MUL => WeightNode::Mul(a, b),
                            _ => WeightNode::Div(a, b),
                        };
                        Ok(Self::from_node(node))
                    }
                    OP_LOG => Ok(Self::from_node(WeightNode::Log(Self::from_json(arg)?))),
                    OP_EXP => Ok(Self::from_node(WeightNode::Exp(Self::from_json(arg)?))),
                    OP_NOT => Ok(Self::from_node(WeightNode::Not(Self::from_json(arg)?))),
                    other => Err(CoreError::MalformedWeight(format!("unknown operator {other:?}"))),
                }
            }
            Value::Null | Value::Array(_) => Err(CoreError::MalformedWeight(format!(
                "expected number, string or operator object, found {value}"
            ))),
        }
    }
}

fn const_to_json(c: f64) -> Value {
    if c.is_finite() {
        // Integral values print without a fractional part.
        if c.fract() == 0.0 && c.abs() < 9.0e15 {
            return Value::from(c as i64);
        }
        if let Some(n) = serde_json::Number::from_f64(c) {
            return Value::Number(n);
        }
    }
    if c == f64::NEG_INFINITY {
        unary_json(OP_LOG, &WeightExpr::zero())
    } else if c == f64::INFINITY {
        binary_json(OP_DIV, &WeightExpr::one(), &WeightExpr::zero())
    } else {
        binary_json(OP_DIV, &WeightExpr::zero(), &WeightExpr::zero())
    }
}

fn unary_json(op: &str, a: &WeightExpr) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(op.to_string(), a.to_json());
    Value::Object(map)
}

fn binary_json(op: &str, a: &WeightExpr, b: &WeightExpr) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(op.to_string(), Value::Array(vec![a.to_json(), b.to_json()]));
    Value::Object(map)
}

fn binary_args(op: &str, arg: &Value) -> Result<(WeightExpr, WeightExpr), CoreError> {
    match arg.as_array().map(Vec::as_slice) {
        Some([a, b]) => Ok((WeightExpr::from_json(a)?, WeightExpr::from_json(b)?)),
        _ => Err(CoreError::MalformedWeight(format!(
            "operator {op:?} takes a two-element array"
        ))),
    }
}

impl Default for WeightExpr {
    fn default() -> Self {
        Self::one()
    }
}

impl From<f64> for WeightExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<&str> for WeightExpr {
    fn from(name: &str) -> Self {
        Self::param(name)
    }
}

impl fmt::Debug for WeightExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeightExpr({self})")
    }
}

impl fmt::Display for WeightExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            WeightNode::Const(c) => write!(f, "{c}"),
            WeightNode::Param(name) => write!(f, "{name}"),
            WeightNode::Add(a, b) => write!(f, "({a} + {b})"),
            WeightNode::Sub(a, b) => write!(f, "({a} - {b})"),
            WeightNode::Mul(a, b) => write!(f, "{a} * {b}"),
            WeightNode::Div(a, b) => write!(f, "{a} / {b}"),
            WeightNode::Log(a) => write!(f, "log({a})"),
            WeightNode::Exp(a) => write!(f, "exp({a})"),
            WeightNode::Not(a) => write!(f, "(1 - {a})"),
        }
    }
}

impl Serialize for WeightExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeightExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WeightExpr::from_json(&value).map_err(serde::de::Error::custom)
    }
}
