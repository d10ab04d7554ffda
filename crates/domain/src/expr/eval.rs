//! AST-walking interpreter.

use super::ast::{BinaryOp, Expr, Program, Root, UnaryOp};
use super::error::EvalError;
use super::scope::Namespace;
use super::value::Value;
use crate::variable::DEFAULT_TOGGLE_MODULO;

impl Program {
    /// Evaluate the program, returning the value of its last expression.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] on the first failing expression. Side
    /// effects produced before the failure are kept; there is no
    /// expression-level rollback.
    pub fn eval(&self, ns: &mut Namespace<'_>) -> Result<Value, EvalError> {
        let mut last = Value::Unit;
        for expr in &self.exprs {
            last = eval_expr(expr, ns)?;
        }
        Ok(last)
    }
}

fn eval_expr(expr: &Expr, ns: &mut Namespace<'_>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Unary { op, operand } => eval_unary(*op, operand, ns),
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, ns),
        Expr::Property { root, name } => eval_property(*root, name, ns),
        Expr::Call { root, method, args } => eval_call(*root, method, args, ns),
    }
}

fn eval_unary(
    op: UnaryOp,
    operand: &Expr,
    ns: &mut Namespace<'_>,
) -> Result<Value, EvalError> {
    let value = eval_expr(operand, ns)?;
    match op {
        UnaryOp::Neg => {
            let i = int(value)?;
            i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow)
        }
        UnaryOp::Not => Ok(Value::Bool(!boolean(value)?)),
    }
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    ns: &mut Namespace<'_>,
) -> Result<Value, EvalError> {
    // `and`/`or` short-circuit; everything else evaluates both sides.
    match op {
        BinaryOp::And => {
            let l = boolean(eval_expr(lhs, ns)?)?;
            if !l {
                return Ok(Value::Bool(false));
            }
            return Ok(Value::Bool(boolean(eval_expr(rhs, ns)?)?));
        }
        BinaryOp::Or => {
            let l = boolean(eval_expr(lhs, ns)?)?;
            if l {
                return Ok(Value::Bool(true));
            }
            return Ok(Value::Bool(boolean(eval_expr(rhs, ns)?)?));
        }
        _ => {}
    }

    let l = eval_expr(lhs, ns)?;
    let r = eval_expr(rhs, ns)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r)?)),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r)?)),
        BinaryOp::Lt => Ok(Value::Bool(int(l)? < int(r)?)),
        BinaryOp::Le => Ok(Value::Bool(int(l)? <= int(r)?)),
        BinaryOp::Gt => Ok(Value::Bool(int(l)? > int(r)?)),
        BinaryOp::Ge => Ok(Value::Bool(int(l)? >= int(r)?)),
        BinaryOp::Add => checked(int(l)?.checked_add(int(r)?)),
        BinaryOp::Sub => checked(int(l)?.checked_sub(int(r)?)),
        BinaryOp::Mul => checked(int(l)?.checked_mul(int(r)?)),
        BinaryOp::Div => {
            let divisor = int(r)?;
            if divisor == 0 {
                return Err(EvalError::DivisionByZero);
            }
            checked(int(l)?.checked_div(divisor))
        }
        BinaryOp::Rem => {
            let divisor = int(r)?;
            if divisor == 0 {
                return Err(EvalError::DivisionByZero);
            }
            checked(int(l)?.checked_rem(divisor))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn eval_property(root: Root, name: &str, ns: &mut Namespace<'_>) -> Result<Value, EvalError> {
    match root {
        Root::Pin => {
            let event = ns.pin.ok_or(EvalError::OutsideTrigger { root: "pin" })?;
            match name {
                "device" => Ok(Value::Str(event.device.clone())),
                "pin" => Ok(Value::Str(event.pin.clone())),
                "value" => Ok(Value::Int(i64::from(event.level))),
                _ => Err(EvalError::UnknownProperty {
                    root: "pin",
                    name: name.to_string(),
                }),
            }
        }
        Root::Variable | Root::Device | Root::Log => Err(EvalError::UnknownProperty {
            root: root.name(),
            name: name.to_string(),
        }),
    }
}

fn eval_call(
    root: Root,
    method: &str,
    args: &[Expr],
    ns: &mut Namespace<'_>,
) -> Result<Value, EvalError> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval_expr(arg, ns)?);
    }

    match root {
        Root::Variable => match method {
            "get" => {
                let [Value::Str(name)] = require_args::<1>("variable.get", "1", &values)? else {
                    return Err(string_expected(&values[0]));
                };
                ns.variables.get(name).map(Value::Int)
            }
            "set" => {
                let [name, value] = require_args::<2>("variable.set", "2", &values)?;
                let Value::Str(name) = name else {
                    return Err(string_expected(name));
                };
                let Value::Int(value) = value else {
                    return Err(int_expected(value));
                };
                ns.variables.set(name, *value).map(Value::Int)
            }
            "toggle" => {
                let (name, modulo) = match &values[..] {
                    [Value::Str(name)] => (name, DEFAULT_TOGGLE_MODULO),
                    [Value::Str(name), Value::Int(modulo)] => (name, *modulo),
                    [first, ..] if !matches!(first, Value::Str(_)) => {
                        return Err(string_expected(first));
                    }
                    [_, second] => return Err(int_expected(second)),
                    _ => {
                        return Err(EvalError::Arity {
                            method: "variable.toggle",
                            expected: "1 or 2",
                            found: values.len(),
                        });
                    }
                };
                ns.variables.toggle(name, modulo).map(Value::Int)
            }
            _ => Err(EvalError::UnknownMethod {
                root: "variable",
                method: method.to_string(),
            }),
        },
        Root::Device => match method {
            "is_alive" => {
                let [Value::Str(name)] = require_args::<1>("device.is_alive", "1", &values)?
                else {
                    return Err(string_expected(&values[0]));
                };
                ns.devices.is_alive(name).map(Value::Bool)
            }
            "count_alive" => {
                require_args::<0>("device.count_alive", "0", &values)?;
                Ok(Value::Int(ns.devices.count_alive()))
            }
            "count_dead" => {
                require_args::<0>("device.count_dead", "0", &values)?;
                Ok(Value::Int(ns.devices.count_dead()))
            }
            _ => Err(EvalError::UnknownMethod {
                root: "device",
                method: method.to_string(),
            }),
        },
        Root::Log => match method {
            "log" => {
                let [Value::Str(message)] = require_args::<1>("log.log", "1", &values)? else {
                    return Err(string_expected(&values[0]));
                };
                match ns.log.as_mut() {
                    Some(log) => {
                        log.log(message);
                        Ok(Value::Unit)
                    }
                    None => Err(EvalError::OutsideTrigger { root: "log" }),
                }
            }
            _ => Err(EvalError::UnknownMethod {
                root: "log",
                method: method.to_string(),
            }),
        },
        Root::Pin => Err(EvalError::UnknownMethod {
            root: "pin",
            method: method.to_string(),
        }),
    }
}

fn require_args<'v, const N: usize>(
    method: &'static str,
    expected: &'static str,
    values: &'v [Value],
) -> Result<&'v [Value; N], EvalError> {
    values
        .try_into()
        .map_err(|_| EvalError::Arity {
            method,
            expected,
            found: values.len(),
        })
}

fn int(value: Value) -> Result<i64, EvalError> {
    match value {
        Value::Int(i) => Ok(i),
        other => Err(int_expected(&other)),
    }
}

fn boolean(value: Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::Type {
            expected: "bool",
            found: other.type_name(),
        }),
    }
}

fn values_equal(l: &Value, r: &Value) -> Result<bool, EvalError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Unit, Value::Unit) => Ok(true),
        _ => Err(EvalError::Type {
            expected: l.type_name(),
            found: r.type_name(),
        }),
    }
}

fn checked(result: Option<i64>) -> Result<Value, EvalError> {
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn int_expected(value: &Value) -> EvalError {
    EvalError::Type {
        expected: "int",
        found: value.type_name(),
    }
}

fn string_expected(value: &Value) -> EvalError {
    EvalError::Type {
        expected: "string",
        found: value.type_name(),
    }
}
