//! Numeric operations for the Neo Virtual Machine.

use crate::error::{VmError, VmResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Instruction;
use crate::jump_table::JumpTable;
use crate::op_code::OpCode;
use crate::stack_item::StackItem;
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Registers the numeric operation handlers.
pub fn register_handlers(jump_table: &mut JumpTable) {
    jump_table.register(OpCode::SIGN, sign);
    jump_table.register(OpCode::ABS, abs);
    jump_table.register(OpCode::NEGATE, negate);
    jump_table.register(OpCode::INC, inc);
    jump_table.register(OpCode::DEC, dec);
    jump_table.register(OpCode::ADD, add);
    jump_table.register(OpCode::SUB, sub);
    jump_table.register(OpCode::MUL, mul);
    jump_table.register(OpCode::DIV, div);
    jump_table.register(OpCode::MOD, modulo);
    jump_table.register(OpCode::POW, pow);
    jump_table.register(OpCode::SQRT, sqrt);
    jump_table.register(OpCode::MODMUL, modmul);
    jump_table.register(OpCode::MODPOW, modpow);
    jump_table.register(OpCode::SHL, shl);
    jump_table.register(OpCode::SHR, shr);

    // Logical operations
    jump_table.register(OpCode::NOT, not);
    jump_table.register(OpCode::BOOLAND, booland);
    jump_table.register(OpCode::BOOLOR, boolor);
    jump_table.register(OpCode::NZ, nz);

    // Comparison operations
    jump_table.register(OpCode::NUMEQUAL, numequal);
    jump_table.register(OpCode::NUMNOTEQUAL, numnotequal);
    jump_table.register(OpCode::LT, compare);
    jump_table.register(OpCode::LE, compare);
    jump_table.register(OpCode::GT, compare);
    jump_table.register(OpCode::GE, compare);
    jump_table.register(OpCode::MIN, min);
    jump_table.register(OpCode::MAX, max);
    jump_table.register(OpCode::WITHIN, within);
}

fn pop_pair(engine: &mut ExecutionEngine) -> VmResult<(BigInt, BigInt)> {
    let x2 = engine.pop_integer()?;
    let x1 = engine.pop_integer()?;
    Ok((x1, x2))
}

fn sign(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    let sign = match x.sign() {
        Sign::Minus => -1,
        Sign::NoSign => 0,
        Sign::Plus => 1,
    };
    engine.push(StackItem::from_int(sign))
}

fn abs(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push_integer(x.abs())
}

fn negate(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push_integer(-x)
}

fn inc(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push_integer(x + 1)
}

fn dec(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push_integer(x - 1)
}

fn add(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push_integer(x1 + x2)
}

fn sub(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push_integer(x1 - x2)
}

fn mul(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push_integer(x1 * x2)
}

fn div(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    if x2.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    // Truncates toward zero.
    engine.push_integer(x1 / x2)
}

fn modulo(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    if x2.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    // The remainder takes the sign of the dividend.
    engine.push_integer(x1 % x2)
}

fn pow(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let exponent = engine.pop_i64()?;
    engine.limits().assert_shift(exponent)?;
    let value = engine.pop_integer()?;
    engine.push_integer(value.pow(exponent as u32))
}

fn sqrt(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    if x.is_negative() {
        return Err(VmError::invalid_operation("value can not be negative"));
    }
    engine.push_integer(x.sqrt())
}

fn modmul(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let modulus = engine.pop_integer()?;
    let (x1, x2) = pop_pair(engine)?;
    if modulus.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    engine.push_integer((x1 * x2) % modulus)
}

fn modpow(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let modulus = engine.pop_integer()?;
    let exponent = engine.pop_integer()?;
    let value = engine.pop_integer()?;
    let result = if exponent == -BigInt::one() {
        mod_inverse(&value, &modulus)?
    } else {
        signed_mod_pow(&value, &exponent, &modulus)?
    };
    engine.push_integer(result)
}

/// `value^exponent mod modulus` where the result carries the sign of the
/// dividend, like a truncating remainder.
fn signed_mod_pow(value: &BigInt, exponent: &BigInt, modulus: &BigInt) -> VmResult<BigInt> {
    if exponent.is_negative() {
        return Err(VmError::out_of_range("MODPOW exponent must not be negative"));
    }
    if modulus.is_zero() {
        return Err(VmError::DivisionByZero);
    }
    let magnitude = value.magnitude().modpow(exponent.magnitude(), modulus.magnitude());
    let negative = value.is_negative() && exponent.is_odd();
    let result = BigInt::from_biguint(Sign::Plus, magnitude);
    Ok(if negative { -result } else { result })
}

/// Modular multiplicative inverse for a positive value and a modulus of at
/// least 2.
fn mod_inverse(value: &BigInt, modulus: &BigInt) -> VmResult<BigInt> {
    if !value.is_positive() {
        return Err(VmError::out_of_range("MODPOW inverse needs a positive value"));
    }
    if *modulus < BigInt::from(2) {
        return Err(VmError::out_of_range("MODPOW inverse needs a modulus of at least 2"));
    }
    let (mut r, mut old_r) = (value.clone(), modulus.clone());
    let (mut s, mut old_s) = (BigInt::one(), BigInt::zero());
    while r.is_positive() {
        let q = &old_r / &r;
        let next_r = &old_r % &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }
    let mut result = old_s % modulus;
    if result.is_negative() {
        result += modulus;
    }
    if !((value * &result) % modulus).is_one() {
        return Err(VmError::invalid_operation("no modular inverse exists"));
    }
    Ok(result)
}

fn shl(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let shift = engine.pop_i64()?;
    engine.limits().assert_shift(shift)?;
    if shift == 0 {
        return Ok(());
    }
    let x = engine.pop_integer()?;
    engine.push_integer(x << shift as usize)
}

fn shr(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let shift = engine.pop_i64()?;
    engine.limits().assert_shift(shift)?;
    if shift == 0 {
        return Ok(());
    }
    let x = engine.pop_integer()?;
    // Arithmetic shift, rounding toward negative infinity.
    engine.push_integer(x >> shift as usize)
}

fn not(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_boolean()?;
    engine.push(StackItem::Boolean(!x))
}

fn booland(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_boolean()?;
    let x1 = engine.pop_boolean()?;
    engine.push(StackItem::Boolean(x1 && x2))
}

fn boolor(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop_boolean()?;
    let x1 = engine.pop_boolean()?;
    engine.push(StackItem::Boolean(x1 || x2))
}

fn nz(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let x = engine.pop_integer()?;
    engine.push(StackItem::Boolean(!x.is_zero()))
}

fn numequal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push(StackItem::Boolean(x1 == x2))
}

fn numnotequal(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push(StackItem::Boolean(x1 != x2))
}

/// LT, LE, GT and GE. A Null operand yields `false`.
fn compare(engine: &mut ExecutionEngine, instruction: &Instruction) -> VmResult<()> {
    let x2 = engine.pop()?;
    let x1 = engine.pop()?;
    if x1.is_null() || x2.is_null() {
        return engine.push(StackItem::Boolean(false));
    }
    let (x1, x2) = (x1.get_integer()?, x2.get_integer()?);
    let result = match instruction.opcode() {
        OpCode::LT => x1 < x2,
        OpCode::LE => x1 <= x2,
        OpCode::GT => x1 > x2,
        _ => x1 >= x2,
    };
    engine.push(StackItem::Boolean(result))
}

fn min(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push_integer(x1.min(x2))
}

fn max(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let (x1, x2) = pop_pair(engine)?;
    engine.push_integer(x1.max(x2))
}

fn within(engine: &mut ExecutionEngine, _instruction: &Instruction) -> VmResult<()> {
    let b = engine.pop_integer()?;
    let a = engine.pop_integer()?;
    let x = engine.pop_integer()?;
    engine.push(StackItem::Boolean(a <= x && x < b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(value: i64) -> BigInt {
        BigInt::from(value)
    }

    #[test]
    fn mod_pow_keeps_dividend_sign() {
        assert_eq!(signed_mod_pow(&big(-3), &big(3), &big(5)).unwrap(), big(-2));
        assert_eq!(signed_mod_pow(&big(-3), &big(2), &big(5)).unwrap(), big(4));
        assert_eq!(signed_mod_pow(&big(19), &big(2), &big(-141)).unwrap(), big(79));
        assert!(signed_mod_pow(&big(2), &big(3), &big(0)).is_err());
    }

    #[test]
    fn mod_inverse_values() {
        assert_eq!(mod_inverse(&big(19), &big(141)).unwrap(), big(52));
        assert!(mod_inverse(&big(2), &big(4)).is_err());
        assert!(mod_inverse(&big(0), &big(7)).is_err());
    }
}
